//! Append-only audit log, one row per mutating operation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board;
use crate::error::Result;
use crate::store::{ts_from_sql, ts_to_sql, Store};
use crate::types::Pagination;
use crate::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    BoardCreated,
    BoardUpdated,
    ListCreated,
    ListUpdated,
    ListDeleted,
    ListMoved,
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskMoved,
    TaskAssigned,
    TaskUnassigned,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::BoardCreated => "board_created",
            ActivityKind::BoardUpdated => "board_updated",
            ActivityKind::ListCreated => "list_created",
            ActivityKind::ListUpdated => "list_updated",
            ActivityKind::ListDeleted => "list_deleted",
            ActivityKind::ListMoved => "list_moved",
            ActivityKind::TaskCreated => "task_created",
            ActivityKind::TaskUpdated => "task_updated",
            ActivityKind::TaskDeleted => "task_deleted",
            ActivityKind::TaskMoved => "task_moved",
            ActivityKind::TaskAssigned => "task_assigned",
            ActivityKind::TaskUnassigned => "task_unassigned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "board_created" => ActivityKind::BoardCreated,
            "board_updated" => ActivityKind::BoardUpdated,
            "list_created" => ActivityKind::ListCreated,
            "list_updated" => ActivityKind::ListUpdated,
            "list_deleted" => ActivityKind::ListDeleted,
            "list_moved" => ActivityKind::ListMoved,
            "task_created" => ActivityKind::TaskCreated,
            "task_updated" => ActivityKind::TaskUpdated,
            "task_deleted" => ActivityKind::TaskDeleted,
            "task_moved" => ActivityKind::TaskMoved,
            "task_assigned" => ActivityKind::TaskAssigned,
            "task_unassigned" => ActivityKind::TaskUnassigned,
            _ => return None,
        })
    }
}

/// Write one audit row. Called inside the same transaction as the mutation
/// it describes.
pub(crate) fn record(
    conn: &Connection,
    kind: ActivityKind,
    description: &str,
    user_id: &str,
    board_id: &str,
    task_id: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO activities (id, kind, description, user_id, board_id, task_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            Uuid::new_v4().to_string(),
            kind.as_str(),
            description,
            user_id,
            board_id,
            task_id,
            ts_to_sql(Utc::now()),
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Read side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TaskRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    pub id: String,
    pub kind: ActivityKind,
    pub description: String,
    pub user: UserSummary,
    /// None when the activity never referenced a task, or the task has
    /// since been deleted.
    pub task: Option<TaskRef>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ActivityPage {
    pub activities: Vec<ActivityView>,
    pub pagination: Pagination,
}

/// Board activity feed, newest first. Caller must own the board.
pub fn board_page(
    store: &Store,
    board_id: &str,
    user_id: &str,
    page: u32,
    limit: u32,
) -> Result<ActivityPage> {
    let conn = store.conn();
    board::owned(conn, board_id, user_id)?;

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM activities WHERE board_id = ?1",
        [board_id],
        |r| r.get(0),
    )?;

    let page = page.max(1);
    let offset = (page as i64 - 1) * limit as i64;
    let mut stmt = conn.prepare(
        "SELECT a.id, a.kind, a.description, a.created_at,
                u.id, u.name, u.email,
                t.id, t.title
         FROM activities a
         JOIN users u ON u.id = a.user_id
         LEFT JOIN tasks t ON t.id = a.task_id
         WHERE a.board_id = ?1
         ORDER BY a.created_at DESC, a.rowid DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt.query_map(params![board_id, limit as i64, offset], |r| {
        let kind_raw: String = r.get(1)?;
        let kind = ActivityKind::parse(&kind_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::other(format!(
                    "unknown activity kind: {kind_raw}"
                ))),
            )
        })?;
        let task = match (r.get::<_, Option<String>>(7)?, r.get::<_, Option<String>>(8)?) {
            (Some(id), Some(title)) => Some(TaskRef { id, title }),
            _ => None,
        };
        Ok(ActivityView {
            id: r.get(0)?,
            kind,
            description: r.get(2)?,
            user: UserSummary {
                id: r.get(4)?,
                name: r.get(5)?,
                email: r.get(6)?,
            },
            task,
            created_at: ts_from_sql(&r.get::<_, String>(3)?)?,
        })
    })?;

    let mut activities = Vec::new();
    for row in rows {
        activities.push(row?);
    }
    Ok(ActivityPage {
        activities,
        pagination: Pagination::new(page, limit, total as u64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_round_trip() {
        for kind in [
            ActivityKind::BoardCreated,
            ActivityKind::ListMoved,
            ActivityKind::TaskUnassigned,
        ] {
            assert_eq!(ActivityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActivityKind::parse("bogus"), None);
    }
}
