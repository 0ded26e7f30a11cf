use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

use crate::activity::{self, ActivityKind};
use crate::error::{CoreError, Result};
use crate::list::{self, List};
use crate::store::{ts_from_sql, ts_to_sql, Store};
use crate::task::{self, TaskDetail};
use crate::types::Pagination;
use crate::user::{self, UserSummary};

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A board's name-only list entries, as shown on the boards overview.
#[derive(Debug, Clone, Serialize)]
pub struct ListName {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct BoardSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: UserSummary,
    pub lists: Vec<ListName>,
    pub list_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BoardPage {
    pub boards: Vec<BoardSummary>,
    pub pagination: Pagination,
}

/// A list with its tasks, as embedded in the full board view.
#[derive(Debug, Serialize)]
pub struct ListDetail {
    pub id: String,
    pub name: String,
    pub position: i64,
    pub board_id: String,
    pub tasks: Vec<TaskDetail>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BoardDetail {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: UserSummary,
    pub lists: Vec<ListDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn row_to_board(r: &Row) -> rusqlite::Result<Board> {
    Ok(Board {
        id: r.get(0)?,
        name: r.get(1)?,
        description: r.get(2)?,
        owner_id: r.get(3)?,
        created_at: ts_from_sql(&r.get::<_, String>(4)?)?,
        updated_at: ts_from_sql(&r.get::<_, String>(5)?)?,
    })
}

pub fn get(conn: &Connection, id: &str) -> Result<Board> {
    conn.query_row(
        "SELECT id, name, description, owner_id, created_at, updated_at
         FROM boards WHERE id = ?1",
        [id],
        row_to_board,
    )
    .optional()?
    .ok_or_else(|| CoreError::BoardNotFound(id.to_string()))
}

/// Load a board and check ownership. Every mutating operation on a board,
/// its lists, or its tasks goes through this gate.
pub(crate) fn owned(conn: &Connection, board_id: &str, user_id: &str) -> Result<Board> {
    let board = get(conn, board_id)?;
    if board.owner_id != user_id {
        return Err(CoreError::AccessDenied);
    }
    Ok(board)
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

pub fn create(
    store: &mut Store,
    owner_id: &str,
    name: &str,
    description: Option<&str>,
) -> Result<Board> {
    let now = Utc::now();
    let board = Board {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: description.map(str::to_string),
        owner_id: owner_id.to_string(),
        created_at: now,
        updated_at: now,
    };

    let tx = store.tx()?;
    tx.execute(
        "INSERT INTO boards (id, name, description, owner_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            board.id,
            board.name,
            board.description,
            board.owner_id,
            ts_to_sql(board.created_at),
            ts_to_sql(board.updated_at),
        ],
    )?;
    activity::record(
        &tx,
        ActivityKind::BoardCreated,
        &format!("Created board \"{name}\""),
        owner_id,
        &board.id,
        None,
    )?;
    tx.commit()?;
    Ok(board)
}

pub fn update(
    store: &mut Store,
    board_id: &str,
    user_id: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Board> {
    let tx = store.tx()?;
    let mut board = owned(&tx, board_id, user_id)?;
    if let Some(n) = name {
        board.name = n.to_string();
    }
    if let Some(d) = description {
        board.description = Some(d.to_string());
    }
    board.updated_at = Utc::now();
    tx.execute(
        "UPDATE boards SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            board.name,
            board.description,
            ts_to_sql(board.updated_at),
            board_id
        ],
    )?;
    activity::record(
        &tx,
        ActivityKind::BoardUpdated,
        &format!("Updated board \"{}\"", board.name),
        user_id,
        board_id,
        None,
    )?;
    tx.commit()?;
    Ok(board)
}

/// Delete a board; lists, tasks, assignments, and the board's activity
/// history go with it via cascade.
pub fn delete(store: &mut Store, board_id: &str, user_id: &str) -> Result<()> {
    let tx = store.tx()?;
    owned(&tx, board_id, user_id)?;
    tx.execute("DELETE FROM boards WHERE id = ?1", [board_id])?;
    tx.commit()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// The user's boards, newest first, with name-only list summaries.
pub fn list_page(store: &Store, owner_id: &str, page: u32, limit: u32) -> Result<BoardPage> {
    let conn = store.conn();
    let owner = user::summary(conn, owner_id)?;

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM boards WHERE owner_id = ?1",
        [owner_id],
        |r| r.get(0),
    )?;

    let page = page.max(1);
    let offset = (page as i64 - 1) * limit as i64;
    let mut stmt = conn.prepare(
        "SELECT id, name, description, owner_id, created_at, updated_at
         FROM boards WHERE owner_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt.query_map(params![owner_id, limit as i64, offset], row_to_board)?;
    let mut raw = Vec::new();
    for row in rows {
        raw.push(row?);
    }
    drop(stmt);

    let mut boards = Vec::with_capacity(raw.len());
    for b in raw {
        let lists = list_names(conn, &b.id)?;
        boards.push(BoardSummary {
            id: b.id,
            name: b.name,
            description: b.description,
            owner: owner.clone(),
            list_count: lists.len(),
            lists,
            created_at: b.created_at,
            updated_at: b.updated_at,
        });
    }

    Ok(BoardPage {
        boards,
        pagination: Pagination::new(page, limit, total as u64),
    })
}

/// The full board tree: lists in position order, each with its tasks in
/// position order.
pub fn detail(store: &Store, board_id: &str, user_id: &str) -> Result<BoardDetail> {
    let conn = store.conn();
    let board = owned(conn, board_id, user_id)?;
    let owner = user::summary(conn, &board.owner_id)?;

    let lists: Vec<List> = list::for_board(conn, board_id)?;
    let mut detailed = Vec::with_capacity(lists.len());
    for l in lists {
        let tasks = task::details_for_list(conn, &l.id)?;
        detailed.push(ListDetail {
            id: l.id,
            name: l.name,
            position: l.position,
            board_id: l.board_id,
            tasks,
            created_at: l.created_at,
        });
    }

    Ok(BoardDetail {
        id: board.id,
        name: board.name,
        description: board.description,
        owner,
        lists: detailed,
        created_at: board.created_at,
        updated_at: board.updated_at,
    })
}

fn list_names(conn: &Connection, board_id: &str) -> Result<Vec<ListName>> {
    let mut stmt = conn.prepare(
        "SELECT id, name FROM lists WHERE board_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map([board_id], |r| {
        Ok(ListName {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    let mut names = Vec::new();
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user;

    fn setup() -> (Store, String, String) {
        let store = Store::open_in_memory().unwrap();
        let owner = user::register(&store, "owner@example.com", "secret123", "Owner").unwrap();
        let other = user::register(&store, "other@example.com", "secret123", "Other").unwrap();
        (store, owner.id, other.id)
    }

    #[test]
    fn create_and_fetch_board() {
        let (mut store, owner, _) = setup();
        let board = create(&mut store, &owner, "Roadmap", Some("Q3")).unwrap();
        let back = get(store.conn(), &board.id).unwrap();
        assert_eq!(back.name, "Roadmap");
        assert_eq!(back.description.as_deref(), Some("Q3"));
    }

    #[test]
    fn non_owner_is_denied() {
        let (mut store, owner, other) = setup();
        let board = create(&mut store, &owner, "Roadmap", None).unwrap();
        assert!(matches!(
            update(&mut store, &board.id, &other, Some("Hijack"), None).unwrap_err(),
            CoreError::AccessDenied
        ));
        assert!(matches!(
            delete(&mut store, &board.id, &other).unwrap_err(),
            CoreError::AccessDenied
        ));
    }

    #[test]
    fn missing_board_is_not_found() {
        let (store, owner, _) = setup();
        assert!(matches!(
            detail(&store, "nope", &owner).unwrap_err(),
            CoreError::BoardNotFound(_)
        ));
    }

    #[test]
    fn delete_cascades_lists_and_activities() {
        let (mut store, owner, _) = setup();
        let board = create(&mut store, &owner, "Temp", None).unwrap();
        crate::list::create(&mut store, &board.id, &owner, "Backlog").unwrap();

        delete(&mut store, &board.id, &owner).unwrap();
        let lists: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM lists", [], |r| r.get(0))
            .unwrap();
        let acts: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM activities", [], |r| r.get(0))
            .unwrap();
        assert_eq!(lists, 0);
        assert_eq!(acts, 0);
    }

    #[test]
    fn list_page_paginates_newest_first() {
        let (mut store, owner, _) = setup();
        for i in 0..3 {
            create(&mut store, &owner, &format!("B{i}"), None).unwrap();
        }
        let page = list_page(&store, &owner, 1, 2).unwrap();
        assert_eq!(page.boards.len(), 2);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.boards[0].name, "B2");
    }

    #[test]
    fn update_writes_activity() {
        let (mut store, owner, _) = setup();
        let board = create(&mut store, &owner, "Roadmap", None).unwrap();
        update(&mut store, &board.id, &owner, Some("Renamed"), None).unwrap();

        let page = crate::activity::board_page(&store, &board.id, &owner, 1, 10).unwrap();
        assert_eq!(page.activities.len(), 2);
        assert_eq!(page.activities[0].kind, ActivityKind::BoardUpdated);
        assert_eq!(page.activities[1].kind, ActivityKind::BoardCreated);
    }
}
