use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

use crate::activity::{self, ActivityKind};
use crate::board::{self, ListName};
use crate::error::{CoreError, Result};
use crate::list::{self, List};
use crate::reorder::{compact, reorder, Slot};
use crate::store::{ts_from_sql, ts_to_sql, Store};
use crate::user::{self, UserSummary};

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub position: i64,
    pub list_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task with its creator and assignees resolved, as served to clients.
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub position: i64,
    pub list_id: String,
    pub created_by: UserSummary,
    pub assignees: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A search result: the task plus the list it lives in.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub position: i64,
    pub list: ListName,
    pub created_by: UserSummary,
    pub assignees: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn row_to_task(r: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: r.get(0)?,
        title: r.get(1)?,
        description: r.get(2)?,
        position: r.get(3)?,
        list_id: r.get(4)?,
        created_by: r.get(5)?,
        created_at: ts_from_sql(&r.get::<_, String>(6)?)?,
        updated_at: ts_from_sql(&r.get::<_, String>(7)?)?,
    })
}

const TASK_COLS: &str =
    "id, title, description, position, list_id, created_by, created_at, updated_at";

pub fn get(conn: &Connection, id: &str) -> Result<Task> {
    conn.query_row(
        &format!("SELECT {TASK_COLS} FROM tasks WHERE id = ?1"),
        [id],
        row_to_task,
    )
    .optional()?
    .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
}

/// Load a task and verify the caller owns the board it transitively
/// belongs to. Returns the task and its list.
fn owned(conn: &Connection, task_id: &str, user_id: &str) -> Result<(Task, List)> {
    let task = get(conn, task_id)?;
    let l = list::get(conn, &task.list_id)?;
    board::owned(conn, &l.board_id, user_id)?;
    Ok((task, l))
}

fn assignees(conn: &Connection, task_id: &str) -> Result<Vec<UserSummary>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.name, u.email
         FROM task_assignments ta JOIN users u ON u.id = ta.user_id
         WHERE ta.task_id = ?1 ORDER BY u.name ASC",
    )?;
    let rows = stmt.query_map([task_id], |r| {
        Ok(UserSummary {
            id: r.get(0)?,
            name: r.get(1)?,
            email: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn to_detail(conn: &Connection, task: Task) -> Result<TaskDetail> {
    let created_by = user::summary(conn, &task.created_by)?;
    let assignees = assignees(conn, &task.id)?;
    Ok(TaskDetail {
        id: task.id,
        title: task.title,
        description: task.description,
        position: task.position,
        list_id: task.list_id,
        created_by,
        assignees,
        created_at: task.created_at,
        updated_at: task.updated_at,
    })
}

pub(crate) fn details_for_list(conn: &Connection, list_id: &str) -> Result<Vec<TaskDetail>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLS} FROM tasks WHERE list_id = ?1 ORDER BY position ASC"
    ))?;
    let rows = stmt.query_map([list_id], row_to_task)?;
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row?);
    }
    drop(stmt);
    tasks.into_iter().map(|t| to_detail(conn, t)).collect()
}

/// The list's sibling group as reindex slots, optionally excluding the item
/// about to be reinserted.
fn slots(conn: &Connection, list_id: &str, exclude: Option<&str>) -> Result<Vec<Slot>> {
    let mut stmt = conn.prepare(
        "SELECT id, position, list_id FROM tasks WHERE list_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map([list_id], |r| {
        Ok(Slot {
            id: r.get(0)?,
            position: r.get(1)?,
            parent_id: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        let slot = row?;
        if exclude != Some(slot.id.as_str()) {
            out.push(slot);
        }
    }
    Ok(out)
}

/// Persist a reindex result. Tasks can reparent, so both position and
/// list_id are written.
fn apply_slots(conn: &Connection, assigned: &[Slot]) -> Result<()> {
    let mut stmt = conn.prepare("UPDATE tasks SET position = ?1, list_id = ?2 WHERE id = ?3")?;
    for slot in assigned {
        stmt.execute(params![slot.position, slot.parent_id, slot.id])?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

pub fn create(
    store: &mut Store,
    list_id: &str,
    user_id: &str,
    title: &str,
    description: Option<&str>,
) -> Result<TaskDetail> {
    let tx = store.tx()?;
    let l = list::get(&tx, list_id)?;
    board::owned(&tx, &l.board_id, user_id)?;

    let position: i64 = tx.query_row(
        "SELECT COUNT(*) FROM tasks WHERE list_id = ?1",
        [list_id],
        |r| r.get(0),
    )?;
    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: description.map(str::to_string),
        position,
        list_id: list_id.to_string(),
        created_by: user_id.to_string(),
        created_at: now,
        updated_at: now,
    };
    tx.execute(
        "INSERT INTO tasks (id, title, description, position, list_id, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            task.id,
            task.title,
            task.description,
            task.position,
            task.list_id,
            task.created_by,
            ts_to_sql(task.created_at),
            ts_to_sql(task.updated_at),
        ],
    )?;
    activity::record(
        &tx,
        ActivityKind::TaskCreated,
        &format!("Created task \"{title}\""),
        user_id,
        &l.board_id,
        Some(&task.id),
    )?;
    tx.commit()?;
    to_detail(store.conn(), task)
}

pub fn detail(store: &Store, task_id: &str, user_id: &str) -> Result<TaskDetail> {
    let conn = store.conn();
    let (task, _) = owned(conn, task_id, user_id)?;
    to_detail(conn, task)
}

pub fn update(
    store: &mut Store,
    task_id: &str,
    user_id: &str,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<TaskDetail> {
    let tx = store.tx()?;
    let (mut task, l) = owned(&tx, task_id, user_id)?;
    if let Some(t) = title {
        task.title = t.to_string();
    }
    if let Some(d) = description {
        task.description = Some(d.to_string());
    }
    task.updated_at = Utc::now();
    tx.execute(
        "UPDATE tasks SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            task.title,
            task.description,
            ts_to_sql(task.updated_at),
            task_id
        ],
    )?;
    activity::record(
        &tx,
        ActivityKind::TaskUpdated,
        &format!("Updated task \"{}\"", task.title),
        user_id,
        &l.board_id,
        Some(task_id),
    )?;
    tx.commit()?;
    to_detail(store.conn(), task)
}

/// Delete a task and compact its list's surviving siblings.
pub fn delete(store: &mut Store, task_id: &str, user_id: &str) -> Result<()> {
    let tx = store.tx()?;
    let (task, l) = owned(&tx, task_id, user_id)?;

    tx.execute("DELETE FROM tasks WHERE id = ?1", [task_id])?;
    let remaining = slots(&tx, &task.list_id, None)?;
    apply_slots(&tx, &compact(&remaining))?;
    activity::record(
        &tx,
        ActivityKind::TaskDeleted,
        &format!("Deleted task \"{}\"", task.title),
        user_id,
        &l.board_id,
        None,
    )?;
    tx.commit()?;
    Ok(())
}

/// Move a task to `target_index` in `dest_list_id` (same list or another
/// one, possibly on another of the caller's boards). The destination
/// reorder and the source compaction commit atomically.
pub fn move_to(
    store: &mut Store,
    task_id: &str,
    user_id: &str,
    dest_list_id: &str,
    target_index: usize,
) -> Result<TaskDetail> {
    let tx = store.tx()?;
    let task = get(&tx, task_id)?;
    let src = list::get(&tx, &task.list_id)?;
    let dest = list::get(&tx, dest_list_id)?;
    board::owned(&tx, &src.board_id, user_id)?;
    board::owned(&tx, &dest.board_id, user_id)?;

    let dest_siblings = slots(&tx, dest_list_id, Some(task_id))?;
    let assigned = reorder(&dest_siblings, task_id, target_index, dest_list_id);
    apply_slots(&tx, &assigned)?;

    if src.id != dest.id {
        let remaining = slots(&tx, &src.id, Some(task_id))?;
        apply_slots(&tx, &compact(&remaining))?;
    }

    tx.execute(
        "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
        params![ts_to_sql(Utc::now()), task_id],
    )?;
    activity::record(
        &tx,
        ActivityKind::TaskMoved,
        &format!("Moved task \"{}\" to {}", task.title, dest.name),
        user_id,
        &src.board_id,
        Some(task_id),
    )?;
    tx.commit()?;
    detail(store, task_id, user_id)
}

pub fn assign(
    store: &mut Store,
    task_id: &str,
    user_id: &str,
    assignee_id: &str,
) -> Result<TaskDetail> {
    let tx = store.tx()?;
    let (task, l) = owned(&tx, task_id, user_id)?;
    let assignee = user::get(&tx, assignee_id)?;

    let already: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM task_assignments WHERE task_id = ?1 AND user_id = ?2",
            params![task_id, assignee_id],
            |r| r.get(0),
        )
        .optional()?;
    if already.is_some() {
        return Err(CoreError::AlreadyAssigned);
    }

    tx.execute(
        "INSERT INTO task_assignments (task_id, user_id) VALUES (?1, ?2)",
        params![task_id, assignee_id],
    )?;
    activity::record(
        &tx,
        ActivityKind::TaskAssigned,
        &format!("Assigned {} to task \"{}\"", assignee.name, task.title),
        user_id,
        &l.board_id,
        Some(task_id),
    )?;
    tx.commit()?;
    detail(store, task_id, user_id)
}

pub fn unassign(
    store: &mut Store,
    task_id: &str,
    user_id: &str,
    assignee_id: &str,
) -> Result<TaskDetail> {
    let tx = store.tx()?;
    let (task, l) = owned(&tx, task_id, user_id)?;

    let removed = tx.execute(
        "DELETE FROM task_assignments WHERE task_id = ?1 AND user_id = ?2",
        params![task_id, assignee_id],
    )?;
    if removed == 0 {
        return Err(CoreError::NotAssigned);
    }
    if let Ok(assignee) = user::get(&tx, assignee_id) {
        activity::record(
            &tx,
            ActivityKind::TaskUnassigned,
            &format!("Unassigned {} from task \"{}\"", assignee.name, task.title),
            user_id,
            &l.board_id,
            Some(task_id),
        )?;
    }
    tx.commit()?;
    detail(store, task_id, user_id)
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Case-insensitive substring search over task titles and descriptions
/// within one board, newest first, capped at 50 hits.
pub fn search(
    store: &Store,
    board_id: &str,
    user_id: &str,
    query: &str,
) -> Result<Vec<SearchHit>> {
    let conn = store.conn();
    board::owned(conn, board_id, user_id)?;

    let pattern = format!("%{}%", query.to_lowercase());
    let mut stmt = conn.prepare(
        "SELECT t.id, t.title, t.description, t.position, t.list_id,
                t.created_by, t.created_at, t.updated_at, l.name
         FROM tasks t JOIN lists l ON l.id = t.list_id
         WHERE l.board_id = ?1
           AND (lower(t.title) LIKE ?2 OR lower(coalesce(t.description, '')) LIKE ?2)
         ORDER BY t.created_at DESC, t.rowid DESC
         LIMIT 50",
    )?;
    let rows = stmt.query_map(params![board_id, pattern], |r| {
        Ok((row_to_task(r)?, r.get::<_, String>(8)?))
    })?;
    let mut raw = Vec::new();
    for row in rows {
        raw.push(row?);
    }
    drop(stmt);

    let mut hits = Vec::with_capacity(raw.len());
    for (task, list_name) in raw {
        let created_by = user::summary(conn, &task.created_by)?;
        let task_assignees = assignees(conn, &task.id)?;
        hits.push(SearchHit {
            id: task.id,
            title: task.title,
            description: task.description,
            position: task.position,
            list: ListName {
                id: task.list_id,
                name: list_name,
            },
            created_by,
            assignees: task_assignees,
            created_at: task.created_at,
            updated_at: task.updated_at,
        });
    }
    Ok(hits)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
