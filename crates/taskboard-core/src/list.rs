use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

use crate::activity::{self, ActivityKind};
use crate::board;
use crate::error::{CoreError, Result};
use crate::reorder::{compact, reorder, Slot};
use crate::store::{ts_from_sql, ts_to_sql, Store};

#[derive(Debug, Clone, Serialize)]
pub struct List {
    pub id: String,
    pub name: String,
    pub position: i64,
    pub board_id: String,
    pub created_at: DateTime<Utc>,
}

fn row_to_list(r: &Row) -> rusqlite::Result<List> {
    Ok(List {
        id: r.get(0)?,
        name: r.get(1)?,
        position: r.get(2)?,
        board_id: r.get(3)?,
        created_at: ts_from_sql(&r.get::<_, String>(4)?)?,
    })
}

pub fn get(conn: &Connection, id: &str) -> Result<List> {
    conn.query_row(
        "SELECT id, name, position, board_id, created_at FROM lists WHERE id = ?1",
        [id],
        row_to_list,
    )
    .optional()?
    .ok_or_else(|| CoreError::ListNotFound(id.to_string()))
}

pub(crate) fn for_board(conn: &Connection, board_id: &str) -> Result<Vec<List>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, position, board_id, created_at
         FROM lists WHERE board_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map([board_id], row_to_list)?;
    let mut lists = Vec::new();
    for row in rows {
        lists.push(row?);
    }
    Ok(lists)
}

/// The board's sibling group as reindex slots, in position order, optionally
/// excluding the item about to be reinserted.
fn slots(conn: &Connection, board_id: &str, exclude: Option<&str>) -> Result<Vec<Slot>> {
    let mut stmt = conn.prepare(
        "SELECT id, position, board_id FROM lists WHERE board_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map([board_id], |r| {
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

/// Persist a reindex result. Lists never change parent, so only positions
/// are written.
fn apply_slots(conn: &Connection, assigned: &[Slot]) -> Result<()> {
    let mut stmt = conn.prepare("UPDATE lists SET position = ?1 WHERE id = ?2")?;
    for slot in assigned {
        stmt.execute(params![slot.position, slot.id])?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Create a list at the end of the board (the degenerate append case — no
/// reindex needed while the group is dense).
pub fn create(store: &mut Store, board_id: &str, user_id: &str, name: &str) -> Result<List> {
    let tx = store.tx()?;
    board::owned(&tx, board_id, user_id)?;

    let position: i64 = tx.query_row(
        "SELECT COUNT(*) FROM lists WHERE board_id = ?1",
        [board_id],
        |r| r.get(0),
    )?;
    let list = List {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        position,
        board_id: board_id.to_string(),
        created_at: Utc::now(),
    };
    tx.execute(
        "INSERT INTO lists (id, name, position, board_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            list.id,
            list.name,
            list.position,
            list.board_id,
            ts_to_sql(list.created_at)
        ],
    )?;
    activity::record(
        &tx,
        ActivityKind::ListCreated,
        &format!("Created list \"{name}\""),
        user_id,
        board_id,
        None,
    )?;
    tx.commit()?;
    Ok(list)
}

pub fn rename(store: &mut Store, list_id: &str, user_id: &str, name: &str) -> Result<List> {
    let tx = store.tx()?;
    let mut list = get(&tx, list_id)?;
    board::owned(&tx, &list.board_id, user_id)?;

    list.name = name.to_string();
    tx.execute(
        "UPDATE lists SET name = ?1 WHERE id = ?2",
        params![list.name, list_id],
    )?;
    activity::record(
        &tx,
        ActivityKind::ListUpdated,
        &format!("Updated list \"{}\"", list.name),
        user_id,
        &list.board_id,
        None,
    )?;
    tx.commit()?;
    Ok(list)
}

/// Delete a list (tasks cascade) and compact the surviving siblings so the
/// board's positions stay dense.
pub fn delete(store: &mut Store, list_id: &str, user_id: &str) -> Result<()> {
    let tx = store.tx()?;
    let list = get(&tx, list_id)?;
    board::owned(&tx, &list.board_id, user_id)?;

    tx.execute("DELETE FROM lists WHERE id = ?1", [list_id])?;
    let remaining = slots(&tx, &list.board_id, None)?;
    apply_slots(&tx, &compact(&remaining))?;
    activity::record(
        &tx,
        ActivityKind::ListDeleted,
        &format!("Deleted list \"{}\"", list.name),
        user_id,
        &list.board_id,
        None,
    )?;
    tx.commit()?;
    Ok(())
}

/// Move a list to `target_index` among its board's lists. The whole
/// read-compute-write cycle runs in one transaction.
pub fn move_to(
    store: &mut Store,
    list_id: &str,
    user_id: &str,
    target_index: usize,
) -> Result<List> {
    let tx = store.tx()?;
    let list = get(&tx, list_id)?;
    board::owned(&tx, &list.board_id, user_id)?;

    let siblings = slots(&tx, &list.board_id, Some(list_id))?;
    let assigned = reorder(&siblings, list_id, target_index, &list.board_id);
    apply_slots(&tx, &assigned)?;
    activity::record(
        &tx,
        ActivityKind::ListMoved,
        &format!("Moved list \"{}\"", list.name),
        user_id,
        &list.board_id,
        None,
    )?;
    tx.commit()?;
    get(store.conn(), list_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
