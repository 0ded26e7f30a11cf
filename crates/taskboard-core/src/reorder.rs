//! Sibling-group position reindexing.
//!
//! Lists on a board and tasks in a list carry a dense, 0-based `position`.
//! Every insert, move, or removal rebuilds the affected group's positions so
//! the sequence stays gap-free and duplicate-free. Both functions are pure;
//! callers persist the returned slots inside a single transaction so a
//! partial write can never leave a group half-renumbered.

use serde::{Deserialize, Serialize};

/// One (item, position, parent) assignment within a sibling group.
///
/// `parent_id` is the board id for lists and the list id for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub position: i64,
    pub parent_id: String,
}

impl Slot {
    pub fn new(id: impl Into<String>, position: i64, parent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            parent_id: parent_id.into(),
        }
    }
}

/// Recompute positions after placing `moving_id` at `target_index`.
///
/// `siblings` is the group's current order with the moving item already
/// removed; input positions may contain gaps or duplicates (e.g. after an
/// interrupted write) — only their relative order matters. The result is the
/// dense sequence `0..=siblings.len()`, with the moving item reparented to
/// `target_parent`. A `target_index` past the end saturates to an append.
pub fn reorder(
    siblings: &[Slot],
    moving_id: &str,
    target_index: usize,
    target_parent: &str,
) -> Vec<Slot> {
    let insert_at = target_index.min(siblings.len());

    let mut out: Vec<Slot> = Vec::with_capacity(siblings.len() + 1);
    for (i, s) in siblings.iter().enumerate() {
        let position = if i < insert_at { i } else { i + 1 };
        out.push(Slot::new(s.id.clone(), position as i64, s.parent_id.clone()));
    }
    out.insert(
        insert_at,
        Slot::new(moving_id, insert_at as i64, target_parent),
    );
    out
}

/// Renumber the survivors of a removal (delete, or a move to another group).
pub fn compact(siblings: &[Slot]) -> Vec<Slot> {
    siblings
        .iter()
        .enumerate()
        .map(|(i, s)| Slot::new(s.id.clone(), i as i64, s.parent_id.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
