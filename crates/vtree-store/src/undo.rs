//! Bounded undo stack for deletions.
//!
//! Every delete pushes a [`DeletionRecord`] holding the detached subtree by
//! value, the former parent id, and a wall-clock timestamp. The stack keeps
//! only the [`MAX_UNDO_DEPTH`] most recent records, evicting the oldest
//! from the front. Records are pushed on delete, popped most-recent-first
//! on undo, and never otherwise mutated.

use std::collections::VecDeque;

use vtree_core::TreeNode;
use web_time::{SystemTime, UNIX_EPOCH};

/// How many deletions are recoverable. Older deletions are evicted.
pub const MAX_UNDO_DEPTH: usize = 10;

/// A snapshot of a removed subtree, retained to support undo.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionRecord {
    /// The detached subtree, including all descendants.
    pub node: TreeNode,
    /// Id of the former parent; `None` when the node was a root.
    pub parent_id: Option<String>,
    /// Deletion time, milliseconds since the Unix epoch.
    pub deleted_at_ms: u64,
}

impl DeletionRecord {
    /// Record a deletion that just happened.
    #[must_use]
    pub fn new(node: TreeNode, parent_id: Option<String>) -> Self {
        Self {
            node,
            parent_id,
            deleted_at_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// What an undo call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The subtree went back under its recorded parent (or back to the
    /// root list, for deleted roots).
    Restored,
    /// The recorded parent no longer exists; the subtree was re-rooted as
    /// a new last root instead of being dropped.
    RerootedOrphan,
    /// The undo stack was empty; nothing changed.
    NothingToUndo,
}

/// Ordered deletion history, oldest first, bounded to [`MAX_UNDO_DEPTH`].
#[derive(Debug, Default)]
pub struct UndoStack {
    records: VecDeque<DeletionRecord>,
}

impl UndoStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a deletion record, evicting the oldest past the depth bound.
    pub fn push(&mut self, record: DeletionRecord) {
        self.records.push_back(record);
        while self.records.len() > MAX_UNDO_DEPTH {
            self.records.pop_front();
        }
    }

    /// Pop the most recent deletion record.
    pub fn pop(&mut self) -> Option<DeletionRecord> {
        self.records.pop_back()
    }

    /// Number of recoverable deletions.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.records.len()
    }

    /// Whether there is anything to undo.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
