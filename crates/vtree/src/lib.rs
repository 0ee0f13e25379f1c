#![forbid(unsafe_code)]

//! Vessel equipment tree engine: public facade crate.
//!
//! Re-exports the common types from the internal crates and offers a
//! lightweight prelude for day-to-day usage. Typical entry point:
//!
//! ```
//! use vtree::prelude::*;
//!
//! let mut store = TreeStore::new(seed_forest());
//! store.set_search_query("engine");
//! assert!(store.is_visible("eq-1"));
//! ```

// --- Model re-exports -------------------------------------------------------

pub use vtree_core::{Forest, NodeKind, TreeNode, seed_forest};

// --- Persistence re-exports -------------------------------------------------

pub use vtree_persist::{
    FileStorage, MemoryStorage, STORAGE_KEY, StorageBackend, StorageError, StorageResult,
    TreeSnapshot,
};

// --- Engine re-exports ------------------------------------------------------

pub use vtree_store::{
    DeletionRecord, MAX_UNDO_DEPTH, TreeStore, UndoOutcome, UndoStack, search, walk,
};

// --- Prelude ----------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        FileStorage, Forest, MemoryStorage, NodeKind, StorageBackend, TreeNode, TreeSnapshot,
        TreeStore, UndoOutcome, seed_forest,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn facade_covers_a_full_session() {
        let backend = Box::new(MemoryStorage::new());
        let mut store = TreeStore::load_or_seed(backend, seed_forest());

        store.add_node("asm-1", TreeNode::new("comp-9", "Bearing", NodeKind::Component));
        store.remove_node("comp-9");
        assert_eq!(store.undo_delete(), UndoOutcome::Restored);
        assert!(store.is_expanded("asm-1"));
    }
}
