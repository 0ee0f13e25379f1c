#![forbid(unsafe_code)]

//! End-to-end scenarios for [`TreeStore`] over real storage backends.
//!
//! Covers the full editor session lifecycle: seed, search, structural
//! edits, undo, and restart rehydration from both memory and file
//! storage. Also verifies the best-effort persistence contract: a
//! failing backend never disturbs in-memory state.

use std::sync::Arc;

use vtree_core::{NodeKind, TreeNode, seed_forest};
use vtree_persist::{
    FileStorage, MemoryStorage, STORAGE_KEY, StorageBackend, StorageError, StorageResult,
    TreeSnapshot, load_snapshot,
};
use vtree_store::{MAX_UNDO_DEPTH, TreeStore, UndoOutcome, walk};

// ============================================================================
// Full session over the seed forest
// ============================================================================

#[test]
fn search_remove_undo_session() {
    let mut store = TreeStore::new(seed_forest());

    // Search narrows the view to matches plus their root paths.
    store.set_search_query("engine");
    let visible = store.visible().unwrap().clone();
    assert!(visible.contains("cat-1"));
    assert!(visible.contains("eq-1"));
    assert!(visible.contains("sub-eq-1"));
    assert!(visible.contains("root-1"));
    assert!(!visible.contains("cat-2"));
    for id in &visible {
        assert!(store.is_expanded(id), "search should expand {id}");
    }

    // Removing the Engine category takes its whole branch with it.
    store.remove_node("cat-1");
    assert!(walk::find(store.forest(), "eq-1").is_none());
    assert!(store.visible().unwrap().is_empty());

    // Undo puts the branch back as the last child and re-expands the spine.
    assert_eq!(store.undo_delete(), UndoOutcome::Restored);
    let root = &store.forest()[0];
    assert_eq!(root.children().last().unwrap().id(), "cat-1");
    assert!(store.is_expanded("cat-1"));
    assert!(store.is_expanded("root-1"));
    assert!(store.visible().unwrap().contains("eq-1"));

    // Clearing the query drops filtering but keeps expansion state.
    store.set_search_query("");
    assert!(store.visible().is_none());
    assert!(store.is_expanded("cat-1"));
}

#[test]
fn deep_edit_session_keeps_taxonomy_navigable() {
    let mut store = TreeStore::new(seed_forest());

    store.add_node(
        "asm-1",
        TreeNode::new("comp-20", "Wastegate", NodeKind::Component),
    );
    assert_eq!(store.editing_id(), Some("comp-20"));
    assert!(store.is_expanded("asm-1"));

    store.update_node_name("comp-20", "Wastegate Actuator");
    store.set_editing(None);
    store.set_selected(Some("comp-20".to_string()));

    let node = walk::find(store.forest(), "comp-20").unwrap();
    assert_eq!(node.name(), "Wastegate Actuator");
    assert_eq!(node.kind(), NodeKind::Component);
    assert_eq!(store.selected_id(), Some("comp-20"));
}

// ============================================================================
// Persistence through MemoryStorage
// ============================================================================

#[test]
fn every_mutation_snapshots_to_storage() {
    let backend = Arc::new(MemoryStorage::new());
    let mut store =
        TreeStore::new(seed_forest()).with_storage(Box::new(Arc::clone(&backend)));

    store.expand_node("cat-2");
    store.set_search_query("crane");

    let stored = load_snapshot(backend.as_ref()).unwrap().unwrap();
    assert_eq!(stored.search_query, "crane");
    assert!(stored.expanded.contains(&"cat-2".to_string()));
    assert_eq!(stored.forest, seed_forest());
}

#[test]
fn stored_document_shape_is_stable() {
    let backend = Arc::new(MemoryStorage::new());
    let mut store =
        TreeStore::new(seed_forest()).with_storage(Box::new(Arc::clone(&backend)));
    store.expand_node("root-1");

    let bytes = backend.load(STORAGE_KEY).unwrap().unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["format_version"], 1);
    assert_eq!(doc["snapshot"]["forest"][0]["id"], "root-1");
    assert_eq!(doc["snapshot"]["forest"][0]["type"], "EQUIPMENT_TYPE");
    assert_eq!(doc["snapshot"]["expanded"][0], "root-1");
    assert_eq!(doc["snapshot"]["search_query"], "");
}

#[test]
fn restart_rehydrates_forest_and_expansion_but_not_search() {
    let backend = Arc::new(MemoryStorage::new());

    {
        let mut store =
            TreeStore::load_or_seed(Box::new(Arc::clone(&backend)), seed_forest());
        store.add_node("cat-2", TreeNode::new("eq-9", "Windlass", NodeKind::Equipment));
        store.set_search_query("windlass");
        store.set_selected(Some("eq-9".to_string()));
    }

    let store = TreeStore::load_or_seed(Box::new(Arc::clone(&backend)), seed_forest());
    // The edited forest and expansion state survive the restart.
    assert!(walk::find(store.forest(), "eq-9").is_some());
    assert!(store.is_expanded("cat-2"));
    // Session-local state does not.
    assert_eq!(store.search_query(), "");
    assert!(store.visible().is_none());
    assert_eq!(store.selected_id(), None);
    assert_eq!(store.editing_id(), None);
    assert!(!store.can_undo());
}

#[test]
fn first_run_seeds_with_roots_expanded() {
    let backend = MemoryStorage::new();
    let store = TreeStore::load_or_seed(Box::new(backend), seed_forest());

    assert_eq!(store.forest(), seed_forest());
    assert!(store.is_expanded("root-1"));
    assert!(!store.is_expanded("cat-1"));
}

#[test]
fn corrupt_snapshot_falls_back_to_seed() {
    let backend = Arc::new(MemoryStorage::new());
    backend.save(STORAGE_KEY, b"{ not json").unwrap();

    let store = TreeStore::load_or_seed(Box::new(Arc::clone(&backend)), seed_forest());
    assert_eq!(store.forest(), seed_forest());
    assert!(store.is_expanded("root-1"));
}

#[test]
fn empty_stored_forest_falls_back_to_seed() {
    let backend = Arc::new(MemoryStorage::new());
    let empty = TreeSnapshot::default();
    vtree_persist::save_snapshot(backend.as_ref(), &empty).unwrap();

    let store = TreeStore::load_or_seed(Box::new(Arc::clone(&backend)), seed_forest());
    assert_eq!(store.forest(), seed_forest());
}

// ============================================================================
// Persistence through FileStorage
// ============================================================================

#[test]
fn file_storage_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let backend = FileStorage::new(dir.path());
        let mut store = TreeStore::load_or_seed(Box::new(backend), seed_forest());
        store.remove_node("cat-2");
        store.expand_node("cat-1");
    }

    let backend = FileStorage::new(dir.path());
    let store = TreeStore::load_or_seed(Box::new(backend), seed_forest());
    assert!(walk::find(store.forest(), "cat-2").is_none());
    assert!(store.is_expanded("cat-1"));
}

// ============================================================================
// Best-effort persistence: failures never surface
// ============================================================================

/// A backend whose writes always fail, for exercising the warn-and-continue
/// path.
struct BrokenStorage;

impl StorageBackend for BrokenStorage {
    fn name(&self) -> &str {
        "broken"
    }

    fn load(&self, _key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn save(&self, _key: &str, _bytes: &[u8]) -> StorageResult<()> {
        Err(StorageError::Io(std::io::Error::other("disk full")))
    }

    fn clear(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[test]
fn failed_snapshot_writes_do_not_disturb_state() {
    let mut store = TreeStore::new(seed_forest()).with_storage(Box::new(BrokenStorage));

    store.add_node("cat-1", TreeNode::new("eq-9", "Thruster", NodeKind::Equipment));
    store.remove_node("eq-9");
    assert_eq!(store.undo_delete(), UndoOutcome::Restored);

    assert!(walk::find(store.forest(), "eq-9").is_some());
    assert_eq!(store.undo_depth(), 0);
}

// ============================================================================
// Undo depth across a long session
// ============================================================================

#[test]
fn long_session_forgets_only_the_oldest_deletions() {
    let mut store = TreeStore::new(seed_forest());
    let extra = MAX_UNDO_DEPTH + 5;
    for i in 0..extra {
        store.add_node(
            "cat-1",
            TreeNode::new(format!("eq-x{i}"), format!("Spare {i}"), NodeKind::Equipment),
        );
    }
    for i in 0..extra {
        store.remove_node(&format!("eq-x{i}"));
    }

    let mut restored = 0;
    while store.undo_delete() == UndoOutcome::Restored {
        restored += 1;
    }
    assert_eq!(restored, MAX_UNDO_DEPTH);
    // The most recent deletions came back; the first five are gone for good.
    for i in 5..extra {
        assert!(walk::find(store.forest(), &format!("eq-x{i}")).is_some());
    }
    for i in 0..5 {
        assert!(walk::find(store.forest(), &format!("eq-x{i}")).is_none());
    }
}
