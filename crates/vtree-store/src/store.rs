//! The tree state engine.
//!
//! [`TreeStore`] is a caller-owned state container: construct one per
//! editor session (seeded or rehydrated from storage) and inject it into
//! whatever presents it. There is no global instance.
//!
//! # Invariants
//!
//! 1. Derived indexes are never stale: every mutation that can affect the
//!    visibility set recomputes it before the call returns.
//! 2. Missing-id operations are silent no-ops: the forest, the indexes,
//!    and the revision counter are all left untouched.
//! 3. `revision()` strictly increases across observable changes, so
//!    consumers detect edits by comparing revisions, not tree contents.
//! 4. The undo stack holds at most [`MAX_UNDO_DEPTH`] records; the oldest
//!    deletion is evicted first.
//!
//! Persistence is best-effort: when the store carries a storage backend,
//! every mutation ends with a snapshot write, and a failed write is logged
//! at `warn` without disturbing the in-memory state.

use ahash::AHashSet;
use vtree_core::{Forest, TreeNode};
use vtree_persist::{StorageBackend, TreeSnapshot, load_snapshot, save_snapshot};

use crate::search;
use crate::undo::{DeletionRecord, UndoOutcome, UndoStack};
use crate::walk;

/// In-memory ownership store for one forest and its derived views.
pub struct TreeStore {
    forest: Forest,
    /// Ids whose children are currently displayed.
    expanded: AHashSet<String>,
    /// `None` means no filter; otherwise the ids that survive the search.
    visible: Option<AHashSet<String>>,
    selected: Option<String>,
    editing: Option<String>,
    search_query: String,
    undo: UndoStack,
    revision: u64,
    storage: Option<Box<dyn StorageBackend>>,
}

impl std::fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore")
            .field("roots", &self.forest.len())
            .field("expanded", &self.expanded.len())
            .field("filtered", &self.visible.is_some())
            .field("undo_depth", &self.undo.depth())
            .field("revision", &self.revision)
            .finish()
    }
}

impl TreeStore {
    /// Create a store over the given forest, with no persistence.
    #[must_use]
    pub fn new(forest: Forest) -> Self {
        Self {
            forest,
            expanded: AHashSet::new(),
            visible: None,
            selected: None,
            editing: None,
            search_query: String::new(),
            undo: UndoStack::new(),
            revision: 0,
            storage: None,
        }
    }

    /// Attach a storage backend; every subsequent mutation snapshots to it.
    #[must_use]
    pub fn with_storage(mut self, backend: Box<dyn StorageBackend>) -> Self {
        self.storage = Some(backend);
        self
    }

    /// Rehydrate a store from storage, falling back to `seed`.
    ///
    /// A stored, non-empty forest replaces the seed and brings its expansion
    /// set along. The search query, visibility set, selection, editing
    /// marker, and undo history always start empty: a restart never resumes
    /// an active search. On a fresh run the seed's roots start expanded.
    #[must_use]
    pub fn load_or_seed(backend: Box<dyn StorageBackend>, seed: Forest) -> Self {
        let stored = match load_snapshot(backend.as_ref()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, backend = backend.name(), "snapshot load failed");
                None
            }
        };

        let (forest, expanded) = match stored {
            Some(snapshot) if !snapshot.forest.is_empty() => {
                tracing::debug!(
                    roots = snapshot.forest.len(),
                    expanded = snapshot.expanded.len(),
                    "store.load"
                );
                (snapshot.forest, snapshot.expanded.into_iter().collect())
            }
            _ => {
                let expanded = seed.iter().map(|root| root.id().to_string()).collect();
                (seed, expanded)
            }
        };

        Self {
            forest,
            expanded,
            visible: None,
            selected: None,
            editing: None,
            search_query: String::new(),
            undo: UndoStack::new(),
            revision: 0,
            storage: Some(backend),
        }
    }

    // ========================================================================
    // Snapshot getters
    // ========================================================================

    /// The forest, roots in display order.
    #[must_use]
    pub fn forest(&self) -> &[TreeNode] {
        &self.forest
    }

    /// Ids whose children are currently displayed.
    #[must_use]
    pub fn expanded(&self) -> &AHashSet<String> {
        &self.expanded
    }

    /// Whether a node's children are currently displayed.
    #[must_use]
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// The visibility set, or `None` when no search filter is active.
    #[must_use]
    pub fn visible(&self) -> Option<&AHashSet<String>> {
        self.visible.as_ref()
    }

    /// Whether a node survives the active search filter.
    ///
    /// Always true when no filter is active.
    #[must_use]
    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.as_ref().is_none_or(|v| v.contains(id))
    }

    /// The selected node id, if any.
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The node currently in inline-rename mode, if any.
    #[must_use]
    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// The current search query, as last set (untrimmed).
    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Whether an undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Number of recoverable deletions.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.depth()
    }

    /// Monotonic change counter. Bumped on every observable change and
    /// untouched by no-ops, so consumers can compare revisions instead of
    /// tree contents to detect edits.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ========================================================================
    // Structural mutations
    // ========================================================================

    /// Insert `node` as the last child of `parent_id`.
    ///
    /// Marks the parent expanded and puts the new node into inline-rename
    /// mode. Silent no-op when the parent id does not exist.
    pub fn add_node(&mut self, parent_id: &str, node: TreeNode) {
        let Some(parent) = walk::find_mut(&mut self.forest, parent_id) else {
            tracing::debug!(parent_id, "store.add ignored, parent not found");
            return;
        };
        let id = node.id().to_string();
        let kind = node.kind();
        parent.push_child(node);
        self.expanded.insert(parent_id.to_string());
        self.editing = Some(id.clone());
        self.refresh_visibility();
        tracing::debug!(id = %id, parent_id, kind = kind.as_str(), "store.add");
        self.commit();
    }

    /// Append `node` as a new last root.
    ///
    /// Same expansion and editing side effects as [`add_node`](Self::add_node),
    /// applied to the new node itself.
    pub fn add_root_node(&mut self, node: TreeNode) {
        let id = node.id().to_string();
        let kind = node.kind();
        self.forest.push(node);
        self.expanded.insert(id.clone());
        self.editing = Some(id.clone());
        self.refresh_visibility();
        tracing::debug!(id = %id, kind = kind.as_str(), "store.add_root");
        self.commit();
    }

    /// Remove a node and its entire subtree, recording it for undo.
    ///
    /// Silent no-op when the id does not exist; nothing is recorded.
    pub fn remove_node(&mut self, id: &str) {
        let Some((node, parent_id)) = walk::detach(&mut self.forest, id) else {
            tracing::debug!(id, "store.remove ignored, node not found");
            return;
        };
        tracing::debug!(id, kind = node.kind().as_str(), subtree = node.count(), "store.remove");
        self.undo.push(DeletionRecord::new(node, parent_id));
        self.refresh_visibility();
        self.commit();
    }

    /// Reinsert the most recently deleted subtree.
    ///
    /// The subtree goes back as the last child of its recorded parent, or
    /// as a new last root when it was a root. When the recorded parent has
    /// itself been deleted in the meantime, the subtree is re-rooted as a
    /// new last root rather than dropped, and the outcome says so.
    pub fn undo_delete(&mut self) -> UndoOutcome {
        let Some(record) = self.undo.pop() else {
            return UndoOutcome::NothingToUndo;
        };
        let DeletionRecord { node, parent_id, .. } = record;
        let id = node.id().to_string();

        let outcome = match parent_id {
            None => {
                self.forest.push(node);
                UndoOutcome::Restored
            }
            Some(pid) => {
                if let Some(parent) = walk::find_mut(&mut self.forest, &pid) {
                    parent.push_child(node);
                    self.expanded.insert(pid);
                    UndoOutcome::Restored
                } else {
                    self.forest.push(node);
                    UndoOutcome::RerootedOrphan
                }
            }
        };
        self.expanded.insert(id.clone());
        self.refresh_visibility();
        tracing::debug!(id = %id, ?outcome, "store.undo");
        self.commit();
        outcome
    }

    /// Replace a node's display name in place; structure is unchanged.
    ///
    /// Silent no-op when the id does not exist.
    pub fn update_node_name(&mut self, id: &str, name: impl Into<String>) {
        let Some(node) = walk::find_mut(&mut self.forest, id) else {
            return;
        };
        node.set_name(name);
        // Matching depends on names, so an active filter must be redone.
        self.refresh_visibility();
        self.commit();
    }

    // ========================================================================
    // Expansion, selection, editing, search
    // ========================================================================

    /// Toggle whether a node's children are displayed.
    pub fn toggle_node(&mut self, id: &str) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_string());
        }
        self.commit();
    }

    /// Mark a node expanded. Idempotent; harmless for leaves.
    pub fn expand_node(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
        self.commit();
    }

    /// Mark a node collapsed. Idempotent.
    pub fn collapse_node(&mut self, id: &str) {
        self.expanded.remove(id);
        self.commit();
    }

    /// Mark every id in the iterator expanded.
    pub fn expand_all(&mut self, ids: impl IntoIterator<Item = String>) {
        self.expanded.extend(ids);
        self.commit();
    }

    /// Overwrite the selection.
    pub fn set_selected(&mut self, id: Option<String>) {
        self.selected = id;
        self.commit();
    }

    /// Overwrite the inline-rename marker.
    pub fn set_editing(&mut self, id: Option<String>) {
        self.editing = id;
        self.commit();
    }

    /// Set the search query and recompute visibility.
    ///
    /// A trimmed-empty query clears filtering entirely. An active query
    /// also expands every id in the visibility set, so matches are
    /// reachable from their roots without manual expansion.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.visible = search::visible_ids(&self.forest, &query);
        if let Some(visible) = &self.visible {
            tracing::debug!(query = %query, visible = visible.len(), "store.search");
            self.expanded.extend(visible.iter().cloned());
        }
        self.search_query = query;
        self.commit();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Recompute the visibility set against the current forest if a search
    /// is active. Structural edits and renames both route through here.
    fn refresh_visibility(&mut self) {
        if !self.search_query.trim().is_empty() {
            self.visible = search::visible_ids(&self.forest, &self.search_query);
        }
    }

    /// Seal a mutation: bump the revision and snapshot to storage.
    fn commit(&mut self) {
        self.revision += 1;
        let Some(storage) = &self.storage else {
            return;
        };
        let snapshot = self.snapshot();
        if let Err(e) = save_snapshot(storage.as_ref(), &snapshot) {
            tracing::warn!(error = %e, backend = storage.name(), "snapshot save failed");
        }
    }

    /// The persisted slice of state. Expanded ids are sorted so the stored
    /// document is deterministic.
    fn snapshot(&self) -> TreeSnapshot {
        let mut expanded: Vec<String> = self.expanded.iter().cloned().collect();
        expanded.sort_unstable();
        TreeSnapshot {
            forest: self.forest.clone(),
            expanded,
            search_query: self.search_query.clone(),
        }
    }
}
