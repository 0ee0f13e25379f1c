//! Search visibility computation.
//!
//! Given the full forest and a free-text query, compute the set of node
//! ids that should remain visible: every node whose name contains the
//! query (case-insensitive substring), plus every ancestor on each match's
//! root path so matches stay reachable from their roots.
//!
//! The computation is O(matches × depth) on top of one full walk and is
//! recomputed from scratch after every structural or rename mutation while
//! a query is active. Forests here are user-curated hierarchies in the
//! hundreds of nodes, and recomputation is user-paced, so no incremental
//! index is kept.

use ahash::AHashSet;
use vtree_core::TreeNode;

use crate::walk;

/// Compute the visibility set for a query.
///
/// A trimmed-empty query means "no filter": `None`, render everything.
/// Otherwise the query matches verbatim, surrounding whitespace included,
/// so `" deck "` only matches names containing `" deck "`.
#[must_use]
pub fn visible_ids(forest: &[TreeNode], query: &str) -> Option<AHashSet<String>> {
    if query.trim().is_empty() {
        return None;
    }
    let needle = query.to_lowercase();

    let mut matches = Vec::new();
    walk::visit(forest, &mut |node| {
        if node.name().to_lowercase().contains(&needle) {
            matches.push(node.id().to_string());
        }
    });

    let mut visible = AHashSet::new();
    for id in matches {
        // The root path includes the match itself.
        if let Some(path) = walk::path_to(forest, &id) {
            visible.extend(path);
        }
    }
    Some(visible)
}
