#![forbid(unsafe_code)]

//! Tree state engine for the vessel equipment editor.
//!
//! [`TreeStore`] owns one forest of typed nodes plus the derived indexes
//! the editor UI reads: the expansion set, the search visibility set, the
//! selection, the inline-edit marker, and a bounded undo stack of deleted
//! subtrees. Every mutating call applies atomically: either the forest and
//! all derived indexes move together to a new consistent state, or (for
//! missing-id cases) nothing observable changes at all.
//!
//! The engine is single-writer by contract. It holds no locks and spawns
//! nothing; callers serialize access the way a UI event loop naturally
//! does. Presentation layers are pure consumers: they read the snapshot
//! getters and invoke the mutation API, and own no tree logic themselves.

pub mod search;
pub mod store;
pub mod undo;
pub mod walk;

pub use store::TreeStore;
pub use undo::{DeletionRecord, MAX_UNDO_DEPTH, UndoOutcome, UndoStack};
