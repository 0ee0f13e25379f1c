#![forbid(unsafe_code)]

//! Data model for the vessel equipment tree.
//!
//! A forest of [`TreeNode`]s classified by the fixed four-level
//! [`NodeKind`] taxonomy (equipment type → equipment → assembly →
//! component). Nodes own their children outright; the forest is a pure
//! tree, never a graph, so recursive consumers need no cycle detection.
//!
//! The serialized shape of [`TreeNode`] and [`NodeKind`] is a wire format:
//! persisted snapshots depend on the field names and the four
//! `SCREAMING_SNAKE_CASE` taxonomy tags staying stable.

pub mod node;
pub mod seed;

pub use node::{Forest, NodeKind, TreeNode};
pub use seed::seed_forest;
