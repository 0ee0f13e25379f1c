#![forbid(unsafe_code)]

//! Best-effort snapshot persistence for the tree editor.
//!
//! The engine serializes its forest, expansion set, and search query into a
//! [`TreeSnapshot`] after every mutation and hands it to a
//! [`StorageBackend`] under the fixed key [`STORAGE_KEY`]. This is a local,
//! single-session convenience, not a durability contract: a failed write is
//! logged and the session continues on in-memory state.
//!
//! # Design Invariants
//!
//! 1. **Graceful degradation**: storage failures never panic; operations
//!    return `Result` and loaders treat corrupt data as first-run.
//! 2. **Atomic writes**: file storage uses a write-then-rename pattern so a
//!    crash mid-save never leaves a half-written snapshot behind.
//! 3. **Search is never restored**: the snapshot carries the query string
//!    for fidelity with the stored layout, but loaders always restart with
//!    no active search (the engine enforces this, see `vtree-store`).
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Io` | File I/O failure | Returned to caller, logged |
//! | `StorageError::Serialization` | JSON encode/decode | Load yields `None` |
//! | `StorageError::Corruption` | Lock poisoned | Returned to caller |
//! | Version mismatch | Format upgraded | Load yields `None`, logged |

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use vtree_core::Forest;

/// Fixed storage key for the tree editor's snapshot slot.
pub const STORAGE_KEY: &str = "vessel-tree-storage";

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during snapshot storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    Serialization(String),
    /// Backend state is unusable (e.g. a poisoned lock).
    Corruption(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serialization(_) | StorageError::Corruption(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot Wire Format
// ─────────────────────────────────────────────────────────────────────────────

/// The persisted slice of engine state.
///
/// The expansion set is serialized as an ordered id list and rehydrated
/// into a set on load. Selection, editing marker, visibility set, and the
/// undo stack are deliberately not persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// The full forest, roots in display order.
    pub forest: Forest,
    /// Ids of expanded nodes, in iteration order at save time.
    pub expanded: Vec<String>,
    /// The search query at save time. Never restored into an active filter.
    pub search_query: String,
}

/// On-disk envelope around [`TreeSnapshot`] (JSON).
#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    /// Format version for future migrations.
    format_version: u32,
    snapshot: TreeSnapshot,
}

impl SnapshotFile {
    const FORMAT_VERSION: u32 = 1;
}

/// Encode a snapshot to bytes and save it under [`STORAGE_KEY`].
pub fn save_snapshot(backend: &dyn StorageBackend, snapshot: &TreeSnapshot) -> StorageResult<()> {
    let file = SnapshotFile {
        format_version: SnapshotFile::FORMAT_VERSION,
        snapshot: snapshot.clone(),
    };
    let bytes = serde_json::to_vec(&file)
        .map_err(|e| StorageError::Serialization(format!("failed to serialize snapshot: {e}")))?;
    backend.save(STORAGE_KEY, &bytes)
}

/// Load the snapshot stored under [`STORAGE_KEY`], if any.
///
/// A missing slot, a format-version mismatch, or an unparsable document all
/// yield `Ok(None)` (first-run behavior); only backend failures are errors.
pub fn load_snapshot(backend: &dyn StorageBackend) -> StorageResult<Option<TreeSnapshot>> {
    let Some(bytes) = backend.load(STORAGE_KEY)? else {
        return Ok(None);
    };

    let file: SnapshotFile = match serde_json::from_slice(&bytes) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(error = %e, "stored snapshot unreadable, starting fresh");
            return Ok(None);
        }
    };

    if file.format_version != SnapshotFile::FORMAT_VERSION {
        tracing::warn!(
            stored = file.format_version,
            expected = SnapshotFile::FORMAT_VERSION,
            "snapshot format version mismatch, ignoring stored state"
        );
        return Ok(None);
    }

    Ok(Some(file.snapshot))
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for pluggable snapshot storage backends.
///
/// Implementations must be thread-safe (`Send + Sync`). Stored bytes are an
/// opaque document per key; `save` replaces the slot wholesale.
pub trait StorageBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Load the bytes stored under `key`, or `None` if the slot is empty.
    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Replace the slot under `key` with `bytes`, atomically.
    fn save(&self, key: &str, bytes: &[u8]) -> StorageResult<()>;

    /// Remove the slot under `key`, if present.
    fn clear(&self, key: &str) -> StorageResult<()>;

    /// Check if the backend is available and functional.
    fn is_available(&self) -> bool {
        true
    }
}

/// Shared backends delegate, so an `Arc<MemoryStorage>` can be handed to
/// the engine while the owner keeps a handle for inspection.
impl<S: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        (**self).save(key, bytes)
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        (**self).clear(key)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Storage (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory storage backend for testing and ephemeral sessions.
///
/// State is lost when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let guard = self
            .slots
            .read()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        Ok(guard.get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        let mut guard = self
            .slots
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        guard.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        let mut guard = self
            .slots
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        guard.remove(key);
        Ok(())
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.slots.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryStorage").field("slots", &count).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Storage
// ─────────────────────────────────────────────────────────────────────────────

/// File-based storage backend using one JSON file per key.
///
/// Each key maps to `{dir}/{key}.json`. Writes use a temporary file plus
/// rename so a crash mid-save cannot corrupt the previous snapshot:
///
/// 1. Write to `{key}.json.tmp`
/// 2. Flush and sync
/// 3. Rename `{key}.json.tmp` → `{key}.json`
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at the given directory.
    ///
    /// The directory does not need to exist; it is created on first save.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Create storage at the default location for the application.
    ///
    /// Uses `$XDG_STATE_HOME/{app_name}` on Linux, `~/.local/state/{app_name}`
    /// as a fallback, or the current directory as a last resort.
    #[must_use]
    pub fn default_for_app(app_name: &str) -> Self {
        Self {
            dir: state_dir_or_fallback().join(app_name),
        }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json.tmp"))
    }
}

/// Get the state directory, falling back to the current dir if unavailable.
fn state_dir_or_fallback() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("state");
    }
    PathBuf::from(".")
}

impl StorageBackend for FileStorage {
    fn name(&self) -> &str {
        "FileStorage"
    }

    fn load(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut bytes)?;
        Ok(Some(bytes))
    }

    fn save(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;

        let tmp_path = self.temp_path(key);
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(bytes)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, self.slot_path(key))?;

        tracing::debug!(dir = %self.dir.display(), key, len = bytes.len(), "saved snapshot");
        Ok(())
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        let path = self.slot_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        if !self.dir.exists() && fs::create_dir_all(&self.dir).is_err() {
            return false;
        }
        let probe = self.dir.join(".vtree_test_write");
        if fs::write(&probe, b"test").is_ok() {
            let _ = fs::remove_file(&probe);
            return true;
        }
        false
    }
}

impl fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStorage").field("dir", &self.dir).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use vtree_core::{NodeKind, TreeNode, seed_forest};

    fn sample_snapshot() -> TreeSnapshot {
        TreeSnapshot {
            forest: seed_forest(),
            expanded: vec!["root-1".to_string(), "cat-1".to_string()],
            search_query: "engine".to_string(),
        }
    }

    #[test]
    fn memory_storage_basic_operations() {
        let storage = MemoryStorage::new();
        assert!(storage.load("k").unwrap().is_none());

        storage.save("k", b"hello").unwrap();
        assert_eq!(storage.load("k").unwrap().unwrap(), b"hello");

        storage.save("k", b"world").unwrap();
        assert_eq!(storage.load("k").unwrap().unwrap(), b"world");

        storage.clear("k").unwrap();
        assert!(storage.load("k").unwrap().is_none());
    }

    #[test]
    fn snapshot_round_trip_through_memory() {
        let storage = MemoryStorage::new();
        let snapshot = sample_snapshot();

        save_snapshot(&storage, &snapshot).unwrap();
        let loaded = load_snapshot(&storage).unwrap().unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn load_empty_slot_is_first_run() {
        let storage = MemoryStorage::new();
        assert!(load_snapshot(&storage).unwrap().is_none());
    }

    #[test]
    fn unreadable_snapshot_is_first_run() {
        let storage = MemoryStorage::new();
        storage.save(STORAGE_KEY, b"not json at all").unwrap();
        assert!(load_snapshot(&storage).unwrap().is_none());
    }

    #[test]
    fn version_mismatch_is_first_run() {
        let storage = MemoryStorage::new();
        let doc = format!(
            r#"{{"format_version":99,"snapshot":{}}}"#,
            serde_json::to_string(&TreeSnapshot::default()).unwrap()
        );
        storage.save(STORAGE_KEY, doc.as_bytes()).unwrap();
        assert!(load_snapshot(&storage).unwrap().is_none());
    }

    #[test]
    fn unknown_taxonomy_tag_degrades_to_first_run() {
        let storage = MemoryStorage::new();
        let doc = r#"{"format_version":1,"snapshot":{"forest":[{"id":"x","name":"X","type":"SUBSYSTEM","children":[]}],"expanded":[],"search_query":""}}"#;
        storage.save(STORAGE_KEY, doc.as_bytes()).unwrap();
        assert!(load_snapshot(&storage).unwrap().is_none());
    }

    #[test]
    fn snapshot_wire_format_is_stable() {
        let snapshot = TreeSnapshot {
            forest: vec![TreeNode::new("n", "Pump", NodeKind::Component)],
            expanded: vec!["n".to_string()],
            search_query: String::new(),
        };
        let file = SnapshotFile {
            format_version: SnapshotFile::FORMAT_VERSION,
            snapshot,
        };
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("\"format_version\":1"));
        assert!(json.contains("\"type\":\"COMPONENT\""));
        assert!(json.contains("\"expanded\":[\"n\"]"));
    }
}
