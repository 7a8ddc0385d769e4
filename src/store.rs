//! Shared content store: the hash-indexed substrate for deduplication
//!
//! The store is a persistent mapping from SHA-256 content hash to file
//! content, shared by every snapshot. On disk it is a single JSON object
//! (`{ "<hash>": "<utf8 content>" }`) at a fixed, process-relative path. It
//! is loaded fully into memory at the start of an operation and written back
//! whole at the end; writes replace the file atomically (last save wins).
//!
//! A sidecar file next to the store (`ref_counts.json`) tracks how many live
//! snapshots reference each hash. Content is physically removed only when
//! its count drops to zero, so pruning one snapshot cannot strip content
//! still referenced by a surviving one.
//!
//! There is no locking: the single-writer discipline is an external
//! invocation constraint. Two operations mutating the same store file
//! concurrently are a data race with last-writer-wins outcome.

use crate::error::Result;
use crate::utils::atomic_write;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Default location of the content store file, relative to the process
/// working directory.
pub const DEFAULT_STORE_PATH: &str = "storage/hash_map.json";

/// File name of the reference-count sidecar, placed next to the store file.
const REFS_FILE_NAME: &str = "ref_counts.json";

/// Persistent hash -> content mapping shared across all snapshots
///
/// `ContentStore` is a cheap handle (just the file path) injected into the
/// builder, repository, restorer and pruner; nothing holds the mapping in
/// memory between operations.
#[derive(Debug, Clone)]
pub struct ContentStore {
    path: PathBuf,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }
}

impl ContentStore {
    /// Create a store handle for the given store file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the persisted store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the reference-count sidecar file
    fn refs_path(&self) -> PathBuf {
        self.path.with_file_name(REFS_FILE_NAME)
    }

    /// Load the persisted store into memory
    ///
    /// Returns an empty mapping when the store file does not exist, is empty,
    /// or fails to parse. A parse failure is logged as a warning and never
    /// fatal: a corrupt store degrades to "everything is novel".
    ///
    /// # Errors
    ///
    /// - [`SnapvaultError::Io`](crate::error::SnapvaultError::Io) if the file
    ///   exists but cannot be read
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            trace!("store file {:?} does not exist, starting empty", self.path);
            return Ok(BTreeMap::new());
        }

        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&data) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!("failed to parse store file {:?}: {}", self.path, e);
                Ok(BTreeMap::new())
            }
        }
    }

    /// Serialize the full mapping and replace the persisted store
    pub fn save(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(map)?;
        atomic_write(&self.path, json.as_bytes())?;

        debug!("saved store with {} entries to {:?}", map.len(), self.path);
        Ok(())
    }

    /// Remove the given hashes from the persisted store
    ///
    /// Loads the store, deletes each key that is present (absence is not an
    /// error), and saves the result. Callers reclaiming snapshot content
    /// should go through [`ContentStore::release_references`] instead, which
    /// only removes hashes no live snapshot still references.
    pub fn remove(&self, hashes: &BTreeSet<String>) -> Result<()> {
        let mut map = self.load()?;
        let before = map.len();
        map.retain(|hash, _| !hashes.contains(hash));

        if map.len() != before {
            debug!("removed {} entries from store", before - map.len());
        }
        self.save(&map)
    }

    /// Record one additional snapshot reference for each given hash
    ///
    /// Called when a snapshot is persisted. Counts are per distinct hash, not
    /// per file path.
    pub fn add_references(&self, hashes: &BTreeSet<String>) -> Result<()> {
        let mut refs = self.load_refs()?;
        for hash in hashes {
            *refs.entry(hash.clone()).or_insert(0) += 1;
        }
        self.save_refs(&refs)
    }

    /// Release one snapshot reference for each given hash
    ///
    /// Hashes whose count reaches zero are removed from both the sidecar and
    /// the content store itself; the rest only have their count decremented.
    /// A hash with no recorded count is treated as having a single reference,
    /// so stores written before reference tracking existed still reclaim.
    /// Returns the hashes that were physically removed.
    pub fn release_references(&self, hashes: &BTreeSet<String>) -> Result<Vec<String>> {
        let mut refs = self.load_refs()?;
        let mut removed = BTreeSet::new();

        for hash in hashes {
            let count = refs.remove(hash).unwrap_or(1);
            if count > 1 {
                refs.insert(hash.clone(), count - 1);
            } else {
                removed.insert(hash.clone());
            }
        }

        self.save_refs(&refs)?;

        if !removed.is_empty() {
            self.remove(&removed)?;
        }
        Ok(removed.into_iter().collect())
    }

    /// Load the reference-count sidecar, tolerating a missing or corrupt file
    fn load_refs(&self) -> Result<BTreeMap<String, u64>> {
        let path = self.refs_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let data = fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&data) {
            Ok(refs) => Ok(refs),
            Err(e) => {
                warn!("failed to parse reference counts {:?}: {}", path, e);
                Ok(BTreeMap::new())
            }
        }
    }

    /// Persist the reference-count sidecar
    fn save_refs(&self, refs: &BTreeMap<String, u64>) -> Result<()> {
        let path = self.refs_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(refs)?;
        atomic_write(&path, json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (ContentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ContentStore::new(temp_dir.path().join("hash_map.json"));
        (store, temp_dir)
    }

    fn set_of(hashes: &[&str]) -> BTreeSet<String> {
        hashes.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_load_missing_store_is_empty() {
        let (store, _temp_dir) = temp_store();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_corrupt_store_is_empty() {
        let (store, _temp_dir) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json at all").unwrap();

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_empty_file_is_empty() {
        let (store, _temp_dir) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "  \n").unwrap();

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (store, _temp_dir) = temp_store();

        let mut map = BTreeMap::new();
        map.insert("hash1".to_string(), "content one".to_string());
        map.insert("hash2".to_string(), "content two".to_string());
        store.save(&map).unwrap();

        assert_eq!(store.load().unwrap(), map);
    }

    #[test]
    fn test_remove_tolerates_absent_hashes() {
        let (store, _temp_dir) = temp_store();

        let mut map = BTreeMap::new();
        map.insert("keep".to_string(), "a".to_string());
        map.insert("drop".to_string(), "b".to_string());
        store.save(&map).unwrap();

        store.remove(&set_of(&["drop", "never-existed"])).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("keep"));
    }

    #[test]
    fn test_release_removes_at_zero_only() {
        let (store, _temp_dir) = temp_store();

        let mut map = BTreeMap::new();
        map.insert("shared".to_string(), "s".to_string());
        map.insert("exclusive".to_string(), "e".to_string());
        store.save(&map).unwrap();

        // "shared" referenced by two snapshots, "exclusive" by one
        store.add_references(&set_of(&["shared", "exclusive"])).unwrap();
        store.add_references(&set_of(&["shared"])).unwrap();

        let removed = store.release_references(&set_of(&["shared", "exclusive"])).unwrap();
        assert_eq!(removed, vec!["exclusive".to_string()]);

        let loaded = store.load().unwrap();
        assert!(loaded.contains_key("shared"));
        assert!(!loaded.contains_key("exclusive"));

        // final reference released: now the shared hash goes too
        let removed = store.release_references(&set_of(&["shared"])).unwrap();
        assert_eq!(removed, vec!["shared".to_string()]);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_release_without_recorded_count_removes() {
        let (store, _temp_dir) = temp_store();

        let mut map = BTreeMap::new();
        map.insert("legacy".to_string(), "l".to_string());
        store.save(&map).unwrap();

        let removed = store.release_references(&set_of(&["legacy"])).unwrap();
        assert_eq!(removed, vec!["legacy".to_string()]);
        assert!(store.load().unwrap().is_empty());
    }
}
