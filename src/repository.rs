//! Snapshot repository: persistence of snapshot records
//!
//! Snapshot records live as independent `{id}.json` files in a snapshots
//! directory, fully separate from the content store's internal format.
//! Saving a snapshot is the moment its embedded content is merged into the
//! shared store and its hashes gain a reference; until then a snapshot is a
//! pure in-memory value with no side effects.

use crate::error::{Result, SnapvaultError};
use crate::snapshot::Snapshot;
use crate::store::ContentStore;
use crate::utils::atomic_write;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Persists and retrieves snapshot records, keyed by snapshot id
#[derive(Debug)]
pub struct SnapshotRepository {
    store: ContentStore,
}

impl SnapshotRepository {
    /// Create a repository backed by the given content store
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }

    /// Persist a snapshot record and merge its content into the store
    ///
    /// Writes `{output_dir}/{id}.json` (creating `output_dir` if needed),
    /// inserts each embedded `{hash: content}` pair the store does not
    /// already hold (at most one writer per hash), and records one reference
    /// per distinct hash for later reclamation.
    ///
    /// Returns the path of the written record file.
    pub fn save(&self, snapshot: &Snapshot, output_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)?;

        let record_path = output_dir.join(format!("{}.json", snapshot.id));
        let json = serde_json::to_string_pretty(snapshot)?;
        atomic_write(&record_path, json.as_bytes())?;

        let mut map = self.store.load()?;
        let mut inserted = 0usize;
        for record in snapshot.files.values() {
            map.entry(record.hash.clone()).or_insert_with(|| {
                inserted += 1;
                record.content.clone()
            });
        }
        self.store.save(&map)?;
        self.store.add_references(&snapshot.referenced_hashes())?;

        info!(
            "saved snapshot {} to {:?} ({} new store entries)",
            snapshot.short_id(),
            record_path,
            inserted,
        );
        Ok(record_path)
    }

    /// Load a snapshot record by id
    ///
    /// Returns `Ok(None)` when no record file exists for the id, and also on
    /// malformed JSON (logged as a warning): a corrupt record reads as
    /// absent rather than failing the caller.
    pub fn load(&self, id: &str, dir: &Path) -> Result<Option<Snapshot>> {
        let path = dir.join(format!("{id}.json"));
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&path)?;
        match serde_json::from_str(&data) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!("malformed snapshot record {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    /// List all snapshots in a directory, ascending by timestamp
    ///
    /// Files without a `.json` extension are ignored; unreadable or invalid
    /// records are skipped with a warning rather than failing the listing.
    /// Records with unparsable timestamps deserialize as the epoch and thus
    /// sort first.
    pub fn list(&self, dir: &Path) -> Result<Vec<Snapshot>> {
        if !dir.is_dir() {
            return Err(SnapvaultError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let data = match fs::read_to_string(&path) {
                Ok(data) => data,
                Err(e) => {
                    warn!("skipping unreadable snapshot file {:?}: {}", path, e);
                    continue;
                }
            };
            match serde_json::from_str::<Snapshot>(&data) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!("skipping invalid snapshot file {:?}: {}", path, e),
            }
        }

        snapshots.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        debug!("listed {} snapshots in {:?}", snapshots.len(), dir);
        Ok(snapshots)
    }
}
