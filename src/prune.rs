//! Snapshot pruning and content reclamation
//!
//! Pruning deletes a snapshot's record file and releases its references in
//! the content store. Content is physically removed only for hashes no
//! surviving snapshot references (reference counts are maintained by
//! [`SnapshotRepository::save`](crate::repository::SnapshotRepository::save)),
//! so a hash shared with a live snapshot survives the prune.

use crate::error::{Result, SnapvaultError};
use crate::repository::SnapshotRepository;
use crate::store::ContentStore;
use std::fs;
use std::path::Path;
use tracing::info;

/// Outcome of a prune operation
#[derive(Debug, Clone)]
pub struct PruneReport {
    /// Id of the pruned snapshot
    pub snapshot_id: String,
    /// Distinct hashes the snapshot referenced
    pub hashes_released: usize,
    /// Hashes whose content was physically removed from the store
    pub hashes_removed: usize,
}

/// Deletes snapshots and reclaims content no longer referenced
#[derive(Debug)]
pub struct Pruner {
    store: ContentStore,
}

impl Pruner {
    /// Create a pruner reclaiming content from the given store
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }

    /// Delete snapshot `id` from `snapshots_dir` and reclaim its content
    ///
    /// Fails with [`SnapvaultError::SnapshotNotFound`] when no record exists
    /// for the id; in that case nothing is mutated. Otherwise the record
    /// file is deleted first, then the snapshot's references are released.
    pub fn prune(&self, snapshots_dir: &Path, id: &str) -> Result<PruneReport> {
        let repository = SnapshotRepository::new(self.store.clone());
        let snapshot = repository
            .load(id, snapshots_dir)?
            .ok_or_else(|| SnapvaultError::SnapshotNotFound(id.to_string()))?;

        let hashes = snapshot.referenced_hashes();

        let record_path = snapshots_dir.join(format!("{}.json", snapshot.id));
        fs::remove_file(&record_path)?;

        let removed = self.store.release_references(&hashes)?;

        info!(
            "pruned snapshot {} ({} hashes released, {} removed from store)",
            snapshot.short_id(),
            hashes.len(),
            removed.len(),
        );
        Ok(PruneReport {
            snapshot_id: snapshot.id,
            hashes_released: hashes.len(),
            hashes_removed: removed.len(),
        })
    }
}
