//! Snapshot restoration
//!
//! Reconstructs a snapshot's directory tree under an output location. Byte
//! content is always resolved by hash lookup against the shared content
//! store; the `content` field embedded in the record is not authoritative
//! for deduplicated history. A hash missing from the store skips that file
//! with a warning and the restore continues (partial restore, not fatal).
//!
//! Restore policy: overwrite only when the on-disk file is absent or its
//! current content hash differs from the recorded hash. Restoring onto an
//! output tree that already matches the snapshot touches nothing; restoring
//! into an empty directory writes everything.

use crate::error::{Result, SnapvaultError};
use crate::repository::SnapshotRepository;
use crate::store::ContentStore;
use crate::utils::hash_file_content;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of a restore operation
#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// Id of the restored snapshot
    pub snapshot_id: String,
    /// Files written (absent on disk, or content drifted from the record)
    pub files_restored: usize,
    /// Files left untouched because their on-disk hash already matched
    pub files_unchanged: usize,
    /// Files skipped because their hash was missing from the content store
    pub files_skipped: usize,
}

/// Reconstructs directory trees from snapshot records and the content store
#[derive(Debug)]
pub struct Restorer {
    store: ContentStore,
}

impl Restorer {
    /// Create a restorer resolving content through the given store
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }

    /// Restore snapshot `id` from `snapshots_dir` into `output_dir`
    ///
    /// Fails with [`SnapvaultError::SnapshotNotFound`] when no record exists
    /// for the id. Intermediate directories are created as needed.
    ///
    /// # Arguments
    ///
    /// * `id` - Snapshot identifier (the record file stem)
    /// * `snapshots_dir` - Directory holding snapshot records
    /// * `output_dir` - Root under which the tree is reconstructed
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use snapvault::{ContentStore, Restorer};
    /// use std::path::Path;
    ///
    /// # fn main() -> snapvault::Result<()> {
    /// let restorer = Restorer::new(ContentStore::default());
    /// let report = restorer.restore("some-id", Path::new("./snapshots"), Path::new("./out"))?;
    /// println!("{} files restored, {} skipped", report.files_restored, report.files_skipped);
    /// # Ok(())
    /// # }
    /// ```
    pub fn restore(&self, id: &str, snapshots_dir: &Path, output_dir: &Path) -> Result<RestoreReport> {
        let repository = SnapshotRepository::new(self.store.clone());
        let snapshot = repository
            .load(id, snapshots_dir)?
            .ok_or_else(|| SnapvaultError::SnapshotNotFound(id.to_string()))?;

        let map = self.store.load()?;
        fs::create_dir_all(output_dir)?;

        let mut report = RestoreReport {
            snapshot_id: snapshot.id.clone(),
            files_restored: 0,
            files_unchanged: 0,
            files_skipped: 0,
        };

        for (path, record) in &snapshot.files {
            let Some(content) = map.get(&record.hash) else {
                warn!(
                    "content for hash {} not found in store, skipping {}",
                    record.hash, path
                );
                report.files_skipped += 1;
                continue;
            };

            let target = output_dir.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            if target.is_file() && hash_file_content(&target)? == record.hash {
                debug!("{} already matches, leaving untouched", path);
                report.files_unchanged += 1;
                continue;
            }

            fs::write(&target, content.as_bytes())?;
            debug!("restored {}", path);
            report.files_restored += 1;
        }

        info!(
            "restored snapshot {} into {:?} ({} written, {} unchanged, {} skipped)",
            snapshot.short_id(),
            output_dir,
            report.files_restored,
            report.files_unchanged,
            report.files_skipped,
        );
        Ok(report)
    }
}
