//! Snapshot records and snapshot creation
//!
//! A snapshot is an immutable, timestamped record of a directory's state at
//! capture time. It embeds path -> {hash, content} entries only for content
//! that was *novel* when the snapshot was taken; everything else is already
//! present in the shared [`ContentStore`](crate::store::ContentStore) and is
//! deduplicated away. Restoring therefore always resolves content through
//! the store, never through a snapshot alone.
//!
//! [`SnapshotBuilder`] performs the capture: it walks the target directory,
//! hashes every regular file (reads and hashing run in parallel), and decides
//! novelty against the store loaded once at the start of the call. Novelty
//! decisions are applied in sorted-path order so the outcome is deterministic
//! regardless of traversal interleaving.

use crate::error::{Result, SnapvaultError};
use crate::store::ContentStore;
use crate::utils::hash_data;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Canonical timestamp format used in persisted snapshot records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Content captured for a single file that was novel at snapshot time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// SHA-256 hash of the file content
    pub hash: String,
    /// Raw file content as UTF-8 text
    pub content: String,
}

/// An immutable point-in-time record of a directory's novel content
///
/// Persisted verbatim as `{id}.json` by the repository and never mutated
/// after creation; destroyed only by the pruner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Creation timestamp, serialized as `yyyy-MM-dd HH:mm:ss`
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Relative path -> captured record, novel-at-capture entries only
    pub files: BTreeMap<String, FileRecord>,
    /// Bytes of newly stored unique content
    #[serde(rename = "snapshotSize")]
    pub snapshot_size: u64,
    /// Bytes of all regular files scanned, duplicates included
    #[serde(rename = "directorySize")]
    pub directory_size: u64,
}

impl Snapshot {
    /// First eight characters of the id, for log and console output
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    /// The distinct content hashes this snapshot references
    pub fn referenced_hashes(&self) -> BTreeSet<String> {
        self.files.values().map(|record| record.hash.clone()).collect()
    }
}

/// Serde adapter for the canonical `yyyy-MM-dd HH:mm:ss` timestamp format
///
/// Deserialization is deliberately tolerant: an unparsable timestamp falls
/// back to the Unix epoch so that listing stays resilient and such records
/// sort earliest.
mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT) {
            Ok(naive) => Ok(Utc.from_utc_datetime(&naive)),
            Err(e) => {
                warn!("unparsable snapshot timestamp {:?}: {}, treating as epoch", raw, e);
                Ok(DateTime::<Utc>::UNIX_EPOCH)
            }
        }
    }
}

/// A regular file read from disk during traversal
struct ScannedFile {
    /// Path relative to the captured directory root
    path: String,
    size: u64,
    hash: String,
    /// `None` when the bytes are not valid UTF-8 (store format is text)
    content: Option<String>,
}

/// Captures snapshots of a directory tree against a shared content store
#[derive(Debug)]
pub struct SnapshotBuilder {
    store: ContentStore,
}

impl SnapshotBuilder {
    /// Create a builder deduplicating against the given store
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }

    /// Capture a snapshot of `target_dir`
    ///
    /// Returns `Ok(None)` when no novel content was found; in that case
    /// nothing was constructed and nothing will be persisted. Any traversal
    /// or read error aborts the whole operation without side effects.
    ///
    /// The returned snapshot is not yet persisted: pass it to
    /// [`SnapshotRepository::save`](crate::repository::SnapshotRepository::save).
    ///
    /// # Arguments
    ///
    /// * `target_dir` - Directory tree to capture
    ///
    /// # Errors
    ///
    /// - [`SnapvaultError::DirectoryNotFound`] if `target_dir` is not a directory
    /// - [`SnapvaultError::Walk`] / [`SnapvaultError::Io`] on traversal or read
    ///   failures (the operation aborts whole, no partial snapshot)
    /// - [`SnapvaultError::PathConversion`] for paths that are not valid UTF-8
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use snapvault::{ContentStore, SnapshotBuilder};
    /// use std::path::Path;
    ///
    /// # fn main() -> snapvault::Result<()> {
    /// let builder = SnapshotBuilder::new(ContentStore::default());
    /// match builder.create(Path::new("./project"))? {
    ///     Some(snapshot) => println!("captured {} novel files", snapshot.files.len()),
    ///     None => println!("no changes detected"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn create(&self, target_dir: &Path) -> Result<Option<Snapshot>> {
        if !target_dir.is_dir() {
            return Err(SnapvaultError::DirectoryNotFound(target_dir.to_path_buf()));
        }

        let known = self.store.load()?;

        // Collect every regular file first; directories are recursed into but
        // never recorded, symlinks are neither followed nor recorded.
        let mut paths = Vec::new();
        for entry in WalkDir::new(target_dir).follow_links(false) {
            let entry = entry?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        debug!("scanning {} files under {:?}", paths.len(), target_dir);

        let scanned: Vec<ScannedFile> = paths
            .par_iter()
            .map(|path| scan_file(path, target_dir))
            .collect::<Result<_>>()?;

        let mut files = BTreeMap::new();
        let mut captured = BTreeSet::new();
        let mut directory_size = 0u64;
        let mut snapshot_size = 0u64;

        for file in scanned {
            directory_size += file.size;

            if known.contains_key(&file.hash) || captured.contains(&file.hash) {
                trace!("deduplicated {}", file.path);
                continue;
            }

            match file.content {
                Some(content) => {
                    snapshot_size += file.size;
                    captured.insert(file.hash.clone());
                    files.insert(file.path, FileRecord { hash: file.hash, content });
                }
                None => {
                    warn!("skipping non-UTF-8 file {}", file.path);
                }
            }
        }

        if files.is_empty() {
            info!("no changes detected under {:?}, no snapshot created", target_dir);
            return Ok(None);
        }

        let snapshot = Snapshot {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            files,
            snapshot_size,
            directory_size,
        };

        info!(
            "captured snapshot {} ({} novel files, {} of {} bytes)",
            snapshot.short_id(),
            snapshot.files.len(),
            snapshot.snapshot_size,
            snapshot.directory_size,
        );
        Ok(Some(snapshot))
    }
}

/// Read and hash one file, recording its path relative to the capture root
fn scan_file(path: &Path, root: &Path) -> Result<ScannedFile> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| SnapvaultError::internal(format!("{:?} is not under {:?}", path, root)))?;
    let relative = relative
        .to_str()
        .ok_or_else(|| SnapvaultError::PathConversion(relative.as_os_str().to_os_string()))?
        .to_string();

    let bytes = fs::read(path)?;
    let size = bytes.len() as u64;
    let hash = hash_data(&bytes);
    let content = String::from_utf8(bytes).ok();

    Ok(ScannedFile { path: relative, size, hash, content })
}
