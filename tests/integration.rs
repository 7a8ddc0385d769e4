//! Integration tests for snapvault
//!
//! End-to-end workflows over real temporary directories: capture, persist,
//! restore and prune, exercising deduplication and reclamation across
//! multiple snapshots sharing one content store.

use chrono::{NaiveDateTime, TimeZone, Utc};
use snapvault::{
    ContentStore, Pruner, Restorer, Snapshot, SnapshotBuilder, SnapshotRepository,
    TIMESTAMP_FORMAT,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Shared fixture: a target tree, a snapshots directory and a content store
/// all living under one temporary directory.
struct Vault {
    _temp_dir: TempDir,
    store: ContentStore,
    target: PathBuf,
    snapshots: PathBuf,
    output: PathBuf,
}

impl Vault {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = ContentStore::new(temp_dir.path().join("storage").join("hash_map.json"));
        let target = temp_dir.path().join("target");
        let snapshots = temp_dir.path().join("snapshots");
        let output = temp_dir.path().join("output");
        fs::create_dir_all(&target).unwrap();
        Self { _temp_dir: temp_dir, store, target, snapshots, output }
    }

    fn builder(&self) -> SnapshotBuilder {
        SnapshotBuilder::new(self.store.clone())
    }

    fn repository(&self) -> SnapshotRepository {
        SnapshotRepository::new(self.store.clone())
    }

    /// Capture the target directory and persist the resulting snapshot
    fn capture(&self) -> Option<Snapshot> {
        let snapshot = self.builder().create(&self.target).unwrap()?;
        self.repository().save(&snapshot, &self.snapshots).unwrap();
        Some(snapshot)
    }
}

#[test]
fn test_snapshot_restore_round_trip() {
    let vault = Vault::new();
    fs::create_dir_all(vault.target.join("src/nested")).unwrap();
    fs::write(vault.target.join("README.md"), "# My Project").unwrap();
    fs::write(vault.target.join("src/main.rs"), "fn main() {}").unwrap();
    fs::write(vault.target.join("src/nested/deep.txt"), "deep content").unwrap();

    let snapshot = vault.capture().unwrap();

    let report = Restorer::new(vault.store.clone())
        .restore(&snapshot.id, &vault.snapshots, &vault.output)
        .unwrap();
    assert_eq!(report.files_restored, 3);
    assert_eq!(report.files_skipped, 0);

    for rel in ["README.md", "src/main.rs", "src/nested/deep.txt"] {
        let original = fs::read(vault.target.join(rel)).unwrap();
        let restored = fs::read(vault.output.join(rel)).unwrap();
        assert_eq!(original, restored, "restored bytes differ for {rel}");
    }
}

#[test]
fn test_snapshot_idempotent_when_unchanged() {
    let vault = Vault::new();
    fs::write(vault.target.join("stable.txt"), "unchanging").unwrap();

    assert!(vault.capture().is_some());
    let store_bytes = fs::read(vault.store.path()).unwrap();

    // Unchanged directory: no snapshot, no store mutation
    assert!(vault.capture().is_none());
    assert_eq!(fs::read(vault.store.path()).unwrap(), store_bytes);
    assert_eq!(fs::read_dir(&vault.snapshots).unwrap().count(), 1);
}

#[test]
fn test_duplicate_content_stored_once() {
    let vault = Vault::new();
    fs::create_dir_all(vault.target.join("copies")).unwrap();
    fs::write(vault.target.join("original.txt"), "duplicated payload").unwrap();
    fs::write(vault.target.join("copies/clone.txt"), "duplicated payload").unwrap();

    let snapshot = vault.capture().unwrap();

    // one store entry, snapshot size counted once, directory size counts both
    assert_eq!(vault.store.load().unwrap().len(), 1);
    assert_eq!(snapshot.snapshot_size, "duplicated payload".len() as u64);
    assert_eq!(snapshot.directory_size, 2 * "duplicated payload".len() as u64);
}

#[test]
fn test_incremental_snapshot_captures_only_new_content() {
    let vault = Vault::new();
    fs::write(vault.target.join("a.txt"), "first").unwrap();
    let first = vault.capture().unwrap();

    fs::write(vault.target.join("b.txt"), "second").unwrap();
    let second = vault.capture().unwrap();

    assert_eq!(first.files.len(), 1);
    assert_eq!(second.files.len(), 1);
    assert!(second.files.contains_key("b.txt"));
    // directory size still accounts for the whole tree
    assert_eq!(second.directory_size, ("first".len() + "second".len()) as u64);
    assert_eq!(second.snapshot_size, "second".len() as u64);
    assert_eq!(vault.store.load().unwrap().len(), 2);
}

#[test]
fn test_prune_lifecycle_reclaims_exclusive_content() {
    let vault = Vault::new();
    fs::write(vault.target.join("a.txt"), "kept by nobody").unwrap();
    let first = vault.capture().unwrap();

    fs::write(vault.target.join("b.txt"), "still alive").unwrap();
    let second = vault.capture().unwrap();

    let pruner = Pruner::new(vault.store.clone());
    let report = pruner.prune(&vault.snapshots, &first.id).unwrap();
    assert_eq!(report.hashes_removed, 1);

    // first snapshot gone, its exclusive hash reclaimed
    let repo = vault.repository();
    assert!(repo.load(&first.id, &vault.snapshots).unwrap().is_none());
    let map = vault.store.load().unwrap();
    assert_eq!(map.len(), 1);
    assert!(!map.contains_key(&first.files["a.txt"].hash));

    // the surviving snapshot still restores its own content
    let restore = Restorer::new(vault.store.clone())
        .restore(&second.id, &vault.snapshots, &vault.output)
        .unwrap();
    assert_eq!(restore.files_restored, 1);
    assert_eq!(
        fs::read_to_string(vault.output.join("b.txt")).unwrap(),
        "still alive"
    );

    // pruning the survivor empties the store
    pruner.prune(&vault.snapshots, &second.id).unwrap();
    assert!(vault.store.load().unwrap().is_empty());
}

#[test]
fn test_prune_unknown_id_mutates_nothing() {
    let vault = Vault::new();
    fs::write(vault.target.join("a.txt"), "content").unwrap();
    vault.capture().unwrap();
    let store_bytes = fs::read(vault.store.path()).unwrap();

    let err = Pruner::new(vault.store.clone())
        .prune(&vault.snapshots, "no-such-snapshot")
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(fs::read(vault.store.path()).unwrap(), store_bytes);
    assert_eq!(fs::read_dir(&vault.snapshots).unwrap().count(), 1);
}

#[test]
fn test_partial_restore_survives_missing_content() {
    let vault = Vault::new();
    fs::write(vault.target.join("safe.txt"), "resolvable").unwrap();
    fs::write(vault.target.join("gone.txt"), "unresolvable").unwrap();
    let snapshot = vault.capture().unwrap();

    // simulate an integrity gap: strip one hash from the store
    let gone_hash = snapshot.files["gone.txt"].hash.clone();
    vault
        .store
        .remove(&std::iter::once(gone_hash).collect())
        .unwrap();

    let report = Restorer::new(vault.store.clone())
        .restore(&snapshot.id, &vault.snapshots, &vault.output)
        .unwrap();

    assert_eq!(report.files_restored, 1);
    assert_eq!(report.files_skipped, 1);
    assert!(vault.output.join("safe.txt").exists());
    assert!(!vault.output.join("gone.txt").exists());
}

#[test]
fn test_list_orders_snapshots_by_timestamp() {
    let vault = Vault::new();
    let repo = vault.repository();

    let at = |raw: &str| {
        Utc.from_utc_datetime(&NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap())
    };
    let snapshot = |id: &str, ts| Snapshot {
        id: id.to_string(),
        timestamp: ts,
        files: BTreeMap::new(),
        snapshot_size: 0,
        directory_size: 0,
    };

    // saved out of chronological order
    repo.save(&snapshot("late", at("2025-06-01 10:00:00")), &vault.snapshots)
        .unwrap();
    repo.save(&snapshot("early", at("2024-02-15 09:30:00")), &vault.snapshots)
        .unwrap();
    repo.save(&snapshot("middle", at("2024-12-31 23:59:59")), &vault.snapshots)
        .unwrap();

    // plus a record with an unparsable timestamp, which sorts as epoch
    fs::write(
        vault.snapshots.join("broken-clock.json"),
        r#"{"id":"broken-clock","timestamp":"whenever","files":{},"snapshotSize":0,"directorySize":0}"#,
    )
    .unwrap();

    let ids: Vec<String> = repo
        .list(&vault.snapshots)
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["broken-clock", "early", "middle", "late"]);
}
