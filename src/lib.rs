//! # Snapvault - Content-addressed directory snapshots
//!
//! A library for deduplicated point-in-time snapshots of directory trees.
//! File contents are captured once per unique SHA-256 content hash into a
//! shared content store; snapshot metadata is persisted separately, so
//! identical content anywhere in a tree, or across snapshots in time, is
//! stored exactly once.
//!
//! ## Overview
//!
//! - Capture immutable snapshots containing only content that is novel at
//!   capture time
//! - Restore any snapshot into an output directory, resolving content by
//!   hash through the shared store
//! - Prune snapshots and reclaim content safely via per-hash reference
//!   counting
//! - List snapshot history ordered by timestamp
//!
//! ## Architecture
//!
//! - **Content store** ([`store`]): a persistent hash -> content mapping in
//!   a single JSON file, loaded whole at the start of an operation and
//!   written back atomically at the end. A sidecar tracks per-hash reference
//!   counts across live snapshots.
//! - **Snapshot builder** ([`snapshot`]): walks a directory, hashes every
//!   regular file in parallel, and assembles a snapshot of the novel content
//!   with size accounting.
//! - **Snapshot repository** ([`repository`]): persists snapshot records as
//!   independent `{id}.json` files and merges captured content into the
//!   store.
//! - **Restorer** ([`restore`]): rebuilds a snapshot's tree, overwriting
//!   only files whose on-disk content drifted from the recorded hash.
//! - **Pruner** ([`prune`]): deletes a snapshot record and removes content
//!   whose reference count reaches zero.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snapvault::{ContentStore, Pruner, Restorer, SnapshotBuilder, SnapshotRepository};
//! use std::path::Path;
//!
//! # fn main() -> snapvault::Result<()> {
//! let store = ContentStore::default();
//!
//! // Capture and persist a snapshot
//! let builder = SnapshotBuilder::new(store.clone());
//! if let Some(snapshot) = builder.create(Path::new("./project"))? {
//!     let repository = SnapshotRepository::new(store.clone());
//!     repository.save(&snapshot, Path::new("./snapshots"))?;
//!
//!     // Reconstruct it elsewhere
//!     let restorer = Restorer::new(store.clone());
//!     restorer.restore(&snapshot.id, Path::new("./snapshots"), Path::new("./restored"))?;
//!
//!     // And reclaim it
//!     let pruner = Pruner::new(store.clone());
//!     pruner.prune(Path::new("./snapshots"), &snapshot.id)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! Single process, one operation at a time. File reads within one capture
//! run in parallel, but the content store is read once per operation and
//! written once; there is no locking. Two operations mutating the same
//! store concurrently are a data race with last-writer-wins outcome; the
//! caller is responsible for serializing invocations.

pub mod error;
pub mod prune;
pub mod repository;
pub mod restore;
pub mod snapshot;
pub mod store;
pub mod utils;

// Re-export main types for convenience
pub use error::{Result, SnapvaultError};
pub use prune::{PruneReport, Pruner};
pub use repository::SnapshotRepository;
pub use restore::{RestoreReport, Restorer};
pub use snapshot::{FileRecord, Snapshot, SnapshotBuilder, TIMESTAMP_FORMAT};
pub use store::{ContentStore, DEFAULT_STORE_PATH};
