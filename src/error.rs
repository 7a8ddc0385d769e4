//! Error types for the snapvault library
//!
//! Errors follow a small taxonomy: not-found conditions are recoverable and
//! reported to the caller, I/O failures abort the whole operation, and
//! malformed persisted files are degraded to empty/absent values at the call
//! site (with a logged warning) rather than surfaced through this enum.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the snapvault library
pub type Result<T> = std::result::Result<T, SnapvaultError>;

/// Main error type for all snapvault operations
#[derive(Debug, Error)]
pub enum SnapvaultError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    ///
    /// Only raised for serialization on save; parse failures of persisted
    /// files are handled locally and never propagate through this variant.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot record not found in the snapshots directory
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// Target or snapshots directory does not exist
    #[error("Directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error")]
    Walk(#[from] walkdir::Error),

    /// Path conversion error
    #[error("Path conversion error: {0:?}")]
    PathConversion(std::ffi::OsString),

    /// Content store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SnapvaultError {
    /// Create a store error with a custom message
    pub fn store(msg: impl Into<String>) -> Self {
        SnapvaultError::Store(msg.into())
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        SnapvaultError::Internal(msg.into())
    }

    /// Check if this error is a not-found condition
    ///
    /// Not-found errors abort cleanly without committing partial state and
    /// are safe to report to the user without a backtrace.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SnapvaultError::SnapshotNotFound(_) | SnapvaultError::DirectoryNotFound(_)
        )
    }
}
