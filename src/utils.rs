//! Utility functions shared across the snapvault library
//!
//! Hashing helpers (SHA-256 content addressing), human-readable size
//! formatting for the CLI, and atomic file replacement used by every
//! persisted artifact.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Hash arbitrary data using SHA-256
///
/// Returns the digest as a 64-character lowercase hexadecimal string. This is
/// the content-addressing key for the whole system: identical bytes anywhere
/// in a tree, or across snapshots in time, produce the identical hash.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a file's content using buffered reads
///
/// Equivalent to `hash_data(fs::read(path)?)` without holding the whole file
/// in memory. Used by the restorer to compare on-disk state against a
/// snapshot's recorded hash.
pub fn hash_file_content(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Format bytes in human-readable form
///
/// Values below 1024 bytes are shown as whole numbers with "B"; larger values
/// get two decimal places and the appropriate binary unit.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Atomic file write (write to temp file then rename)
///
/// The target is never visible in a partially written state: either the whole
/// new content is in place or the previous content is. Last save wins.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
