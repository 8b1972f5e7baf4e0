//! SHA-256 content checksums with a per-run cache.
//!
//! Sentinel filenames embed the checksum of the source file at the moment a
//! code-execution handler ran. A single run reads each source file at most
//! once for hashing; repeated lookups hit the cache.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::error::DatastoreError;
use crate::fsys::FileSystem;

/// Lowercase hex SHA-256 of raw bytes.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for b in &result {
        write!(hex, "{b:02x}").unwrap_or(());
    }
    hex
}

/// Per-run cache of file checksums keyed by absolute path.
#[derive(Debug, Default)]
pub struct ChecksumCache {
    entries: Mutex<HashMap<PathBuf, String>>,
}

impl ChecksumCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the lowercase hex SHA-256 of the file at `path`, computing it
    /// on first use and serving subsequent calls from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::Checksum`] if the file cannot be read.
    pub fn file_sha256(&self, fs: &dyn FileSystem, path: &Path) -> Result<String, DatastoreError> {
        if let Ok(guard) = self.entries.lock()
            && let Some(hex) = guard.get(path)
        {
            return Ok(hex.clone());
        }
        let data = fs.read(path).map_err(|source| DatastoreError::Checksum {
            path: path.to_path_buf(),
            source,
        })?;
        let hex = sha256_hex(&data);
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(path.to_path_buf(), hex.clone());
        }
        Ok(hex)
    }
}
