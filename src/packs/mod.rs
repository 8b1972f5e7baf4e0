//! Pack model and name validation.
//!
//! A pack is a directory of dotfiles directly under the dotfiles root,
//! optionally carrying a `.dodot.toml`. Packs are built once by discovery
//! and treated as immutable for the rest of the run.

pub mod discovery;

use std::path::PathBuf;

use crate::config::PackConfig;
use crate::error::PackError;

/// Characters that may never appear in a pack name.
const FORBIDDEN_CHARS: &[char] = &[':', '*', '?', '"', '<', '>', '|', '/', '\\'];

/// A named directory of dotfiles under the dotfiles root.
#[derive(Debug, Clone)]
pub struct Pack {
    /// Directory basename; doubles as the pack's identity everywhere.
    pub name: String,
    /// Absolute path of the pack directory.
    pub path: PathBuf,
    /// Per-pack configuration with root defaults folded in.
    pub config: PackConfig,
    /// Whether the pack carries a `.dodotignore` marker. Ignored packs are
    /// skipped by deployment and reported as ignored by status.
    pub ignored: bool,
}

impl Pack {
    /// Validate a pack name.
    ///
    /// Rejects empty names, `.` and `..`, path separators, control
    /// characters, and the characters `:*?"<>|`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidInput`] describing the first problem
    /// found.
    pub fn validate_name(name: &str) -> Result<(), PackError> {
        if name.is_empty() {
            return Err(PackError::InvalidInput("pack name is empty".to_string()));
        }
        if name == "." || name == ".." {
            return Err(PackError::InvalidInput(format!(
                "'{name}' is not a valid pack name"
            )));
        }
        if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
            return Err(PackError::InvalidInput(format!(
                "pack name '{name}' contains forbidden character '{c}'"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(PackError::InvalidInput(format!(
                "pack name '{name}' contains control characters"
            )));
        }
        Ok(())
    }
}
