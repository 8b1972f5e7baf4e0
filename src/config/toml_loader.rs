//! Generic TOML configuration loading through the filesystem capability.
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ConfigError;
use crate::fsys::FileSystem;

/// Load and deserialize a TOML config file.
///
/// A missing file deserializes as empty TOML, so config types with
/// `#[serde(default)]` fields resolve to their defaults. This keeps "no
/// config present" and "empty config present" indistinguishable, which is
/// the contract for both the root `dodot.toml` and per-pack `.dodot.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] if the file exists but cannot be read and
/// [`ConfigError::Parse`] if it cannot be deserialized.
pub fn load_config<T: DeserializeOwned>(
    fs: &dyn FileSystem,
    path: &Path,
) -> Result<T, ConfigError> {
    if !fs.exists(path) {
        return toml::from_str("").map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        });
    }

    let content = fs
        .read_to_string(path)
        .map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}
