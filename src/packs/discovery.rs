//! Pack discovery and selection.
//!
//! Discovery enumerates the top-level entries of the dotfiles root and
//! produces the set of usable packs. Problems with an individual pack
//! (invalid name, broken `.dodot.toml`) skip that pack with a warning;
//! problems with the root itself are fatal for the run.

use std::path::Path;

use glob::Pattern;

use crate::config::{
    DEFAULT_IGNORES, PACK_CONFIG_FILE, PACK_IGNORE_FILE, PackConfig, RootConfig,
};
use crate::error::{DodotError, PackError};
use crate::fsys::FileSystem;

use super::Pack;

/// Discover all packs under the dotfiles root.
///
/// Skips names starting with `.` (except `.config`), names matching the
/// root config's ignore globs or the built-in defaults, and non-directories.
/// Surviving directories are validated and loaded; packs carrying a
/// `.dodotignore` are included but flagged. The result is sorted by name.
///
/// # Errors
///
/// Returns an error if the root does not exist, cannot be read, or its
/// `dodot.toml` is malformed.
pub fn discover_packs(
    fs: &dyn FileSystem,
    root: &Path,
    root_config_file: &Path,
) -> Result<Vec<Pack>, DodotError> {
    if !fs.is_dir(root) {
        return Err(PackError::NotFound(format!(
            "dotfiles root {} does not exist",
            root.display()
        ))
        .into());
    }

    let root_config = RootConfig::load(fs, root_config_file)?;
    let ignore_patterns = compile_ignores(&root_config);

    let entries = fs
        .read_dir(root)
        .map_err(|e| PackError::NotFound(format!("cannot read dotfiles root: {e}")))?;

    let mut packs = Vec::new();
    for entry in entries {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') && name != ".config" {
            tracing::debug!("discovery: skipping hidden entry {name}");
            continue;
        }
        if ignore_patterns.iter().any(|p| p.matches(name)) {
            tracing::debug!("discovery: skipping ignored entry {name}");
            continue;
        }
        if !fs.is_dir(&entry) {
            tracing::debug!("discovery: skipping non-directory {name}");
            continue;
        }
        if let Err(e) = Pack::validate_name(name) {
            tracing::warn!("discovery: skipping {name}: {e}");
            continue;
        }
        let config = match PackConfig::load(fs, &entry.join(PACK_CONFIG_FILE)) {
            Ok(config) => config.with_root_defaults(&root_config),
            Err(e) => {
                tracing::warn!("discovery: skipping {name}: {e}");
                continue;
            }
        };
        let ignored = fs.exists(&entry.join(PACK_IGNORE_FILE));
        if ignored {
            tracing::debug!("discovery: {name} carries {PACK_IGNORE_FILE}");
        }
        packs.push(Pack {
            name: name.to_string(),
            path: entry,
            config,
            ignored,
        });
    }

    packs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(packs)
}

/// Select packs by name from the discovered set.
///
/// Requested names are normalized by trimming trailing `/` (shell completion
/// appends them to directories). An empty request selects every pack. The
/// result is sorted by name.
///
/// # Errors
///
/// Returns [`PackError::PacksNotFound`] listing every requested name with no
/// match.
pub fn select_packs(packs: Vec<Pack>, names: &[String]) -> Result<Vec<Pack>, PackError> {
    if names.is_empty() {
        return Ok(packs);
    }

    let normalized: Vec<String> = names
        .iter()
        .map(|n| n.trim_end_matches('/').to_string())
        .collect();

    let missing: Vec<String> = normalized
        .iter()
        .filter(|n| !packs.iter().any(|p| &p.name == *n))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(PackError::PacksNotFound(missing));
    }

    let mut selected: Vec<Pack> = packs
        .into_iter()
        .filter(|p| normalized.iter().any(|n| n == &p.name))
        .collect();
    selected.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(selected)
}

fn compile_ignores(root_config: &RootConfig) -> Vec<Pattern> {
    DEFAULT_IGNORES
        .iter()
        .copied()
        .chain(root_config.ignore.iter().map(String::as_str))
        .filter_map(|p| Pattern::new(p).ok())
        .collect()
}
