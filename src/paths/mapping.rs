//! Decides where a pack-relative file lands in the live filesystem.
//!
//! Four layers, highest priority first; the first match wins:
//!
//! 1. custom mappings from the pack config (exact or glob key),
//! 2. explicit `_home/` and `_xdg/` prefixes,
//! 3. the force-home exception set,
//! 4. the smart default: top-level files become `$HOME` dotfiles, nested
//!    paths land under `$XDG_CONFIG_HOME`.
//!
//! The reverse direction ([`map_system_file_to_pack`]) exists for adopt and
//! is deliberately not a bijection; see the crate design notes.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;

use crate::config::PackConfig;
use crate::error::PackError;

use super::Paths;

/// Map a pack-relative path to its user-visible deployment target.
#[must_use]
pub fn map_pack_file_to_system(paths: &Paths, config: &PackConfig, relative: &Path) -> PathBuf {
    let rel_str = relative.to_string_lossy();

    // Layer 1: custom mappings from the pack config.
    for (pattern, target) in &config.mappings {
        let matched = pattern.as_str() == rel_str
            || Pattern::new(pattern).is_ok_and(|p| p.matches(&rel_str));
        if matched {
            return expand_target(paths, target);
        }
    }

    // Layer 2: explicit override prefixes.
    if let Ok(rest) = relative.strip_prefix("_home") {
        return paths.home().join(dot_first_segment(rest));
    }
    if let Ok(rest) = relative.strip_prefix("_xdg") {
        return paths.xdg_config_home().join(rest);
    }

    // Layer 3: force-home exception set.
    if let Some(first) = first_segment(relative) {
        let stem = first.trim_start_matches('.');
        let forced = config
            .force_home
            .iter()
            .any(|entry| entry == stem || Pattern::new(entry).is_ok_and(|p| p.matches(stem)));
        if forced {
            return paths.home().join(dot_first_segment(relative));
        }
    }

    // Layer 4: smart default.
    if relative.components().count() <= 1 {
        return paths.home().join(dot_first_segment(relative));
    }
    let stripped = relative
        .strip_prefix("config")
        .or_else(|_| relative.strip_prefix(".config"))
        .unwrap_or(relative);
    paths.xdg_config_home().join(stripped)
}

/// Map a live-system path back to a pack-relative path, best effort.
///
/// Used only by adopt. Paths under `$XDG_CONFIG_HOME` keep their relative
/// form; `$HOME/.name` becomes `name`; nested `$HOME/.seg/rest` becomes
/// `seg/rest` when the force-home set covers `seg` and `_home/seg/rest`
/// otherwise, so the forward mapping reproduces the original location.
///
/// # Errors
///
/// Returns an error if `system` lies outside both `$HOME` and
/// `$XDG_CONFIG_HOME`.
pub fn map_system_file_to_pack(
    paths: &Paths,
    config: &PackConfig,
    system: &Path,
) -> Result<PathBuf, PackError> {
    // $XDG_CONFIG_HOME usually lives under $HOME, so check it first.
    if let Ok(rest) = system.strip_prefix(paths.xdg_config_home()) {
        if rest.as_os_str().is_empty() {
            return Err(PackError::InvalidInput(
                "cannot adopt a configuration root directory".to_string(),
            ));
        }
        return Ok(rest.to_path_buf());
    }

    if let Ok(rest) = system.strip_prefix(paths.home()) {
        let Some(first) = first_segment(rest) else {
            return Err(PackError::InvalidInput(
                "cannot adopt the home directory itself".to_string(),
            ));
        };
        let stem = first.trim_start_matches('.').to_string();
        if stem.is_empty() {
            return Err(PackError::InvalidInput(format!(
                "cannot derive a pack path for {}",
                system.display()
            )));
        }
        let tail: PathBuf = rest.components().skip(1).collect();
        if tail.as_os_str().is_empty() {
            return Ok(PathBuf::from(stem));
        }
        let forced = config
            .force_home
            .iter()
            .any(|entry| *entry == stem || Pattern::new(entry).is_ok_and(|p| p.matches(&stem)));
        if forced {
            return Ok(Path::new(&stem).join(tail));
        }
        return Ok(Path::new("_home").join(stem).join(tail));
    }

    Err(PackError::InvalidInput(format!(
        "{} is not under $HOME or $XDG_CONFIG_HOME",
        system.display()
    )))
}

/// Expand `$HOME`, `$XDG_CONFIG_HOME`, and a leading `~` in a mapping
/// target. Relative results are anchored at the home directory. Also used
/// for explicit `target` options on override rules.
pub(crate) fn expand_target(paths: &Paths, target: &str) -> PathBuf {
    let home = paths.home().to_string_lossy().into_owned();
    let xdg = paths.xdg_config_home().to_string_lossy().into_owned();
    let expanded = target
        .replace("$XDG_CONFIG_HOME", &xdg)
        .replace("$HOME", &home);
    let expanded = expanded
        .strip_prefix("~/")
        .map_or(expanded.clone(), |rest| format!("{home}/{rest}"));
    let path = PathBuf::from(expanded);
    if path.is_absolute() {
        path
    } else {
        paths.home().join(path)
    }
}

/// First normal component of a relative path, as a string.
fn first_segment(path: &Path) -> Option<&str> {
    path.components().find_map(|c| match c {
        Component::Normal(name) => name.to_str(),
        _ => None,
    })
}

/// Prepend a dot to the first segment of a relative path unless it already
/// has one.
fn dot_first_segment(path: &Path) -> PathBuf {
    let mut comps = path.components();
    let Some(Component::Normal(first)) = comps.next() else {
        return path.to_path_buf();
    };
    let first = first.to_string_lossy();
    let dotted = if first.starts_with('.') {
        first.into_owned()
    } else {
        format!(".{first}")
    };
    let mut out = PathBuf::from(dotted);
    let rest = comps.as_path();
    if !rest.as_os_str().is_empty() {
        out.push(rest);
    }
    out
}
