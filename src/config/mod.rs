//! Root and per-pack configuration models.
//!
//! The root `dodot.toml` (top of the dotfiles tree) carries ignore patterns
//! and the force-home exception set. Each pack may carry a `.dodot.toml`
//! with file ignores, rule overrides, custom path mappings, its own
//! force-home set, and a handler enable list. Missing files resolve to
//! defaults.

pub mod toml_loader;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::fsys::FileSystem;

/// Names that are always skipped during pack discovery, in addition to the
/// root config's ignore patterns.
pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    "__pycache__",
    "target",
    ".git",
    ".svn",
    ".hg",
    ".DS_Store",
];

/// Per-pack config file name.
pub const PACK_CONFIG_FILE: &str = ".dodot.toml";

/// Marker file whose presence excludes a pack from deployment.
pub const PACK_IGNORE_FILE: &str = ".dodotignore";

/// Rule type discriminator for override rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Exact file name match (`install.sh`).
    Filename,
    /// Glob match on the file name (`*.sh`).
    #[default]
    Glob,
    /// Matches a directory with the given name (`bin`).
    Directory,
    /// Exact match on the pack-relative path.
    Exact,
}

/// A per-pack rule override mapping a pattern to a handler.
///
/// Overrides are evaluated before the built-in defaults, in declared order.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRule {
    /// Pattern to match, interpreted per [`RuleType`].
    #[serde(rename = "match")]
    pub pattern: String,
    /// Name of the handler to dispatch to.
    pub handler: String,
    /// How [`Self::pattern`] is interpreted. Defaults to glob.
    #[serde(rename = "type", default)]
    pub rule_type: RuleType,
    /// Extra options forwarded to the handler.
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
}

/// Root configuration (`dodot.toml` at the top of the dotfiles tree).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Glob patterns for directory names that are not packs.
    pub ignore: Vec<String>,
    /// Path segments that deploy to `$HOME` instead of `$XDG_CONFIG_HOME`.
    pub force_home: Vec<String>,
}

impl RootConfig {
    /// Load the root config from `dodot.toml` under the dotfiles root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    /// A root config error is fatal for the run.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, ConfigError> {
        toml_loader::load_config(fs, path)
    }
}

/// Per-pack configuration (`<pack>/.dodot.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Glob patterns for pack files the matcher skips.
    pub ignore: Vec<String>,
    /// Rule overrides evaluated before the built-in defaults.
    pub rules: Vec<OverrideRule>,
    /// Custom path mappings: pack-relative path (exact or glob) to target
    /// with `$HOME` / `$XDG_CONFIG_HOME` placeholders.
    pub mappings: BTreeMap<String, String>,
    /// Path segments that deploy to `$HOME`. When empty the root config's
    /// set applies.
    pub force_home: Vec<String>,
    /// Handler names allowed to run for this pack. Empty means all.
    pub handlers_enabled: Vec<String>,
}

impl PackConfig {
    /// Load a pack's `.dodot.toml`, resolving to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    /// A pack config error is fatal for that pack only.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, ConfigError> {
        toml_loader::load_config(fs, path)
    }

    /// Fold the root config's force-home set into this pack config when the
    /// pack declares none of its own. The pack-level set takes precedence
    /// wholesale; the two are never merged.
    #[must_use]
    pub fn with_root_defaults(mut self, root: &RootConfig) -> Self {
        if self.force_home.is_empty() {
            self.force_home = root.force_home.clone();
        }
        self
    }

    /// Whether `handler` may run for this pack.
    #[must_use]
    pub fn handler_enabled(&self, handler: &str) -> bool {
        self.handlers_enabled.is_empty() || self.handlers_enabled.iter().any(|h| h == handler)
    }
}
