//! The five deployment handlers and their shared protocol.
//!
//! Handlers are a closed set modeled as the [`HandlerKind`] sum type; the
//! variant dispatches to its module. Every handler offers the same three
//! operations:
//!
//! - [`HandlerKind::deploy`] plans the work for one matched file and returns
//!   an [`Action`](crate::actions::Action) description. Planning never
//!   mutates anything; the action runner does (or, under dry-run, logs).
//! - [`HandlerKind::check_status`] reports the file's current state without
//!   side effects.
//! - [`HandlerKind::clear`] removes every trace the handler put on disk for
//!   a pack and is safe to call when no state exists.
//!
//! Configuration handlers (symlink, shell, path) are idempotent and
//! re-applied on every run. Code-execution handlers (install, homebrew) run
//! at most once per content checksum, tracked by sentinels.

pub mod homebrew;
pub mod install;
pub mod path;
pub mod shell;
pub mod symlink;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::actions::Action;
use crate::checksum::ChecksumCache;
use crate::config::PackConfig;
use crate::datastore::Datastore;
use crate::fsys::FileSystem;
use crate::packs::Pack;
use crate::paths::Paths;
use crate::rules::RuleMatch;

/// Handler behavior class, used by `off` to decide what can be cleared and
/// by `on --no-provision` to decide what runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerClass {
    /// Idempotent, re-applied every run (symlink, shell, path).
    Configuration,
    /// Runs at most once per content checksum (install, homebrew).
    CodeExecution,
}

/// The closed set of handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerKind {
    /// Two-hop symlink into `$HOME` / `$XDG_CONFIG_HOME`.
    Symlink,
    /// Shell snippet sourced at login.
    Shell,
    /// Directory prepended to `PATH` at login.
    Path,
    /// One-shot provisioning script.
    Install,
    /// One-shot Homebrew bundle.
    Homebrew,
}

impl HandlerKind {
    /// Every handler, in the order `off` iterates them.
    pub const ALL: [Self; 5] = [
        Self::Symlink,
        Self::Shell,
        Self::Path,
        Self::Install,
        Self::Homebrew,
    ];

    /// Stable handler name used in config files, the datastore layout, and
    /// output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Symlink => "symlink",
            Self::Shell => "shell",
            Self::Path => "path",
            Self::Install => "install",
            Self::Homebrew => "homebrew",
        }
    }

    /// Look a handler up by its stable name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The handler's behavior class.
    #[must_use]
    pub const fn class(self) -> HandlerClass {
        match self {
            Self::Symlink | Self::Shell | Self::Path => HandlerClass::Configuration,
            Self::Install | Self::Homebrew => HandlerClass::CodeExecution,
        }
    }

    /// Plan the deployment of one matched file.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be computed, e.g. an occupied
    /// target without `--force` or an unreadable source file.
    pub fn deploy(self, input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<Action> {
        match self {
            Self::Symlink => symlink::deploy(input, ctx),
            Self::Shell => shell::deploy(input, ctx),
            Self::Path => path::deploy(input, ctx),
            Self::Install => install::deploy(input, ctx),
            Self::Homebrew => homebrew::deploy(input, ctx),
        }
    }

    /// Report the current state of one matched file. Never mutates.
    ///
    /// # Errors
    ///
    /// Returns an error only when the state cannot be determined at all;
    /// recognizable broken states are reported as
    /// [`HandlerState::Error`] statuses instead.
    pub fn check_status(self, input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<HandlerStatus> {
        match self {
            Self::Symlink => symlink::check_status(input, ctx),
            Self::Shell => shell::check_status(input, ctx),
            Self::Path => path::check_status(input, ctx),
            Self::Install => install::check_status(input, ctx),
            Self::Homebrew => homebrew::check_status(input, ctx),
        }
    }

    /// Remove every trace this handler left on disk for `pack`.
    ///
    /// # Errors
    ///
    /// Returns an error if existing state cannot be removed. Clearing a
    /// pack with no state succeeds.
    pub fn clear(self, pack: &Pack, ctx: &HandlerCtx<'_>) -> Result<()> {
        match self {
            Self::Symlink => symlink::clear(pack, ctx),
            Self::Shell => shell::clear(pack, ctx),
            Self::Path => path::clear(pack, ctx),
            Self::Install => install::clear(pack, ctx),
            Self::Homebrew => homebrew::clear(pack, ctx),
        }
    }
}

/// One matched pack file handed to a handler.
#[derive(Debug, Clone)]
pub struct FileInput {
    /// Name of the owning pack.
    pub pack_name: String,
    /// Absolute path of the file inside the pack.
    pub source_path: PathBuf,
    /// Path relative to the pack root.
    pub relative_path: PathBuf,
    /// Options from the matching rule.
    pub options: BTreeMap<String, toml::Value>,
}

impl FileInput {
    /// Build the handler input from a rule match.
    #[must_use]
    pub fn from_match(m: &RuleMatch) -> Self {
        Self {
            pack_name: m.pack_name.clone(),
            source_path: m.absolute_path.clone(),
            relative_path: m.relative_path.clone(),
            options: m.options.clone(),
        }
    }
}

/// Handler-reported state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// Work is required (or required again after a content change).
    Pending,
    /// The file is fully deployed.
    Ready,
    /// Deployed state exists but is broken.
    Error,
    /// The state cannot be classified.
    Unknown,
}

/// Status report for one file.
#[derive(Debug, Clone)]
pub struct HandlerStatus {
    /// Classified state.
    pub state: HandlerState,
    /// Single-line human message (e.g. `linked`, `never run`).
    pub message: String,
}

impl HandlerStatus {
    /// Shorthand constructor.
    #[must_use]
    pub fn new(state: HandlerState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

/// Everything a handler operation may consult.
///
/// Built per pack by the dispatching command; `config` is the current
/// pack's configuration (root defaults folded in).
#[derive(Debug, Clone, Copy)]
pub struct HandlerCtx<'a> {
    /// Filesystem capability.
    pub fs: &'a dyn FileSystem,
    /// Resolved path set for this run.
    pub paths: &'a Paths,
    /// Datastore view over the data directory.
    pub datastore: &'a Datastore<'a>,
    /// Per-run checksum cache.
    pub checksums: &'a ChecksumCache,
    /// Current pack's configuration.
    pub config: &'a PackConfig,
    /// Whether `--force` was passed.
    pub force: bool,
}
