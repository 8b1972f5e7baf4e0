//! Status engine: side-effect-free state reporting.
//!
//! Runs the matcher and each handler's `check_status`, converts handler
//! states to display states, and reduces file states to one pack-level
//! state. Deployment is never invoked from here.

use std::fmt;

use serde::Serialize;

use crate::checksum::ChecksumCache;
use crate::config::PACK_CONFIG_FILE;
use crate::datastore::Datastore;
use crate::fsys::FileSystem;
use crate::handlers::{FileInput, HandlerCtx, HandlerState};
use crate::packs::Pack;
use crate::paths::Paths;
use crate::rules;

/// Display-level state of a file or pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayState {
    /// Work is queued (pending or missing).
    Queue,
    /// Fully deployed.
    Success,
    /// Broken or unclassifiable state.
    Error,
    /// Some files deployed, some still queued.
    Partial,
    /// Pack carries a `.dodotignore` marker.
    Ignored,
    /// A dodot configuration file, reported for visibility only.
    Config,
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queue => "queue",
            Self::Success => "success",
            Self::Error => "error",
            Self::Partial => "partial",
            Self::Ignored => "ignored",
            Self::Config => "config",
        };
        f.write_str(s)
    }
}

/// Convert a handler-reported state to its display state.
#[must_use]
pub const fn display_state(state: HandlerState) -> DisplayState {
    match state {
        HandlerState::Pending => DisplayState::Queue,
        HandlerState::Ready => DisplayState::Success,
        HandlerState::Error | HandlerState::Unknown => DisplayState::Error,
    }
}

/// Reduce per-file display states to one pack-level state.
///
/// Precedence: any error wins; queued plus deployed is partial; queued
/// alone is queue; all deployed is success; an empty pack is queue.
#[must_use]
pub fn reduce_pack_state(states: &[DisplayState]) -> DisplayState {
    let any = |wanted: DisplayState| states.iter().any(|s| *s == wanted);
    if any(DisplayState::Error) {
        DisplayState::Error
    } else if any(DisplayState::Queue) {
        if any(DisplayState::Success) {
            DisplayState::Partial
        } else {
            DisplayState::Queue
        }
    } else if states.is_empty() {
        DisplayState::Queue
    } else {
        DisplayState::Success
    }
}

/// Status of one file within a pack.
#[derive(Debug, Clone, Serialize)]
pub struct FileStatus {
    /// Pack-relative path.
    pub path: String,
    /// Responsible handler, when one matched.
    pub handler: Option<&'static str>,
    /// Display state.
    pub state: DisplayState,
    /// Single-line detail message.
    pub message: String,
}

/// Status of one pack.
#[derive(Debug, Clone, Serialize)]
pub struct PackStatus {
    /// Pack name.
    pub pack: String,
    /// Reduced pack-level state.
    pub state: DisplayState,
    /// Per-file rows.
    pub files: Vec<FileStatus>,
}

/// Compute the status of a single pack without mutating anything.
#[must_use]
pub fn pack_status(
    fs: &dyn FileSystem,
    paths: &Paths,
    checksums: &ChecksumCache,
    pack: &Pack,
) -> PackStatus {
    if pack.ignored {
        return PackStatus {
            pack: pack.name.clone(),
            state: DisplayState::Ignored,
            files: vec![FileStatus {
                path: String::new(),
                handler: None,
                state: DisplayState::Ignored,
                message: "pack is ignored".to_string(),
            }],
        };
    }

    let datastore = Datastore::new(fs, paths);
    let ctx = HandlerCtx {
        fs,
        paths,
        datastore: &datastore,
        checksums,
        config: &pack.config,
        force: false,
    };

    let matches = match rules::match_pack(fs, pack) {
        Ok(matches) => matches,
        Err(e) => {
            return PackStatus {
                pack: pack.name.clone(),
                state: DisplayState::Error,
                files: vec![FileStatus {
                    path: String::new(),
                    handler: None,
                    state: DisplayState::Error,
                    message: format!("{e:#}"),
                }],
            };
        }
    };

    let mut files = Vec::new();
    let mut reducible = Vec::new();
    for m in &matches {
        let input = FileInput::from_match(m);
        let (state, message) = match m.handler.check_status(&input, &ctx) {
            Ok(status) => (display_state(status.state), status.message),
            Err(e) => (DisplayState::Error, format!("{e:#}")),
        };
        reducible.push(state);
        files.push(FileStatus {
            path: m.relative_path.to_string_lossy().into_owned(),
            handler: Some(m.handler.name()),
            state,
            message,
        });
    }

    // Configuration files are reported for visibility but never influence
    // the pack-level state.
    if fs.exists(&pack.path.join(PACK_CONFIG_FILE)) {
        files.push(FileStatus {
            path: PACK_CONFIG_FILE.to_string(),
            handler: None,
            state: DisplayState::Config,
            message: "dodot configuration".to_string(),
        });
    }

    PackStatus {
        pack: pack.name.clone(),
        state: reduce_pack_state(&reducible),
        files,
    }
}

/// Compute the status of every given pack, in input order.
#[must_use]
pub fn report(
    fs: &dyn FileSystem,
    paths: &Paths,
    checksums: &ChecksumCache,
    packs: &[Pack],
) -> Vec<PackStatus> {
    packs
        .iter()
        .map(|pack| pack_status(fs, paths, checksums, pack))
        .collect()
}
