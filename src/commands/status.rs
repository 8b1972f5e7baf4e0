//! `dodot status`: report the state of every managed file.

use anyhow::Result;

use crate::cli::{GlobalOpts, StatusOpts};
use crate::logging::Logger;
use crate::packs::discovery;
use crate::status::{self, PackStatus};

use super::{EXIT_OK, Session};

/// Render pack statuses as stable, plain display text.
#[must_use]
pub fn render(statuses: &[PackStatus]) -> String {
    let mut out = String::new();
    for status in statuses {
        out.push_str(&format!("{}: {}\n", status.pack, status.state));
        for file in &status.files {
            let path = if file.path.is_empty() {
                String::new()
            } else {
                format!(" {}", file.path)
            };
            out.push_str(&format!("  [{}]{path}: {}\n", file.state, file.message));
        }
    }
    out
}

/// Run `dodot status` against the real filesystem.
///
/// Exits zero even when individual files report errors; only discovery and
/// selection problems fail the invocation.
///
/// # Errors
///
/// Returns an error on discovery or selection failure.
pub fn run(global: &GlobalOpts, opts: &StatusOpts, log: &Logger) -> Result<i32> {
    let session = Session::new(global, log)?;
    let discovered = discovery::discover_packs(
        &session.fs,
        session.paths.dotfiles_root(),
        &session.paths.root_config_file(),
    )?;
    let selected = discovery::select_packs(discovered, &opts.packs)?;

    let statuses = status::report(&session.fs, &session.paths, &session.checksums, &selected);
    for line in render(&statuses).lines() {
        log.info(line);
    }
    Ok(EXIT_OK)
}
