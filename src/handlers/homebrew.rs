//! Homebrew handler: one-shot `brew bundle` runs keyed by Brewfile content.
//!
//! Identical state machine to the install handler, rooted at
//! `homebrew/<pack>/`. Editing the Brewfile changes the checksum and
//! schedules a re-run.

use anyhow::{Context as _, Result};

use crate::actions::Action;
use crate::datastore::SentinelKind;
use crate::packs::Pack;

use super::{FileInput, HandlerCtx, HandlerKind, HandlerState, HandlerStatus};

fn file_name(input: &FileInput) -> Result<&str> {
    input
        .source_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Brewfile has no file name")
}

/// Plan the bundle run, or a no-op when the current content already ran.
///
/// # Errors
///
/// Returns an error if the Brewfile cannot be checksummed.
pub fn deploy(input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<Action> {
    let name = file_name(input)?;
    let checksum = ctx.checksums.file_sha256(ctx.fs, &input.source_path)?;
    if ctx
        .datastore
        .has_sentinel(SentinelKind::Homebrew, &input.pack_name, name, &checksum)
    {
        return Ok(Action::Noop {
            reason: format!("{name} already installed for this content"),
        });
    }
    let cwd = input
        .source_path
        .parent()
        .map_or_else(|| input.source_path.clone(), std::path::Path::to_path_buf);
    Ok(Action::RunCommand {
        pack: input.pack_name.clone(),
        handler: HandlerKind::Homebrew,
        cwd,
        program: "brew".to_string(),
        args: vec![
            "bundle".to_string(),
            format!("--file={}", input.source_path.display()),
        ],
        file_name: name.to_string(),
        checksum,
    })
}

/// Report the sentinel state for the current Brewfile content.
///
/// # Errors
///
/// Returns an error if the Brewfile disappeared or cannot be checksummed.
pub fn check_status(input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<HandlerStatus> {
    let name = file_name(input)?;
    let checksum = ctx.checksums.file_sha256(ctx.fs, &input.source_path)?;
    match ctx
        .datastore
        .sentinel_checksum(SentinelKind::Homebrew, &input.pack_name, name)
    {
        Some(recorded) if recorded == checksum => {
            Ok(HandlerStatus::new(HandlerState::Ready, "installed"))
        }
        Some(_) => Ok(HandlerStatus::new(
            HandlerState::Pending,
            "Brewfile changed, needs re-run",
        )),
        None => Ok(HandlerStatus::new(HandlerState::Pending, "never installed")),
    }
}

/// Remove the sentinel directory for `pack`. Installed formulae are not
/// uninstalled.
///
/// # Errors
///
/// Returns an error if existing sentinels cannot be removed.
pub fn clear(pack: &Pack, ctx: &HandlerCtx<'_>) -> Result<()> {
    ctx.datastore
        .clear_sentinels(SentinelKind::Homebrew, &pack.name)?;
    ctx.datastore
        .clear_run_record(&pack.name, HandlerKind::Homebrew.name())
}
