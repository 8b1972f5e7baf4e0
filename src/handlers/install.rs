//! Install handler: one-shot provisioning scripts keyed by content checksum.
//!
//! `install.sh` runs once per content. A sentinel named
//! `<basename>-<sha256>` under `install/sentinels/<pack>/` records the run;
//! editing the script changes the checksum and schedules a re-run. Clearing
//! removes the sentinels only, never the script's side effects.

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
        .context("install script has no file name")
}

/// Plan the provisioning run, or a no-op when the current content already
/// ran.
///
/// # Errors
///
/// Returns an error if the script cannot be checksummed.
pub fn deploy(input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<Action> {
    let name = file_name(input)?;
    let checksum = ctx.checksums.file_sha256(ctx.fs, &input.source_path)?;
    if ctx
        .datastore
        .has_sentinel(SentinelKind::Install, &input.pack_name, name, &checksum)
    {
        return Ok(Action::Noop {
            reason: format!("{name} already ran for this content"),
        });
    }
    let cwd = input
        .source_path
        .parent()
        .map_or_else(|| input.source_path.clone(), std::path::Path::to_path_buf);
    Ok(Action::RunCommand {
        pack: input.pack_name.clone(),
        handler: HandlerKind::Install,
        cwd,
        program: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            input.source_path.to_string_lossy().into_owned(),
        ],
        file_name: name.to_string(),
        checksum,
    })
}

/// Report the sentinel state for the current script content.
///
/// # Errors
///
/// Returns an error if the script disappeared or cannot be checksummed.
pub fn check_status(input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<HandlerStatus> {
    let name = file_name(input)?;
    let checksum = ctx.checksums.file_sha256(ctx.fs, &input.source_path)?;
    match ctx
        .datastore
        .sentinel_checksum(SentinelKind::Install, &input.pack_name, name)
    {
        Some(recorded) if recorded == checksum => {
            Ok(HandlerStatus::new(HandlerState::Ready, "executed"))
        }
        Some(_) => Ok(HandlerStatus::new(
            HandlerState::Pending,
            "file changed, needs re-run",
        )),
        None => Ok(HandlerStatus::new(HandlerState::Pending, "never run")),
    }
}

/// Remove the sentinel directory for `pack`. Whatever the script itself did
/// is not rolled back.
///
/// # Errors
///
/// Returns an error if existing sentinels cannot be removed.
pub fn clear(pack: &Pack, ctx: &HandlerCtx<'_>) -> Result<()> {
    ctx.datastore.clear_sentinels(SentinelKind::Install, &pack.name)?;
    ctx.datastore
        .clear_run_record(&pack.name, HandlerKind::Install.name())
}
