//! Shell handler: pack scripts sourced at every login.
//!
//! Deploy records an entry under `deployed/shell_profile/` named
//! `<pack>-<basename>`; the shipped `dodot-init.sh` sources every entry in
//! that directory when the user's shell starts.

use anyhow::{Context as _, Result};

use crate::actions::Action;
use crate::packs::Pack;

use super::{FileInput, HandlerCtx, HandlerState, HandlerStatus};

/// Plan the shell-profile entry for one pack script.
///
/// # Errors
///
/// Never fails; the filesystem work happens in the action runner.
pub fn deploy(input: &FileInput, _ctx: &HandlerCtx<'_>) -> Result<Action> {
    Ok(Action::LinkShellProfile {
        pack: input.pack_name.clone(),
        source: input.source_path.clone(),
    })
}

/// Report whether the entry exists and resolves to the current source.
///
/// # Errors
///
/// Returns an error if the source file name is unusable.
pub fn check_status(input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<HandlerStatus> {
    let basename = input
        .source_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("shell profile source has no file name")?;
    let entry = ctx.datastore.shell_profile_entry(&input.pack_name, basename);

    if ctx
        .fs
        .read_link(&entry)
        .is_ok_and(|t| t == input.source_path)
    {
        Ok(HandlerStatus::new(HandlerState::Ready, "sourced at login"))
    } else {
        Ok(HandlerStatus::new(
            HandlerState::Pending,
            "not yet in shell profile",
        ))
    }
}

/// Remove every shell-profile entry belonging to `pack`.
///
/// # Errors
///
/// Returns an error if existing entries cannot be removed.
pub fn clear(pack: &Pack, ctx: &HandlerCtx<'_>) -> Result<()> {
    ctx.datastore.clear_shell_profile(&pack.name).map(|_| ())
}
