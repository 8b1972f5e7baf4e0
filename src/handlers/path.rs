//! Path handler: pack `bin` directories prepended to `PATH` at login.
//!
//! Deploy records an entry under `deployed/path/` named `<pack>-<dirname>`;
//! the shipped `dodot-init.sh` prepends every entry in that directory to
//! `PATH` when the user's shell starts.

use anyhow::{Context as _, Result};

use crate::actions::Action;
use crate::packs::Pack;

use super::{FileInput, HandlerCtx, HandlerState, HandlerStatus};

/// Plan the PATH entry for one pack directory.
///
/// # Errors
///
/// Never fails; the filesystem work happens in the action runner.
pub fn deploy(input: &FileInput, _ctx: &HandlerCtx<'_>) -> Result<Action> {
    Ok(Action::LinkPath {
        pack: input.pack_name.clone(),
        source: input.source_path.clone(),
    })
}

/// Report whether the entry exists and resolves to the pack directory.
///
/// # Errors
///
/// Returns an error if the source directory name is unusable.
pub fn check_status(input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<HandlerStatus> {
    let dirname = input
        .source_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("path entry source has no file name")?;
    let entry = ctx.datastore.path_entry(&input.pack_name, dirname);

    if ctx
        .fs
        .read_link(&entry)
        .is_ok_and(|t| t == input.source_path)
    {
        Ok(HandlerStatus::new(HandlerState::Ready, "on PATH"))
    } else {
        Ok(HandlerStatus::new(HandlerState::Pending, "not yet on PATH"))
    }
}

/// Remove every PATH entry belonging to `pack`.
///
/// # Errors
///
/// Returns an error if existing entries cannot be removed.
pub fn clear(pack: &Pack, ctx: &HandlerCtx<'_>) -> Result<()> {
    ctx.datastore.clear_path_entries(&pack.name).map(|_| ())
}
