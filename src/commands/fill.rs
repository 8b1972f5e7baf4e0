//! `dodot fill`: add missing starter files to existing packs.
//!
//! Fill writes template files only; it never emits handler actions, so a
//! subsequent `on` is required to deploy whatever it created.

use anyhow::Result;

use crate::cli::{FillOpts, GlobalOpts};
use crate::config::PACK_CONFIG_FILE;
use crate::fsys::FileSystem;
use crate::logging::Logger;
use crate::packs::{Pack, discovery};

use super::init::{ALIASES_TEMPLATE, CONFIG_TEMPLATE};
use super::{EXIT_OK, Session};

/// Write any missing starter files into `pack`, returning the names of the
/// files created.
///
/// # Errors
///
/// Returns an error if a template cannot be written.
pub fn fill_pack(fs: &dyn FileSystem, pack: &Pack) -> Result<Vec<&'static str>> {
    let mut created = Vec::new();
    let templates: [(&str, &str); 2] = [
        (PACK_CONFIG_FILE, CONFIG_TEMPLATE),
        ("aliases.sh", ALIASES_TEMPLATE),
    ];
    for (name, content) in templates {
        let path = pack.path.join(name);
        if !fs.lexists(&path) {
            fs.write(&path, content.as_bytes())?;
            created.push(name);
        }
    }
    Ok(created)
}

/// Run `dodot fill` against the real filesystem.
///
/// # Errors
///
/// Returns an error on discovery or selection failure.
pub fn run(global: &GlobalOpts, opts: &FillOpts, log: &Logger) -> Result<i32> {
    let session = Session::new(global, log)?;
    let discovered = discovery::discover_packs(
        &session.fs,
        session.paths.dotfiles_root(),
        &session.paths.root_config_file(),
    )?;
    let selected = discovery::select_packs(discovered, &opts.packs)?;

    for pack in &selected {
        let created = fill_pack(&session.fs, pack)?;
        if created.is_empty() {
            log.debug(&format!("{}: nothing to fill", pack.name));
        } else {
            log.info(&format!("{}: added {}", pack.name, created.join(", ")));
        }
    }
    Ok(EXIT_OK)
}
