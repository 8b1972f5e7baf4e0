//! `dodot init`: create a new pack with starter files.

use std::path::Path;

use anyhow::Result;

use crate::cli::{GlobalOpts, InitOpts};
use crate::error::PackError;
use crate::fsys::FileSystem;
use crate::logging::Logger;
use crate::packs::Pack;

use super::{EXIT_OK, Session};

/// Starter `.dodot.toml` written into new packs.
pub(crate) const CONFIG_TEMPLATE: &str = r#"# dodot pack configuration.
# Uncomment and adjust as needed; an empty file is perfectly fine.

# Skip files in this pack:
# ignore = ["*.bak"]

# Route files to specific handlers ahead of the defaults:
# [[rules]]
# match = "*.zsh"
# handler = "shell"

# Map files to explicit targets:
# [mappings]
# "colors/molokai.vim" = "$HOME/.vim/colors/molokai.vim"
"#;

/// Starter aliases file written into new packs.
pub(crate) const ALIASES_TEMPLATE: &str = r#"# Shell aliases for this pack, sourced at login.
"#;

/// Create the pack directory and write the starter files.
///
/// # Errors
///
/// Returns an error if the name is invalid, the pack already exists, or
/// the files cannot be written.
pub fn init_pack(fs: &dyn FileSystem, root: &Path, name: &str) -> Result<()> {
    Pack::validate_name(name)?;
    let dir = root.join(name);
    if fs.lexists(&dir) {
        return Err(PackError::Exists(name.to_string()).into());
    }
    fs.create_dir_all(&dir)?;
    fs.write(&dir.join(".dodot.toml"), CONFIG_TEMPLATE.as_bytes())?;
    fs.write(&dir.join("aliases.sh"), ALIASES_TEMPLATE.as_bytes())?;
    Ok(())
}

/// Run `dodot init` against the real filesystem.
///
/// # Errors
///
/// Returns an error (exit code 2) if the name is invalid or the pack
/// already exists.
pub fn run(global: &GlobalOpts, opts: &InitOpts, log: &Logger) -> Result<i32> {
    let session = Session::new(global, log)?;
    init_pack(&session.fs, session.paths.dotfiles_root(), &opts.name)?;
    log.info(&format!(
        "created pack {} at {}",
        opts.name,
        session.paths.pack_path(&opts.name).display()
    ));
    Ok(EXIT_OK)
}
