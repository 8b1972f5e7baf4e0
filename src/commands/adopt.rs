//! `dodot adopt`: move external files into a pack and deploy them.
//!
//! The reverse path mapping decides where an adopted file lands inside the
//! pack; the symlink handler then installs the two-hop chain, so the file's
//! original location becomes a managed link in the same run.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};

use crate::actions::{ActionRunner, ExecuteRunner};
use crate::checksum::ChecksumCache;
use crate::cli::{AdoptOpts, GlobalOpts};
use crate::datastore::{Datastore, copy_recursive};
use crate::fsys::FileSystem;
use crate::handlers::{FileInput, HandlerCtx, HandlerKind};
use crate::logging::Logger;
use crate::packs::{Pack, discovery};
use crate::paths::{Paths, mapping};

use super::{EXIT_OK, EXIT_PACK_FAILURES, Session};

/// Move one external file into `pack` and deploy its symlink chain.
///
/// # Errors
///
/// Returns an error if the file does not exist, cannot be mapped to a
/// pack-relative path, already exists in the pack (without `force`), or
/// cannot be moved or linked.
pub fn adopt_file(
    fs: &dyn FileSystem,
    paths: &Paths,
    datastore: &Datastore<'_>,
    checksums: &ChecksumCache,
    runner: &dyn ActionRunner,
    pack: &Pack,
    external: &Path,
    force: bool,
) -> Result<PathBuf> {
    if !fs.lexists(external) {
        bail!("{} does not exist", external.display());
    }
    if fs.is_symlink(external) {
        bail!(
            "{} is a symlink; adopt the file it points to instead",
            external.display()
        );
    }

    let relative = mapping::map_system_file_to_pack(paths, &pack.config, external)?;
    let dest = pack.path.join(&relative);
    if fs.lexists(&dest) && !force {
        bail!(
            "{} already exists in pack {} (use --force to overwrite)",
            relative.display(),
            pack.name
        );
    }
    if let Some(parent) = dest.parent() {
        fs.create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    // Prefer an atomic move; fall back to copy + delete across filesystems.
    if fs.rename(external, &dest).is_err() {
        copy_recursive(fs, external, &dest)
            .with_context(|| format!("moving {} into the pack", external.display()))?;
        if fs.is_dir(external) {
            fs.remove_dir_all(external)
        } else {
            fs.remove_file(external)
        }
        .with_context(|| format!("removing {}", external.display()))?;
    }

    let hctx = HandlerCtx {
        fs,
        paths,
        datastore,
        checksums,
        config: &pack.config,
        force,
    };
    let input = FileInput {
        pack_name: pack.name.clone(),
        source_path: dest,
        relative_path: relative.clone(),
        options: std::collections::BTreeMap::new(),
    };
    let action = HandlerKind::Symlink.deploy(&input, &hctx)?;
    runner.run(&action)?;
    Ok(relative)
}

/// Run `dodot adopt` against the real filesystem.
///
/// # Errors
///
/// Returns an error on discovery or selection failure; per-file failures
/// produce the partial exit code instead.
pub fn run(global: &GlobalOpts, opts: &AdoptOpts, log: &Logger) -> Result<i32> {
    let session = Session::new(global, log)?;
    let datastore = Datastore::new(&session.fs, &session.paths);
    let runner = ExecuteRunner::new(&session.fs, &datastore, &session.executor, log, opts.force);

    let discovered = discovery::discover_packs(
        &session.fs,
        session.paths.dotfiles_root(),
        &session.paths.root_config_file(),
    )?;
    let selected = discovery::select_packs(discovered, &[opts.pack.clone()])?;
    let Some(pack) = selected.first() else {
        bail!("pack(s) not found: [{}]", opts.pack);
    };

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let mut failures = 0usize;
    for file in &opts.files {
        let absolute = if file.is_absolute() {
            file.clone()
        } else {
            cwd.join(file)
        };
        match adopt_file(
            &session.fs,
            &session.paths,
            &datastore,
            &session.checksums,
            &runner,
            pack,
            &absolute,
            opts.force,
        ) {
            Ok(relative) => log.info(&format!(
                "adopted {} as {}/{}",
                absolute.display(),
                pack.name,
                relative.display()
            )),
            Err(e) => {
                failures += 1;
                log.error(&format!("{}: {e:#}", absolute.display()));
            }
        }
    }

    Ok(if failures > 0 {
        EXIT_PACK_FAILURES
    } else {
        EXIT_OK
    })
}
