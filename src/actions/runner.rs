//! Execution of planned actions.
//!
//! [`ExecuteRunner`] mutates the filesystem and datastore; [`DryRunRunner`]
//! logs what would happen and mutates nothing. Both consume the same
//! [`Action`] values, so a dry run exercises the full planning path.

use std::io;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::datastore::{Datastore, RunRecord, SentinelKind};
use crate::error::HandlerError;
use crate::exec::Executor;
use crate::fsys::FileSystem;
use crate::handlers::HandlerKind;
use crate::logging::Logger;

use super::Action;

/// What running one action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// State was created or updated.
    Applied,
    /// Everything was already in place.
    AlreadyCorrect,
    /// The action was logged but not executed.
    DryRun,
}

/// Executes or discards planned actions.
#[cfg_attr(test, mockall::automock)]
pub trait ActionRunner: std::fmt::Debug {
    /// Carry out (or log) one action.
    ///
    /// # Errors
    ///
    /// Returns an error if the action cannot be completed, e.g. an occupied
    /// target without `--force` or a failing provisioning command.
    fn run(&self, action: &Action) -> Result<ActionOutcome>;
}

/// Runner that logs every action instead of executing it.
#[derive(Debug, Clone, Copy)]
pub struct DryRunRunner<'a> {
    log: &'a Logger,
}

impl<'a> DryRunRunner<'a> {
    /// Create a dry-run runner.
    #[must_use]
    pub const fn new(log: &'a Logger) -> Self {
        Self { log }
    }
}

impl ActionRunner for DryRunRunner<'_> {
    fn run(&self, action: &Action) -> Result<ActionOutcome> {
        if matches!(action, Action::Noop { .. }) {
            return Ok(ActionOutcome::AlreadyCorrect);
        }
        self.log.dry_run(&action.description());
        Ok(ActionOutcome::DryRun)
    }
}

/// Runner that applies actions to the live filesystem and datastore.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteRunner<'a> {
    fs: &'a dyn FileSystem,
    datastore: &'a Datastore<'a>,
    executor: &'a dyn Executor,
    log: &'a Logger,
    force: bool,
}

impl<'a> ExecuteRunner<'a> {
    /// Create an executing runner.
    #[must_use]
    pub const fn new(
        fs: &'a dyn FileSystem,
        datastore: &'a Datastore<'a>,
        executor: &'a dyn Executor,
        log: &'a Logger,
        force: bool,
    ) -> Self {
        Self {
            fs,
            datastore,
            executor,
            log,
            force,
        }
    }

    fn link_file(
        &self,
        pack: &str,
        relative: &Path,
        source: &Path,
        target: &Path,
    ) -> Result<ActionOutcome> {
        let intermediate = self.datastore.create_intermediate_link(
            pack,
            HandlerKind::Symlink.name(),
            relative,
            source,
            self.force,
        )?;

        if self.fs.lexists(target) {
            if self.fs.read_link(target).is_ok_and(|t| t == intermediate) {
                return Ok(ActionOutcome::AlreadyCorrect);
            }
            if !self.force {
                return Err(HandlerError::Conflict {
                    target: target.to_path_buf(),
                }
                .into());
            }
            let backup = self.datastore.backup(pack, target)?;
            self.log.info(&format!(
                "moved {} to {}",
                target.display(),
                backup.display()
            ));
        }

        if let Some(parent) = target.parent() {
            self.fs
                .create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        write_link_atomic(self.fs, &intermediate, target)
            .with_context(|| format!("linking {}", target.display()))?;
        Ok(ActionOutcome::Applied)
    }

    fn link_entry(&self, entry_exists_correct: bool, install: impl FnOnce() -> Result<()>) -> Result<ActionOutcome> {
        if entry_exists_correct {
            return Ok(ActionOutcome::AlreadyCorrect);
        }
        install()?;
        Ok(ActionOutcome::Applied)
    }

    fn run_command(
        &self,
        pack: &str,
        handler: HandlerKind,
        cwd: &Path,
        program: &str,
        args: &[String],
        file_name: &str,
        checksum: &str,
    ) -> Result<ActionOutcome> {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = self
            .executor
            .run_in(cwd, program, &arg_refs)
            .with_context(|| format!("{} provisioning for pack {pack}", handler.name()))?;

        let kind = sentinel_kind(handler);
        self.datastore
            .write_sentinel(kind, pack, file_name, checksum)?;
        self.datastore.write_run_record(
            pack,
            &RunRecord {
                handler: handler.name().to_string(),
                checksum: checksum.to_string(),
                exit_code: result.code.unwrap_or(0),
                ran_at: chrono::Utc::now().to_rfc3339(),
            },
        )?;
        Ok(ActionOutcome::Applied)
    }
}

impl ActionRunner for ExecuteRunner<'_> {
    fn run(&self, action: &Action) -> Result<ActionOutcome> {
        match action {
            Action::LinkFile {
                pack,
                relative,
                source,
                target,
            } => self.link_file(pack, relative, source, target),
            Action::LinkShellProfile { pack, source } => {
                let basename = source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(ToString::to_string)
                    .context("shell profile source has no file name")?;
                let entry = self.datastore.shell_profile_entry(pack, &basename);
                let correct = self.fs.read_link(&entry).is_ok_and(|t| &t == source);
                self.link_entry(correct, || {
                    self.datastore
                        .add_shell_profile_entry(pack, source)
                        .map(|_| ())
                })
            }
            Action::LinkPath { pack, source } => {
                let dirname = source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(ToString::to_string)
                    .context("path entry source has no file name")?;
                let entry = self.datastore.path_entry(pack, &dirname);
                let correct = self.fs.read_link(&entry).is_ok_and(|t| &t == source);
                self.link_entry(correct, || {
                    self.datastore.add_path_entry(pack, source).map(|_| ())
                })
            }
            Action::RunCommand {
                pack,
                handler,
                cwd,
                program,
                args,
                file_name,
                checksum,
            } => self.run_command(pack, *handler, cwd, program, args, file_name, checksum),
            Action::Noop { reason } => {
                self.log.debug(&format!("nothing to do: {reason}"));
                Ok(ActionOutcome::AlreadyCorrect)
            }
        }
    }
}

const fn sentinel_kind(handler: HandlerKind) -> SentinelKind {
    match handler {
        HandlerKind::Homebrew => SentinelKind::Homebrew,
        _ => SentinelKind::Install,
    }
}

/// Stage a symlink at a sibling temp name and rename it into place, so the
/// target is never observed half-written.
fn write_link_atomic(fs: &dyn FileSystem, target: &Path, link: &Path) -> io::Result<()> {
    let Some(name) = link.file_name().and_then(|n| n.to_str()) else {
        return Err(io::Error::from(io::ErrorKind::InvalidInput));
    };
    let tmp = link
        .parent()
        .unwrap_or_else(|| Path::new("/"))
        .join(format!("{name}.dodot-tmp"));
    if fs.lexists(&tmp) {
        fs.remove_file(&tmp)?;
    }
    fs.symlink(target, &tmp)?;
    fs.rename(&tmp, link)
}
