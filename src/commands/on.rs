//! `dodot on`: deploy packs into the live environment.

use anyhow::Result;

use crate::actions::{ActionOutcome, DryRunRunner, ExecuteRunner};
use crate::cli::{GlobalOpts, OnOpts};
use crate::datastore::Datastore;
use crate::handlers::{FileInput, HandlerClass, HandlerCtx};
use crate::logging::Logger;
use crate::packs::Pack;
use crate::pipeline::{self, CommandCtx, ExecutionOptions, PackCommand, PackResult};
use crate::rules;

use super::{EXIT_OK, EXIT_PACK_FAILURES, Session};

/// The deploying command: configuration handlers always, code-execution
/// handlers unless `--no-provision`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnCommand;

impl PackCommand for OnCommand {
    fn name(&self) -> &'static str {
        "on"
    }

    fn execute_for_pack(&self, pack: &Pack, ctx: &CommandCtx<'_>) -> PackResult {
        if pack.ignored {
            ctx.log
                .info(&format!("{}: ignored, skipping", pack.name));
            return PackResult::success(&pack.name);
        }

        let matches = match rules::match_pack(ctx.fs, pack) {
            Ok(matches) => matches,
            Err(e) => return PackResult::failure(&pack.name, format!("{e:#}")),
        };

        let hctx = HandlerCtx {
            fs: ctx.fs,
            paths: ctx.paths,
            datastore: ctx.datastore,
            checksums: ctx.checksums,
            config: &pack.config,
            force: ctx.opts.force,
        };

        let mut result = PackResult::success(&pack.name);
        let mut errors = Vec::new();
        for m in &matches {
            if ctx.opts.no_provision && m.handler.class() == HandlerClass::CodeExecution {
                ctx.log.debug(&format!(
                    "{}: skipping {} ({} disabled by --no-provision)",
                    pack.name,
                    m.relative_path.display(),
                    m.handler.name()
                ));
                result.skipped += 1;
                continue;
            }
            let input = FileInput::from_match(m);
            let outcome = m
                .handler
                .deploy(&input, &hctx)
                .and_then(|action| ctx.runner.run(&action));
            match outcome {
                Ok(ActionOutcome::Applied) => result.deployed += 1,
                Ok(ActionOutcome::AlreadyCorrect | ActionOutcome::DryRun) => result.skipped += 1,
                Err(e) => errors.push(format!("{}: {e:#}", m.relative_path.display())),
            }
        }

        if !errors.is_empty() {
            result.success = false;
            result.error = Some(errors.join("; "));
        }
        result
    }
}

/// Run `dodot on` against the real filesystem.
///
/// # Errors
///
/// Returns an error on discovery or selection failure; per-pack failures
/// are reflected in the exit code instead.
pub fn run(global: &GlobalOpts, opts: &OnOpts, log: &Logger) -> Result<i32> {
    let session = Session::new(global, log)?;
    let datastore = Datastore::new(&session.fs, &session.paths);
    let exec_opts = ExecutionOptions {
        force: opts.force,
        dry_run: global.dry_run,
        no_provision: opts.no_provision,
    };

    if !global.dry_run {
        datastore.ensure_init_script()?;
    }

    let dry_runner = DryRunRunner::new(log);
    let exec_runner = ExecuteRunner::new(&session.fs, &datastore, &session.executor, log, opts.force);
    let ctx = CommandCtx {
        fs: &session.fs,
        paths: &session.paths,
        datastore: &datastore,
        checksums: &session.checksums,
        runner: if global.dry_run {
            &dry_runner
        } else {
            &exec_runner
        },
        log,
        opts: exec_opts,
    };

    let result = pipeline::execute(&OnCommand, &ctx, &opts.packs)?;
    pipeline::log_summary(&result, log);
    Ok(if result.all_successful() {
        EXIT_OK
    } else {
        EXIT_PACK_FAILURES
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumCache;
    use crate::exec::test_helpers::MockExecutor;
    use crate::fsys::{FileSystem, MemoryFileSystem};
    use crate::paths::{Env, Paths};
    use crate::pipeline::ExecutionResult;
    use std::path::Path;

    struct Harness {
        fs: MemoryFileSystem,
        paths: Paths,
        exec: MockExecutor,
    }

    impl Harness {
        fn new() -> Self {
            let fs = MemoryFileSystem::new();
            fs.create_dir_all(Path::new("/dotfiles")).unwrap();
            fs.create_dir_all(Path::new("/home/user")).unwrap();
            let paths = Paths::resolve_with(
                Some(Path::new("/dotfiles")),
                &Env::empty().with_var("HOME", "/home/user"),
                Path::new("/cwd"),
                None,
            )
            .unwrap();
            Self {
                fs,
                paths,
                exec: MockExecutor::new(),
            }
        }

        fn on(&self, packs: &[&str], opts: ExecutionOptions) -> ExecutionResult {
            let datastore = Datastore::new(&self.fs, &self.paths);
            let checksums = ChecksumCache::new();
            let log = Logger::new();
            let dry_runner = DryRunRunner::new(&log);
            let exec_runner =
                ExecuteRunner::new(&self.fs, &datastore, &self.exec, &log, opts.force);
            let ctx = CommandCtx {
                fs: &self.fs,
                paths: &self.paths,
                datastore: &datastore,
                checksums: &checksums,
                runner: if opts.dry_run {
                    &dry_runner
                } else {
                    &exec_runner
                },
                log: &log,
                opts,
            };
            let names: Vec<String> = packs.iter().map(ToString::to_string).collect();
            pipeline::execute(&OnCommand, &ctx, &names).expect("pipeline")
        }
    }

    #[test]
    fn deploys_symlink_pack_end_to_end() {
        let h = Harness::new();
        h.fs.create_dir_all(Path::new("/dotfiles/vim")).unwrap();
        h.fs.write(Path::new("/dotfiles/vim/vimrc"), b"set number")
            .unwrap();

        let result = h.on(&["vim"], ExecutionOptions::default());
        assert_eq!(result.failed, 0);
        assert_eq!(result.pack_results[0].deployed, 1);

        // Two-hop chain in place.
        let intermediate = h
            .paths
            .deployed_symlink_dir()
            .join("vim/symlink/vimrc");
        assert_eq!(
            h.fs.read_link(Path::new("/home/user/.vimrc")).unwrap(),
            intermediate
        );
        assert_eq!(
            h.fs.read_link(&intermediate).unwrap(),
            Path::new("/dotfiles/vim/vimrc")
        );
    }

    #[test]
    fn second_run_converges_with_no_new_work() {
        let h = Harness::new();
        h.fs.create_dir_all(Path::new("/dotfiles/vim")).unwrap();
        h.fs.write(Path::new("/dotfiles/vim/vimrc"), b"set number")
            .unwrap();

        let first = h.on(&["vim"], ExecutionOptions::default());
        assert_eq!(first.pack_results[0].deployed, 1);

        let second = h.on(&["vim"], ExecutionOptions::default());
        assert_eq!(second.pack_results[0].deployed, 0);
        assert_eq!(second.pack_results[0].skipped, 1);
        assert_eq!(second.failed, 0);
    }

    #[test]
    fn install_scripts_run_once_per_content() {
        let h = Harness::new();
        h.fs.create_dir_all(Path::new("/dotfiles/app")).unwrap();
        h.fs.write(Path::new("/dotfiles/app/install.sh"), b"#!/bin/sh\necho hi")
            .unwrap();

        let first = h.on(&["app"], ExecutionOptions::default());
        assert_eq!(first.failed, 0);
        assert_eq!(h.exec.call_count(), 1);

        // Unchanged content: zero additional executions.
        let second = h.on(&["app"], ExecutionOptions::default());
        assert_eq!(second.failed, 0);
        assert_eq!(h.exec.call_count(), 1);

        // Changed content: exactly one more execution.
        h.fs.write(Path::new("/dotfiles/app/install.sh"), b"#!/bin/sh\necho hi\n")
            .unwrap();
        let third = h.on(&["app"], ExecutionOptions::default());
        assert_eq!(third.failed, 0);
        assert_eq!(h.exec.call_count(), 2);
    }

    #[test]
    fn no_provision_skips_code_execution_handlers() {
        let h = Harness::new();
        h.fs.create_dir_all(Path::new("/dotfiles/app")).unwrap();
        h.fs.write(Path::new("/dotfiles/app/install.sh"), b"#!/bin/sh")
            .unwrap();
        h.fs.write(Path::new("/dotfiles/app/apprc"), b"").unwrap();

        let result = h.on(
            &["app"],
            ExecutionOptions {
                no_provision: true,
                ..ExecutionOptions::default()
            },
        );
        assert_eq!(result.failed, 0);
        assert_eq!(h.exec.call_count(), 0);
        // The symlink still deployed.
        assert!(h.fs.lexists(Path::new("/home/user/.apprc")));
    }

    #[test]
    fn dry_run_plans_without_mutating() {
        let h = Harness::new();
        h.fs.create_dir_all(Path::new("/dotfiles/vim")).unwrap();
        h.fs.write(Path::new("/dotfiles/vim/vimrc"), b"").unwrap();
        h.fs.write(Path::new("/dotfiles/vim/install.sh"), b"x").unwrap();

        let result = h.on(
            &["vim"],
            ExecutionOptions {
                dry_run: true,
                ..ExecutionOptions::default()
            },
        );
        assert_eq!(result.failed, 0);
        assert_eq!(h.exec.call_count(), 0);
        assert!(!h.fs.lexists(Path::new("/home/user/.vimrc")));
        assert!(!h.fs.lexists(&h.paths.deployed_symlink_dir()));
    }

    #[test]
    fn ignored_packs_are_skipped() {
        let h = Harness::new();
        h.fs.create_dir_all(Path::new("/dotfiles/vim")).unwrap();
        h.fs.write(Path::new("/dotfiles/vim/vimrc"), b"").unwrap();
        h.fs.write(Path::new("/dotfiles/vim/.dodotignore"), b"").unwrap();

        let result = h.on(&[], ExecutionOptions::default());
        assert_eq!(result.failed, 0);
        assert!(!h.fs.lexists(Path::new("/home/user/.vimrc")));
    }

    #[test]
    fn runner_is_not_consulted_for_ignored_packs() {
        let h = Harness::new();
        h.fs.create_dir_all(Path::new("/dotfiles/vim")).unwrap();
        h.fs.write(Path::new("/dotfiles/vim/vimrc"), b"").unwrap();
        h.fs.write(Path::new("/dotfiles/vim/.dodotignore"), b"").unwrap();

        let mut runner = crate::actions::runner::MockActionRunner::new();
        runner.expect_run().times(0);

        let datastore = Datastore::new(&h.fs, &h.paths);
        let checksums = ChecksumCache::new();
        let log = Logger::new();
        let ctx = CommandCtx {
            fs: &h.fs,
            paths: &h.paths,
            datastore: &datastore,
            checksums: &checksums,
            runner: &runner,
            log: &log,
            opts: ExecutionOptions::default(),
        };
        let result = pipeline::execute(&OnCommand, &ctx, &[]).expect("pipeline");
        assert_eq!(result.failed, 0);
    }

    #[test]
    fn conflict_marks_pack_failed_but_other_packs_continue() {
        let h = Harness::new();
        h.fs.create_dir_all(Path::new("/dotfiles/vim")).unwrap();
        h.fs.write(Path::new("/dotfiles/vim/vimrc"), b"").unwrap();
        h.fs.create_dir_all(Path::new("/dotfiles/zsh")).unwrap();
        h.fs.write(Path::new("/dotfiles/zsh/zshrc"), b"").unwrap();
        // Occupy vim's target with a foreign file.
        h.fs.write(Path::new("/home/user/.vimrc"), b"mine").unwrap();

        let result = h.on(&[], ExecutionOptions::default());
        assert_eq!(result.failed, 1);
        assert_eq!(result.error.as_deref(), Some("1 pack(s) failed"));
        let vim = result
            .pack_results
            .iter()
            .find(|r| r.pack_name == "vim")
            .unwrap();
        assert!(!vim.success);
        // zsh still deployed.
        assert!(h.fs.lexists(Path::new("/home/user/.zshrc")));
    }

    #[test]
    fn force_home_pack_deploys_to_home() {
        let h = Harness::new();
        h.fs.create_dir_all(Path::new("/dotfiles/ssh-pack/ssh")).unwrap();
        h.fs.write(Path::new("/dotfiles/ssh-pack/ssh/config"), b"Host *")
            .unwrap();
        h.fs.write(Path::new("/dotfiles/dodot.toml"), b"force_home = [\"ssh\"]\n")
            .unwrap();

        let result = h.on(&["ssh-pack"], ExecutionOptions::default());
        assert_eq!(result.failed, 0);
        assert!(h.fs.is_symlink(Path::new("/home/user/.ssh/config")));
        assert!(!h.fs.lexists(Path::new("/home/user/.config/ssh/config")));
    }
}
