//! `dodot off`: undo deployments by clearing per-handler state.

use anyhow::Result;

use crate::actions::ExecuteRunner;
use crate::cli::{GlobalOpts, OffOpts};
use crate::datastore::Datastore;
use crate::handlers::{HandlerCtx, HandlerKind};
use crate::logging::Logger;
use crate::packs::Pack;
use crate::pipeline::{self, CommandCtx, ExecutionOptions, PackCommand, PackResult};

use super::{EXIT_OK, EXIT_PACK_FAILURES, Session};

/// The clearing command: for every handler with recorded state, remove it.
#[derive(Debug, Default, Clone, Copy)]
pub struct OffCommand;

impl PackCommand for OffCommand {
    fn name(&self) -> &'static str {
        "off"
    }

    fn execute_for_pack(&self, pack: &Pack, ctx: &CommandCtx<'_>) -> PackResult {
        if pack.ignored {
            ctx.log
                .info(&format!("{}: ignored, skipping", pack.name));
            return PackResult::success(&pack.name);
        }

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
        for kind in HandlerKind::ALL {
            if !ctx.datastore.has_handler_state(&pack.name, kind) {
                continue;
            }
            if ctx.opts.dry_run {
                ctx.log.dry_run(&format!(
                    "would clear {} state for {}",
                    kind.name(),
                    pack.name
                ));
                result.skipped += 1;
                continue;
            }
            match kind.clear(pack, &hctx) {
                Ok(()) => result.deployed += 1,
                Err(e) => errors.push(format!("{}: {e:#}", kind.name())),
            }
        }

        if !errors.is_empty() {
            result.success = false;
            result.error = Some(errors.join("; "));
        }
        result
    }
}

/// Run `dodot off` against the real filesystem.
///
/// # Errors
///
/// Returns an error on discovery or selection failure; per-pack failures
/// are reflected in the exit code instead.
pub fn run(global: &GlobalOpts, opts: &OffOpts, log: &Logger) -> Result<i32> {
    let session = Session::new(global, log)?;
    let datastore = Datastore::new(&session.fs, &session.paths);
    let exec_opts = ExecutionOptions {
        dry_run: global.dry_run,
        ..ExecutionOptions::default()
    };

    let exec_runner = ExecuteRunner::new(&session.fs, &datastore, &session.executor, log, false);
    let ctx = CommandCtx {
        fs: &session.fs,
        paths: &session.paths,
        datastore: &datastore,
        checksums: &session.checksums,
        runner: &exec_runner,
        log,
        opts: exec_opts,
    };

    let result = pipeline::execute(&OffCommand, &ctx, &opts.packs)?;
    pipeline::log_summary(&result, log);
    Ok(if result.all_successful() {
        EXIT_OK
    } else {
        EXIT_PACK_FAILURES
    })
}
