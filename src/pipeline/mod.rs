//! The pack execution pipeline.
//!
//! Discover packs, select the requested subset, hand each pack to the
//! command, and aggregate per-pack results. Per-pack failures never abort
//! the run; selection and discovery failures do.

use anyhow::Result;
use serde::Serialize;

use crate::actions::ActionRunner;
use crate::checksum::ChecksumCache;
use crate::datastore::Datastore;
use crate::fsys::FileSystem;
use crate::logging::Logger;
use crate::packs::{Pack, discovery};
use crate::paths::Paths;

/// Flags shared by the deploying commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionOptions {
    /// Overwrite conflicting state, backing up displaced files.
    pub force: bool,
    /// Plan and log actions without mutating anything.
    pub dry_run: bool,
    /// Skip code-execution handlers.
    pub no_provision: bool,
}

/// Outcome of one pack.
#[derive(Debug, Clone, Serialize)]
pub struct PackResult {
    /// Pack name.
    pub pack_name: String,
    /// Whether every operation for the pack succeeded.
    pub success: bool,
    /// Joined single-line failure messages, if any.
    pub error: Option<String>,
    /// Number of actions that changed state.
    pub deployed: usize,
    /// Number of operations that were already satisfied or skipped.
    pub skipped: usize,
}

impl PackResult {
    /// A successful result with no work recorded.
    #[must_use]
    pub fn success(pack_name: impl Into<String>) -> Self {
        Self {
            pack_name: pack_name.into(),
            success: true,
            error: None,
            deployed: 0,
            skipped: 0,
        }
    }

    /// A failed result carrying one message.
    #[must_use]
    pub fn failure(pack_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            pack_name: pack_name.into(),
            success: false,
            error: Some(error.into()),
            deployed: 0,
            skipped: 0,
        }
    }
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Command that ran (`on`, `off`, ...).
    pub command: String,
    /// Number of packs processed.
    pub total: usize,
    /// Number of successful packs.
    pub successful: usize,
    /// Number of failed packs.
    pub failed: usize,
    /// Per-pack results in pack-name order.
    pub pack_results: Vec<PackResult>,
    /// Summary error when any pack failed.
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Whether every pack succeeded.
    #[must_use]
    pub const fn all_successful(&self) -> bool {
        self.failed == 0
    }
}

/// Everything a command may use while processing one pack.
#[derive(Debug, Clone, Copy)]
pub struct CommandCtx<'a> {
    /// Filesystem capability.
    pub fs: &'a dyn FileSystem,
    /// Resolved path set.
    pub paths: &'a Paths,
    /// Datastore view.
    pub datastore: &'a Datastore<'a>,
    /// Per-run checksum cache.
    pub checksums: &'a ChecksumCache,
    /// Action runner (executing or dry-run).
    pub runner: &'a dyn ActionRunner,
    /// Logger.
    pub log: &'a Logger,
    /// Shared command flags.
    pub opts: ExecutionOptions,
}

/// A command that processes packs one at a time through the pipeline.
pub trait PackCommand: std::fmt::Debug {
    /// Command name used in results and summaries.
    fn name(&self) -> &'static str;

    /// Process one pack. Failures are reported through the result, never
    /// by aborting the run.
    fn execute_for_pack(&self, pack: &Pack, ctx: &CommandCtx<'_>) -> PackResult;
}

/// Run `command` over the selected packs and aggregate the results.
///
/// # Errors
///
/// Returns an error when discovery fails or a requested pack name matches
/// nothing. Per-pack failures are reported in the result instead.
pub fn execute(
    command: &dyn PackCommand,
    ctx: &CommandCtx<'_>,
    pack_names: &[String],
) -> Result<ExecutionResult> {
    let root = ctx.paths.dotfiles_root();
    let discovered = discovery::discover_packs(ctx.fs, root, &ctx.paths.root_config_file())?;
    let selected = discovery::select_packs(discovered, pack_names)?;

    let mut pack_results = Vec::with_capacity(selected.len());
    for pack in &selected {
        ctx.log.stage(&format!("{} {}", command.name(), pack.name));
        pack_results.push(command.execute_for_pack(pack, ctx));
    }

    let total = pack_results.len();
    let successful = pack_results.iter().filter(|r| r.success).count();
    let failed = total - successful;
    Ok(ExecutionResult {
        command: command.name().to_string(),
        total,
        successful,
        failed,
        pack_results,
        error: (failed > 0).then(|| format!("{failed} pack(s) failed")),
    })
}

/// Log the run summary for an aggregate result.
pub fn log_summary(result: &ExecutionResult, log: &Logger) {
    log.info(&format!(
        "{}: {} successful, {} failed",
        result.command, result.successful, result.failed
    ));
    for pack in &result.pack_results {
        if let Some(error) = &pack.error {
            log.error(&format!("{}: {error}", pack.pack_name));
        } else if pack.deployed > 0 || pack.skipped > 0 {
            log.info(&format!(
                "{}: {} applied, {} up to date",
                pack.pack_name, pack.deployed, pack.skipped
            ));
        }
    }
}
