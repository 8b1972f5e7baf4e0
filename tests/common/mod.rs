// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed dotfiles tree with an isolated home
// and data directory, plus run helpers, so each integration test can drive
// the engine end-to-end without repeating setup boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dodot_cli::actions::{DryRunRunner, ExecuteRunner};
use dodot_cli::checksum::ChecksumCache;
use dodot_cli::commands::off::OffCommand;
use dodot_cli::commands::on::OnCommand;
use dodot_cli::datastore::Datastore;
use dodot_cli::exec::{ExecResult, Executor};
use dodot_cli::fsys::OsFileSystem;
use dodot_cli::logging::Logger;
use dodot_cli::packs::{Pack, discovery};
use dodot_cli::paths::{Env, Paths};
use dodot_cli::pipeline::{self, CommandCtx, ExecutionOptions, ExecutionResult};
use dodot_cli::status::{self, PackStatus};

/// Executor that records invocations instead of spawning processes.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    /// Recorded `(dir, program, args)` triples, in call order.
    pub calls: Mutex<Vec<(PathBuf, String, Vec<String>)>>,
}

impl RecordingExecutor {
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("executor mutex").len()
    }
}

impl Executor for RecordingExecutor {
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.calls.lock().expect("executor mutex").push((
            dir.to_path_buf(),
            program.to_string(),
            args.iter().map(ToString::to_string).collect(),
        ));
        Ok(ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        })
    }

    fn which(&self, _: &str) -> bool {
        true
    }
}

/// An isolated dotfiles environment backed by a [`tempfile::TempDir`].
///
/// Layout: `<tmp>/dotfiles` (root), `<tmp>/home` (fake `$HOME`), with the
/// data/config/state directories derived from the fake home. Deleted
/// automatically when the environment is dropped.
pub struct TestEnv {
    pub tmp: tempfile::TempDir,
    pub fs: OsFileSystem,
    pub paths: Paths,
    pub executor: RecordingExecutor,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = tmp.path().join("dotfiles");
        let home = tmp.path().join("home");
        std::fs::create_dir_all(&root).expect("create dotfiles root");
        std::fs::create_dir_all(&home).expect("create home");

        let env = Env::empty().with_var("HOME", &home.to_string_lossy());
        let paths = Paths::resolve_with(Some(&root), &env, tmp.path(), None)
            .expect("resolve paths");
        Self {
            tmp,
            fs: OsFileSystem::new(),
            paths,
            executor: RecordingExecutor::default(),
        }
    }

    pub fn root(&self) -> &Path {
        self.paths.dotfiles_root()
    }

    pub fn home(&self) -> &Path {
        self.paths.home()
    }

    /// Create a pack directory and return its path.
    pub fn pack(&self, name: &str) -> PathBuf {
        let dir = self.root().join(name);
        std::fs::create_dir_all(&dir).expect("create pack dir");
        dir
    }

    /// Write a file inside a pack, creating parent directories.
    pub fn write_pack_file(&self, pack: &str, relative: &str, content: &str) {
        let path = self.root().join(pack).join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write pack file");
    }

    /// Run `on` for the named packs (all when empty).
    pub fn on(&self, packs: &[&str]) -> ExecutionResult {
        self.run_deploy(packs, ExecutionOptions::default())
    }

    /// Run `on` with explicit options.
    pub fn run_deploy(&self, packs: &[&str], opts: ExecutionOptions) -> ExecutionResult {
        self.run_pipeline(&OnCommand, packs, opts)
    }

    /// Run `off` for the named packs (all when empty).
    pub fn off(&self, packs: &[&str]) -> ExecutionResult {
        self.run_pipeline(&OffCommand, packs, ExecutionOptions::default())
    }

    fn run_pipeline(
        &self,
        command: &dyn pipeline::PackCommand,
        packs: &[&str],
        opts: ExecutionOptions,
    ) -> ExecutionResult {
        let datastore = Datastore::new(&self.fs, &self.paths);
        let checksums = ChecksumCache::new();
        let log = Logger::new();
        let dry_runner = DryRunRunner::new(&log);
        let exec_runner =
            ExecuteRunner::new(&self.fs, &datastore, &self.executor, &log, opts.force);
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
        pipeline::execute(command, &ctx, &names).expect("pipeline run")
    }

    /// Discover and select packs the way the commands do.
    pub fn select(&self, packs: &[&str]) -> Vec<Pack> {
        let discovered = discovery::discover_packs(
            &self.fs,
            self.root(),
            &self.paths.root_config_file(),
        )
        .expect("discover packs");
        let names: Vec<String> = packs.iter().map(ToString::to_string).collect();
        discovery::select_packs(discovered, &names).expect("select packs")
    }

    /// Compute statuses for the named packs (all when empty).
    pub fn status(&self, packs: &[&str]) -> Vec<PackStatus> {
        let checksums = ChecksumCache::new();
        status::report(&self.fs, &self.paths, &checksums, &self.select(packs))
    }

    /// The intermediate link path for `(pack, relpath)` under the symlink
    /// handler.
    pub fn intermediate(&self, pack: &str, relative: &str) -> PathBuf {
        self.paths
            .deployed_symlink_dir()
            .join(pack)
            .join("symlink")
            .join(relative)
    }
}
