//! Process execution behind the [`Executor`] trait for test injection.
//!
//! The engine shells out in exactly two places: running a pack's
//! provisioning script (`sh -c <script>`) and applying a Homebrew bundle
//! (`brew bundle`). Both go through [`Executor`] so tests can observe the
//! commands without spawning processes.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Standard output as UTF-8 string.
    pub stdout: String,
    /// Standard error as UTF-8 string.
    pub stderr: String,
    /// Whether the command exited successfully (status code 0).
    pub success: bool,
    /// Exit code if available, or None if terminated by signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Execute a command and return the result, bailing on non-zero exit.
fn execute_checked(mut cmd: Command, label: &str) -> Result<ExecResult> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to execute: {label}"))?;
    let result = ExecResult::from(output);
    if !result.success {
        let code = result.code.unwrap_or(-1);
        bail!("{label} failed (exit {code}): {}", result.stderr.trim());
    }
    Ok(result)
}

/// Trait for executing system commands, enabling test injection.
///
/// Implement this trait to provide mock executors for unit tests.
/// The [`SystemExecutor`] implementation spawns real processes.
pub trait Executor: std::fmt::Debug + Send + Sync {
    /// Execute a command in a specific directory, bailing on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails to execute, the directory does
    /// not exist, or the command exits with a non-zero status code.
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(dir);
        execute_checked(cmd, &format!("{program} in {}", dir.display()))
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Shared test helpers for executor-dependent unit tests.
///
/// Provides a configurable [`MockExecutor`] so individual test modules do
/// not have to duplicate the boilerplate.
#[cfg(test)]
pub mod test_helpers {
    use super::{ExecResult, Executor};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// A recording mock executor.
    ///
    /// Every `run_in` call is recorded as `(dir, program, args)` and answered
    /// with the configured response (success by default). `which` returns the
    /// configured value (default `true`).
    #[derive(Debug)]
    pub struct MockExecutor {
        /// Recorded `(dir, program, args)` triples, in call order.
        pub calls: Mutex<Vec<(PathBuf, String, Vec<String>)>>,
        /// Whether `run_in` reports success.
        pub succeed: bool,
        /// Value returned by every `which` call.
        pub which_result: bool,
    }

    impl Default for MockExecutor {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockExecutor {
        /// Create a mock whose commands all succeed.
        #[must_use]
        pub fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                succeed: true,
                which_result: true,
            }
        }

        /// Create a mock whose commands all fail.
        #[must_use]
        pub fn failing() -> Self {
            Self {
                succeed: false,
                ..Self::new()
            }
        }

        /// Number of `run_in` calls made so far.
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.calls.lock().map_or(0, |g| g.len())
        }
    }

    impl Executor for MockExecutor {
        fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            if let Ok(mut guard) = self.calls.lock() {
                guard.push((
                    dir.to_path_buf(),
                    program.to_string(),
                    args.iter().map(ToString::to_string).collect(),
                ));
            }
            if self.succeed {
                Ok(ExecResult {
                    stdout: String::new(),
                    stderr: String::new(),
                    success: true,
                    code: Some(0),
                })
            } else {
                anyhow::bail!("mock command failed")
            }
        }

        fn which(&self, _: &str) -> bool {
            self.which_result
        }
    }
}
