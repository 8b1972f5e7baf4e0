//! Action descriptions produced by handlers.
//!
//! Handlers plan; the [`runner`](crate::actions::runner) executes. Keeping
//! the two apart puts dry-run and real runs on the same code path: a dry run
//! plans exactly the same actions and hands them to a runner that only logs.

pub mod runner;

pub use runner::{ActionOutcome, ActionRunner, DryRunRunner, ExecuteRunner};

use std::path::PathBuf;

use crate::handlers::HandlerKind;

/// One unit of work planned by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Install the two-hop symlink chain for one pack file:
    /// intermediate link in the datastore, user-visible link at `target`.
    LinkFile {
        /// Owning pack.
        pack: String,
        /// Pack-relative path (names the intermediate link).
        relative: PathBuf,
        /// Absolute path of the pack file.
        source: PathBuf,
        /// User-visible deployment target.
        target: PathBuf,
    },
    /// Install a shell-profile entry sourced at login.
    LinkShellProfile {
        /// Owning pack.
        pack: String,
        /// Absolute path of the pack file.
        source: PathBuf,
    },
    /// Install a PATH entry for a pack directory.
    LinkPath {
        /// Owning pack.
        pack: String,
        /// Absolute path of the pack directory.
        source: PathBuf,
    },
    /// Run a one-shot provisioning command, then record its sentinel.
    RunCommand {
        /// Owning pack.
        pack: String,
        /// Handler that planned the command (install or homebrew).
        handler: HandlerKind,
        /// Working directory for the command (the pack directory).
        cwd: PathBuf,
        /// Program to invoke.
        program: String,
        /// Program arguments.
        args: Vec<String>,
        /// Source file name, used as the sentinel prefix.
        file_name: String,
        /// Checksum of the source at planning time.
        checksum: String,
    },
    /// Nothing to do; the reason is surfaced in logs.
    Noop {
        /// Why no work is required.
        reason: String,
    },
}

impl Action {
    /// Single-line human description, used for dry-run output.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::LinkFile { target, source, .. } => {
                format!("link {} -> {}", target.display(), source.display())
            }
            Self::LinkShellProfile { source, .. } => {
                format!("source {} at login", source.display())
            }
            Self::LinkPath { source, .. } => {
                format!("add {} to PATH", source.display())
            }
            Self::RunCommand {
                program,
                args,
                cwd,
                ..
            } => {
                format!("run `{program} {}` in {}", args.join(" "), cwd.display())
            }
            Self::Noop { reason } => format!("nothing to do ({reason})"),
        }
    }

    /// Name of the pack this action belongs to, if any.
    #[must_use]
    pub fn pack(&self) -> Option<&str> {
        match self {
            Self::LinkFile { pack, .. }
            | Self::LinkShellProfile { pack, .. }
            | Self::LinkPath { pack, .. }
            | Self::RunCommand { pack, .. } => Some(pack),
            Self::Noop { .. } => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_are_single_line() {
        let actions = [
            Action::LinkFile {
                pack: "vim".to_string(),
                relative: PathBuf::from("vimrc"),
                source: PathBuf::from("/dotfiles/vim/vimrc"),
                target: PathBuf::from("/home/user/.vimrc"),
            },
            Action::RunCommand {
                pack: "app".to_string(),
                handler: HandlerKind::Install,
                cwd: PathBuf::from("/dotfiles/app"),
                program: "sh".to_string(),
                args: vec!["-c".to_string(), "/dotfiles/app/install.sh".to_string()],
                file_name: "install.sh".to_string(),
                checksum: "abcd".to_string(),
            },
            Action::Noop {
                reason: "already run".to_string(),
            },
        ];
        for action in actions {
            let description = action.description();
            assert!(!description.contains('\n'));
            assert!(!description.is_empty());
        }
    }

    #[test]
    fn pack_accessor() {
        let action = Action::LinkPath {
            pack: "tools".to_string(),
            source: PathBuf::from("/dotfiles/tools/bin"),
        };
        assert_eq!(action.pack(), Some("tools"));
        assert_eq!(
            Action::Noop {
                reason: String::new()
            }
            .pack(),
            None
        );
    }
}
