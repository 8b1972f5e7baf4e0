//! Command-line surface.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level argument parser for the `dodot` binary.
#[derive(Parser, Debug)]
#[command(
    name = "dodot",
    about = "Pack-based dotfiles deployment manager",
    version
)]
pub struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared by every subcommand.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Override the dotfiles root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// All dodot subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy packs into the live environment
    #[command(alias = "up")]
    On(OnOpts),
    /// Undo deployments by clearing per-handler state
    Off(OffOpts),
    /// Report the status of every managed file
    Status(StatusOpts),
    /// Create a new pack with starter files
    Init(InitOpts),
    /// Add missing starter files to existing packs
    Fill(FillOpts),
    /// Move external files into a pack and deploy them
    Adopt(AdoptOpts),
    /// Print version information
    Version,
}

/// Arguments for `dodot on`.
#[derive(Parser, Debug, Clone)]
pub struct OnOpts {
    /// Packs to deploy (all when empty)
    pub packs: Vec<String>,

    /// Skip install scripts and Homebrew bundles
    #[arg(long)]
    pub no_provision: bool,

    /// Overwrite conflicting files, backing them up first
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for `dodot off`.
#[derive(Parser, Debug, Clone)]
pub struct OffOpts {
    /// Packs to turn off (all when empty)
    pub packs: Vec<String>,
}

/// Arguments for `dodot status`.
#[derive(Parser, Debug, Clone)]
pub struct StatusOpts {
    /// Packs to report on (all when empty)
    pub packs: Vec<String>,
}

/// Arguments for `dodot init`.
#[derive(Parser, Debug, Clone)]
pub struct InitOpts {
    /// Name of the pack to create
    pub name: String,
}

/// Arguments for `dodot fill`.
#[derive(Parser, Debug, Clone)]
pub struct FillOpts {
    /// Packs to fill (all when empty)
    pub packs: Vec<String>,
}

/// Arguments for `dodot adopt`.
#[derive(Parser, Debug, Clone)]
pub struct AdoptOpts {
    /// Pack that receives the files
    pub pack: String,

    /// Files to move into the pack
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Overwrite files that already exist in the pack
    #[arg(short, long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_on_with_packs_and_flags() {
        let cli = Cli::parse_from(["dodot", "on", "vim", "git", "--no-provision", "--force"]);
        match cli.command {
            Command::On(opts) => {
                assert_eq!(opts.packs, vec!["vim", "git"]);
                assert!(opts.no_provision);
                assert!(opts.force);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn up_is_an_alias_for_on() {
        let cli = Cli::parse_from(["dodot", "up", "vim"]);
        assert!(matches!(cli.command, Command::On(_)));
    }

    #[test]
    fn parse_dry_run_global() {
        let cli = Cli::parse_from(["dodot", "--dry-run", "off", "vim"]);
        assert!(cli.global.dry_run);
        assert!(matches!(cli.command, Command::Off(_)));
    }

    #[test]
    fn parse_dry_run_short() {
        let cli = Cli::parse_from(["dodot", "-d", "on"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_root_override() {
        let cli = Cli::parse_from(["dodot", "--root", "/srv/dotfiles", "status"]);
        assert_eq!(cli.global.root, Some(PathBuf::from("/srv/dotfiles")));
    }

    #[test]
    fn parse_status_without_packs() {
        let cli = Cli::parse_from(["dodot", "status"]);
        match cli.command {
            Command::Status(opts) => assert!(opts.packs.is_empty()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_init_requires_name() {
        assert!(Cli::try_parse_from(["dodot", "init"]).is_err());
        let cli = Cli::parse_from(["dodot", "init", "tmux"]);
        match cli.command {
            Command::Init(opts) => assert_eq!(opts.name, "tmux"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_adopt_requires_files() {
        assert!(Cli::try_parse_from(["dodot", "adopt", "vim"]).is_err());
        let cli = Cli::parse_from(["dodot", "adopt", "vim", "/home/u/.vimrc", "--force"]);
        match cli.command {
            Command::Adopt(opts) => {
                assert_eq!(opts.pack, "vim");
                assert_eq!(opts.files, vec![PathBuf::from("/home/u/.vimrc")]);
                assert!(opts.force);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["dodot", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["dodot", "-v", "status"]);
        assert!(cli.verbose);
    }
}
