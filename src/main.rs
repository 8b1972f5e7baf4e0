//! dodot binary entry point.
use clap::Parser;
use dodot_cli::{cli, commands, logging};

/// Exit code for discovery, selection, and usage errors.
const EXIT_USAGE: i32 = 2;

fn main() {
    let args = cli::Cli::parse();
    let command_name = match &args.command {
        cli::Command::On(_) => "on",
        cli::Command::Off(_) => "off",
        cli::Command::Status(_) => "status",
        cli::Command::Init(_) => "init",
        cli::Command::Fill(_) => "fill",
        cli::Command::Adopt(_) => "adopt",
        cli::Command::Version => "version",
    };
    logging::init_subscriber(args.verbose, command_name);
    let log = logging::Logger::new();

    let result = match args.command {
        cli::Command::On(opts) => commands::on::run(&args.global, &opts, &log),
        cli::Command::Off(opts) => commands::off::run(&args.global, &opts, &log),
        cli::Command::Status(opts) => commands::status::run(&args.global, &opts, &log),
        cli::Command::Init(opts) => commands::init::run(&args.global, &opts, &log),
        cli::Command::Fill(opts) => commands::fill::run(&args.global, &opts, &log),
        cli::Command::Adopt(opts) => commands::adopt::run(&args.global, &opts, &log),
        cli::Command::Version => {
            let version = option_env!("DODOT_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            log.info(&format!("dodot {version}"));
            return;
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            log.error(&format!("{e:#}"));
            std::process::exit(EXIT_USAGE);
        }
    }
}
