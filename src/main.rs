mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
}

impl Context {
    /// Resolved config file path
    pub fn config_file(&self) -> Result<PathBuf> {
        paths::config_file(self.config_path.as_deref())
    }

    /// Resolved state file path
    pub fn state_file(&self) -> Result<PathBuf> {
        paths::state_file(self.state_path.as_deref())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_path: cli.config,
        state_path: cli.state,
    };

    match cli.command {
        Command::Plan(args) => commands::option_group::plan(&ctx, args.group.as_deref()),
        Command::Apply(args) => commands::option_group::apply(
            &ctx,
            args.target.group.as_deref(),
            args.dry_run,
            args.yes,
        ),
        Command::Destroy(args) => commands::option_group::destroy(&ctx, &args.name, args.yes),
        Command::Show(args) => {
            commands::option_group::show(&ctx, args.target.group.as_deref(), args.json)
        }
        Command::Validate => commands::inspect::validate(&ctx),
        Command::Fingerprint { name, port } => commands::inspect::fingerprint(&ctx, &name, port),
        Command::Identity { arn, clear } => commands::inspect::identity(&ctx, arn, clear),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "optsync", &mut io::stdout());
            Ok(())
        }
    }
}
