use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "optsync")]
#[command(version)]
#[command(about = "Reconcile DB option groups against a declared configuration", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to ~/.config/optsync/config.toml)
    #[arg(long, global = true, env = "OPTSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file (defaults to ~/.local/state/optsync/state.toml)
    #[arg(long, global = true, env = "OPTSYNC_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(GroupArgs),

    /// Reconcile an option group with its declaration
    Apply(ApplyArgs),

    /// Delete an option group from state
    Destroy(DestroyArgs),

    /// Show the stored state of an option group
    Show(ShowArgs),

    /// Validate the config file
    Validate,

    /// Print the fingerprint of an option
    Fingerprint {
        /// Option name, e.g. MEMCACHED
        name: String,

        /// Option port
        #[arg(short, long)]
        port: Option<u32>,
    },

    /// Record or clear the caller identity used to build ARNs
    Identity {
        /// Caller ARN, e.g. arn:aws:iam::123456789012:user/deploy
        #[arg(conflicts_with = "clear")]
        arn: Option<String>,

        /// Forget the recorded identity
        #[arg(long)]
        clear: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Option group arguments
// ============================================================================

#[derive(Args)]
pub struct GroupArgs {
    /// Option group name (may be omitted when only one is declared)
    #[arg(short, long)]
    pub group: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: GroupArgs,

    /// Dry run - compute the delta but change nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Option group name
    pub name: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub target: GroupArgs,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}
