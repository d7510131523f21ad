mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    collab::CollabArgs, config::ConfigSubcommand, init::InitArgs, plan::PlanSubcommand,
    role::RoleSubcommand, scale::ScaleSubcommand, settings::SettingsSubcommand,
};
use prevc_core::types::RoleId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "prevc",
    about = "PREVC workflow orchestrator: Planning, Review, Execution, Validation, Confirmation",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .prevc/ or .git/)
    #[arg(long, global = true, env = "PREVC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new workflow in this project
    Init(InitArgs),

    /// Show the full workflow status
    Status,

    /// One-line progress summary
    Summary,

    /// Complete the current phase and move to the next required one
    Advance {
        /// Output produced in this phase (repeatable)
        #[arg(long = "output", value_name = "PATH")]
        outputs: Vec<String>,
        /// Advance even if a gate blocks
        #[arg(long)]
        force: bool,
    },

    /// Preview the gates for the next transition
    Gates,

    /// Start or complete a role in the current phase
    Role {
        #[command(subcommand)]
        subcommand: RoleSubcommand,
    },

    /// Hand work from one role to another within the current phase
    Handoff {
        from: RoleId,
        to: RoleId,
        /// Artifact handed over (repeatable)
        #[arg(long = "artifact", value_name = "PATH")]
        artifacts: Vec<String>,
    },

    /// Link and approve the workflow plan
    Plan {
        #[command(subcommand)]
        subcommand: PlanSubcommand,
    },

    /// Show or change workflow settings
    Settings {
        #[command(subcommand)]
        subcommand: Option<SettingsSubcommand>,
    },

    /// Recommended next actions
    Next,

    /// Show the workflow timeline
    History {
        /// Only the last N entries
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Detect a scale or show the route for one
    Scale {
        #[command(subcommand)]
        subcommand: ScaleSubcommand,
    },

    /// Run a one-shot collaboration session and print its synthesis
    Collab(CollabArgs),

    /// Validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init(args) => cmd::init::run(&root, args, cli.json),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Summary => cmd::status::summary(&root, cli.json),
        Commands::Advance { outputs, force } => {
            cmd::advance::run(&root, &outputs, force, cli.json)
        }
        Commands::Gates => cmd::advance::gates(&root, cli.json),
        Commands::Role { subcommand } => cmd::role::run(&root, subcommand, cli.json),
        Commands::Handoff {
            from,
            to,
            artifacts,
        } => cmd::role::handoff(&root, from, to, &artifacts, cli.json),
        Commands::Plan { subcommand } => cmd::plan::run(&root, subcommand, cli.json),
        Commands::Settings { subcommand } => cmd::settings::run(&root, subcommand, cli.json),
        Commands::Next => cmd::next::run(&root, cli.json),
        Commands::History { limit } => cmd::history::run(&root, limit, cli.json),
        Commands::Scale { subcommand } => cmd::scale::run(subcommand, cli.json),
        Commands::Collab(args) => cmd::collab::run(args, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
