//! cutdraft CLI: turn a media manifest into an editor draft.
//!
//! Usage:
//!   cutdraft '<request json>'          Generate a draft (worker mode)
//!   cutdraft generate --request <FILE> Generate from a request file ("-" for stdin)
//!   cutdraft validate <DRAFT>          Check a draft's references
//!   cutdraft info <DRAFT>              Show draft information
//!   cutdraft probe <PATHS>...          Probe media files
//!   cutdraft check                     Check system capabilities
//!
//! In generate mode stdout carries exactly one JSON response; everything
//! else goes to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cutdraft_common::config::EngineConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "cutdraft",
    about = "Assemble video editor drafts from a media manifest",
    version,
    author,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Engine config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request JSON, as a single argument
    request: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a draft from a request file
    Generate {
        /// Path to the request JSON, or "-" for stdin
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Check that every reference in a draft resolves
    Validate {
        /// Path to the draft file
        path: PathBuf,
    },

    /// Show draft information
    Info {
        /// Path to the draft file
        path: PathBuf,
    },

    /// Probe media files and print what the engine sees
    Probe {
        /// Media files to probe
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    cutdraft_common::logging::init_logging(&config.logging);

    match cli.command {
        Some(Commands::Generate { request }) => {
            Ok(commands::generate::run_file(config, &request).await)
        }
        Some(Commands::Validate { path }) => commands::validate::run(path).map(|_| ExitCode::SUCCESS),
        Some(Commands::Info { path }) => commands::info::run(path).map(|_| ExitCode::SUCCESS),
        Some(Commands::Probe { paths }) => {
            commands::probe::run(&config, paths).map(|_| ExitCode::SUCCESS)
        }
        Some(Commands::Check) => commands::check::run(&config).map(|_| ExitCode::SUCCESS),
        None => match cli.request {
            Some(raw) => Ok(commands::generate::run(config, &raw).await),
            None => {
                anyhow::bail!("no request given; pass request JSON or use `cutdraft --help`")
            }
        },
    }
}
