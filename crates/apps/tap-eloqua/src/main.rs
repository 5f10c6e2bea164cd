mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tap-eloqua",
    version,
    about = "Extract Eloqua contacts and email activities as Singer messages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the tap config JSON (default: ~/.config/tap-eloqua/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the catalog of available streams
    Discover,
    /// Validate config and credentials
    Check,
    /// Extract records since each stream's bookmark
    Sync {
        /// Stream to sync (repeatable; default: config `streams` or all)
        #[arg(long = "stream")]
        streams: Vec<String>,
        /// Singer state JSON file to resume from
        #[arg(long, conflicts_with = "state_db")]
        state: Option<PathBuf>,
        /// SQLite database holding bookmarks between runs
        #[arg(long)]
        state_db: Option<PathBuf>,
        /// Write the final state document to this file
        #[arg(long)]
        write_state: Option<PathBuf>,
        /// Sync streams concurrently
        #[arg(long)]
        parallel: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Discover => commands::discover::execute(config_path),
        Commands::Check => commands::check::execute(config_path),
        Commands::Sync {
            streams,
            state,
            state_db,
            write_state,
            parallel,
        } => commands::sync::execute(
            config_path,
            &streams,
            commands::sync::StateArgs {
                state: state.as_deref(),
                state_db: state_db.as_deref(),
                write_state: write_state.as_deref(),
            },
            parallel,
        ),
    }
}
