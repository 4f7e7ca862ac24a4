//! Emergence — emerging-status ranking of alien taxa.
//! Entry point for the `emergence` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use emergence_common::MissingScorePolicy;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emergence", version, about = "Rank taxa by emerging status")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge model outputs and write both ranking tables
    Rank {
        /// Path to emergence.toml (or set EMERGENCE_CONFIG)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Override the output directory
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// How missing statuses enter the point score: propagate or zero
        #[arg(long, value_name = "POLICY")]
        missing_policy: Option<MissingScorePolicy>,
    },
    /// Print the top rows of a ranking table
    Show {
        table: PathBuf,
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Print the effective gain-factor table
    GainFactors {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Write a default configuration file
    InitConfig {
        #[arg(default_value = emergence_common::config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("emergence=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Rank { config, output_dir, missing_policy } => {
            commands::rank(config.as_deref(), output_dir, missing_policy).await
        }
        Command::Show { table, top } => commands::show(&table, top).await,
        Command::GainFactors { config } => commands::gain_factors(config.as_deref()),
        Command::InitConfig { path, force } => commands::init_config(&path, force),
    }
}
