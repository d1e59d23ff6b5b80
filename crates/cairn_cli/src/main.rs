//! Cairn CLI
//!
//! Command-line tools for Cairn record store files.
//!
//! # Commands
//!
//! - `inspect` - Display store file statistics and table row counts
//! - `backup` - Copy the store file into a backup folder

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cairn command-line record store tools.
#[derive(Parser)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display store file statistics and table row counts
    Inspect,

    /// Copy the store file into a backup folder
    Backup {
        /// Destination folder for the timestamped copy
        #[arg(short, long)]
        destination: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path)?;
        }
        Commands::Backup { destination } => {
            let path = cli.path.ok_or("Store path required for backup")?;
            commands::backup::run(&path, &destination)?;
        }
        Commands::Version => {
            println!("Cairn CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
