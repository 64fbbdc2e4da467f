//! LoamDB CLI
//!
//! Command-line tools for running and inspecting a LoamDB data directory.
//!
//! # Commands
//!
//! - `serve` - Run the platform with its write consumer and TCP server
//! - `inspect` - Display catalog metadata for a data directory
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LoamDB command-line tools.
#[derive(Parser)]
#[command(name = "loamdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
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
    /// Run the platform and serve requests over TCP
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:7207")]
        bind: SocketAddr,

        /// Keep all data in memory (nothing survives shutdown)
        #[arg(long)]
        in_memory: bool,

        /// Flush backing stores after every applied write
        #[arg(long)]
        flush_on_write: bool,
    },

    /// Display catalog metadata for a data directory
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            bind,
            in_memory,
            flush_on_write,
        } => {
            let path = cli.path.ok_or("Data directory path required for serve")?;
            commands::serve::run(&path, bind, in_memory, flush_on_write)?;
        }
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Data directory path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Version => {
            println!("LoamDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("LoamDB Core v{}", loamdb_core::VERSION);
        }
    }

    Ok(())
}
