//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Recur - Find the charges that keep coming back
#[derive(Parser)]
#[command(name = "recur")]
#[command(about = "Recurring transaction detector", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "recur.db", global = true)]
    pub db: PathBuf,

    /// User whose transactions and patterns to use
    #[arg(short, long, default_value = "default", global = true)]
    pub user: String,

    /// Detection policy file (TOML)
    ///
    /// Without this flag, ~/.local/share/recur/config/detection.toml is used
    /// if present, otherwise the built-in defaults.
    #[arg(long, global = true)]
    pub policy: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import transactions from CSV
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Detect recurring patterns
    ///
    /// With --file, detects straight from a CSV without touching the database.
    /// Otherwise refreshes the stored patterns from stored transactions.
    Detect {
        /// CSV file to analyze instead of the database
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List stored recurring patterns
    Patterns {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show patterns due soon
    Upcoming {
        /// Days ahead to look (default: policy horizon, 30)
        #[arg(short, long)]
        days: Option<u32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the monthly cost of each pattern
    Monthly {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the effective detection policy
    Policy,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable; default is same-origin only)
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,
    },
}
