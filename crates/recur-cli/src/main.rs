//! Recur CLI - Recurring transaction detector
//!
//! Usage:
//!   recur init                 Initialize database
//!   recur import --file CSV    Import transactions
//!   recur detect               Refresh recurring patterns
//!   recur upcoming --days 14   Show charges due soon
//!   recur serve --port 3000    Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let policy = commands::load_policy(cli.policy.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(&db, &cli.user, &file)
        }
        Commands::Detect { file: Some(file), json } => {
            commands::cmd_detect_file(&file, &cli.user, policy, json)
        }
        Commands::Detect { file: None, json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_detect(&db, &cli.user, policy, json)
        }
        Commands::Patterns { json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_patterns(&db, &cli.user, json)
        }
        Commands::Upcoming { days, json } => {
            let db = commands::open_db(&cli.db)?;
            let days = days.unwrap_or(policy.upcoming_horizon_days);
            let today = chrono::Local::now().date_naive();
            commands::cmd_upcoming(&db, &cli.user, today, days, json)
        }
        Commands::Monthly { json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_monthly(&db, &cli.user, json)
        }
        Commands::Policy => commands::cmd_policy(&policy),
        Commands::Serve {
            port,
            host,
            cors_origins,
        } => commands::cmd_serve(&cli.db, policy, &host, port, cors_origins).await,
    }
}
