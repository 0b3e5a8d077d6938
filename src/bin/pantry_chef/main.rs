// ABOUTME: Pantry Chef CLI - manage accounts, inspect quotas and run the scan pipeline
// ABOUTME: Wires the SQLite store, quota gateway and recognition client from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Create a free-tier account
//! pantry-chef user create --tier free
//!
//! # Upgrade an account
//! pantry-chef user set-tier 6f1c... pro
//!
//! # Show monthly usage
//! pantry-chef quota 6f1c...
//!
//! # Scan a photo, fix the first quantity, drop the third draft and save
//! pantry-chef scan 6f1c... fridge.jpg --edit 0=Milk:2L --remove 2 --commit
//!
//! # Add an item by hand (not metered)
//! pantry-chef add 6f1c... Rice 1kg
//!
//! # List the pantry
//! pantry-chef pantry 6f1c...
//! ```

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pantry_chef::config::ServerConfig;
use pantry_chef::logging::LoggingConfig;
use pantry_chef::models::Tier;
use pantry_chef::stores::sqlite::SqliteStore;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "pantry-chef",
    about = "Pantry Chef quota and pantry management CLI",
    long_about = "Command-line front end for the Pantry Chef quota gateway and scan-review-commit pipeline."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Account management commands
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Show monthly usage and remaining quota
    Quota {
        /// Account id
        user_id: Uuid,
    },

    /// Scan a pantry photo and review the detected ingredients
    Scan {
        /// Account id
        user_id: Uuid,

        /// Image file to send to the recognition service
        image: PathBuf,

        /// Replace a draft: POSITION=NAME:QUANTITY (positions as first listed)
        #[arg(long, value_name = "N=NAME:QTY")]
        edit: Vec<String>,

        /// Remove the draft at a position (as first listed)
        #[arg(long, value_name = "N")]
        remove: Vec<usize>,

        /// Write the reviewed drafts to the pantry
        #[arg(long)]
        commit: bool,
    },

    /// Add one item to the pantry by hand
    Add {
        /// Account id
        user_id: Uuid,

        /// Ingredient name
        name: String,

        /// Quantity, e.g. "500g"
        quantity: String,
    },

    /// List pantry items
    Pantry {
        /// Account id
        user_id: Uuid,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create an account
    Create {
        /// Subscription tier
        #[arg(long, default_value = "free")]
        tier: Tier,
    },

    /// Change an account's tier
    SetTier {
        /// Account id
        user_id: Uuid,

        /// New tier
        tier: Tier,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        "debug".clone_into(&mut logging.level);
    }
    logging.init()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(url) = cli.database_url.as_deref() {
        config.database_url = pantry_chef::config::DatabaseUrl::parse_url(url)?;
    }
    info!("{}", config.summary());

    let store = SqliteStore::new(&config.database_url.to_connection_string()).await?;

    match cli.command {
        Command::User { action } => match action {
            UserCommand::Create { tier } => commands::user::create(&store, tier).await?,
            UserCommand::SetTier { user_id, tier } => {
                commands::user::set_tier(&store, user_id, tier).await?;
            }
        },
        Command::Quota { user_id } => commands::quota::show(&store, &config, user_id).await?,
        Command::Scan {
            user_id,
            image,
            edit,
            remove,
            commit,
        } => {
            let request = commands::scan::ScanRequest {
                user_id,
                image,
                edits: edit,
                removals: remove,
                commit,
            };
            commands::scan::run(&store, &config, request).await?;
        }
        Command::Add {
            user_id,
            name,
            quantity,
        } => commands::pantry::add(&store, user_id, &name, &quantity).await?,
        Command::Pantry { user_id } => commands::pantry::list(&store, user_id).await?,
    }

    Ok(())
}
