// ABOUTME: Main library entry point for the Pantry Chef quota gateway and scan pipeline
// ABOUTME: Gates AI features behind tier limits and turns pantry photos into reviewed pantry items
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pantry Chef
//!
//! Backend logic of a recipe assistant:
//!
//! - **Quota gateway**: per-user, per-action monthly limits (`free` tier
//!   limited, `pro` unlimited) with explicit reservations that are committed
//!   through the account store's atomic increment-with-ceiling.
//! - **Scan-review-commit pipeline**: a pantry photo is recognized into
//!   ingredient drafts, reviewed and edited in a session, then written to the
//!   pantry store as one batch.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pantry_chef::commit::CommitCoordinator;
//! use pantry_chef::errors::AppResult;
//! use pantry_chef::models::{ActionKind, Tier};
//! use pantry_chef::quota::{GatewayConfig, QuotaGateway};
//! use pantry_chef::stores::memory::{InMemoryAccountStore, InMemoryPantryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let accounts = Arc::new(InMemoryAccountStore::new());
//!     let user_id = accounts.create_user(Tier::Free);
//!     let gateway = QuotaGateway::new(accounts, GatewayConfig::default());
//!
//!     let recipe = gateway
//!         .run_metered(user_id, ActionKind::RecipeCreate, || async { Ok("Shakshuka") })
//!         .await?;
//!
//!     let coordinator = CommitCoordinator::new(Arc::new(InMemoryPantryStore::new()));
//!     coordinator.add_manual_item(user_id, "Eggs", "6").await?;
//!     println!("created {recipe}");
//!     Ok(())
//! }
//! ```

/// Commit coordinator for pantry writes
pub mod commit;

/// Configuration management
pub mod config;

/// Structured logging setup
pub mod logging;

/// Per-client scan-review-commit pipeline
pub mod pipeline;

/// Quota gateway, reservations and counting periods
pub mod quota;

/// Recognition adapter and service clients
pub mod recognition;

/// Draft review engine
pub mod review;

/// Account and pantry store contracts and backends
pub mod stores;

pub use pantry_chef_core::{constants, errors, models};
