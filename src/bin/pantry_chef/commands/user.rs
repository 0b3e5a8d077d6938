// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Account management commands for pantry-chef
// ABOUTME: Creates accounts and changes subscription tiers

use pantry_chef::errors::AppResult;
use pantry_chef::models::Tier;
use pantry_chef::stores::sqlite::SqliteStore;
use tracing::info;
use uuid::Uuid;

/// Create an account and print its id
pub async fn create(store: &SqliteStore, tier: Tier) -> AppResult<()> {
    let user_id = store.create_user(tier).await?;
    info!(%user_id, %tier, "Account created");
    println!("{user_id}");
    Ok(())
}

/// Change an account's tier
pub async fn set_tier(store: &SqliteStore, user_id: Uuid, tier: Tier) -> AppResult<()> {
    store.set_tier(user_id, tier).await?;
    println!("{user_id} is now on the {tier} tier");
    Ok(())
}
