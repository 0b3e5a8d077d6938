// ABOUTME: Integration tests for the SQLite account and pantry store
// ABOUTME: Conditional increments under concurrency, tier fallback and persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![cfg(feature = "sqlite")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{init_test_logging, test_gateway_config};
use pantry_chef::errors::ErrorCode;
use pantry_chef::models::{ActionKind, PantryItem, Tier};
use pantry_chef::quota::QuotaGateway;
use pantry_chef::stores::sqlite::SqliteStore;
use pantry_chef::stores::{AccountStore, PantryStore};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

async fn memory_store() -> Result<SqliteStore> {
    init_test_logging();
    Ok(SqliteStore::new("sqlite::memory:").await?)
}

#[tokio::test]
async fn test_increment_stops_at_limit() -> Result<()> {
    let store = memory_store().await?;
    let user_id = store.create_user(Tier::Free).await?;

    for _ in 0..3 {
        assert!(store.increment_if_below(user_id, ActionKind::RecipeCreate, 3).await?);
    }
    assert!(!store.increment_if_below(user_id, ActionKind::RecipeCreate, 3).await?);

    let state = store.get_user(user_id).await?;
    assert_eq!(state.used(ActionKind::RecipeCreate), 3);
    assert_eq!(state.used(ActionKind::PantryScan), 0);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_increments_respect_ceiling() -> Result<()> {
    let dir = TempDir::new()?;
    let url = format!("sqlite:{}", dir.path().join("quota.db").display());
    init_test_logging();
    let store = Arc::new(SqliteStore::new(&url).await?);
    let user_id = store.create_user(Tier::Free).await?;

    let mut tasks = Vec::new();
    for _ in 0..12 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store
                .increment_if_below(user_id, ActionKind::PantryScan, 5)
                .await
        }));
    }

    let mut granted = 0;
    for task in tasks {
        if task.await?? {
            granted += 1;
        }
    }

    assert_eq!(granted, 5);
    assert_eq!(store.get_user(user_id).await?.used(ActionKind::PantryScan), 5);
    Ok(())
}

#[tokio::test]
async fn test_unknown_tier_reads_as_free() -> Result<()> {
    let store = memory_store().await?;
    let user_id = store.create_user(Tier::Pro).await?;
    sqlx::query("UPDATE accounts SET tier = 'platinum' WHERE id = ?")
        .bind(user_id.to_string())
        .execute(store.pool())
        .await?;

    assert_eq!(store.get_user(user_id).await?.tier, Tier::Free);
    Ok(())
}

#[tokio::test]
async fn test_unknown_user_is_not_found() -> Result<()> {
    let store = memory_store().await?;
    let stranger = Uuid::new_v4();

    let read = store.get_user(stranger).await.unwrap_err();
    let increment = store
        .increment_if_below(stranger, ActionKind::PantryScan, 10)
        .await
        .unwrap_err();
    let tier = store.set_tier(stranger, Tier::Pro).await.unwrap_err();

    assert_eq!(read.code, ErrorCode::ResourceNotFound);
    assert_eq!(increment.code, ErrorCode::ResourceNotFound);
    assert_eq!(tier.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_pantry_items_persist_across_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let url = format!("sqlite:{}", dir.path().join("pantry.db").display());
    init_test_logging();
    let user_id = Uuid::new_v4();

    {
        let store = SqliteStore::new(&url).await?;
        store
            .write_items(
                user_id,
                &[PantryItem::new("Milk", "2L")?, PantryItem::new("Eggs", "12")?],
            )
            .await?;
        store
            .write_items(user_id, &[PantryItem::new("Rice", "1kg")?])
            .await?;
    }

    let reopened = SqliteStore::new(&url).await?;
    let names: Vec<String> = reopened
        .list_items(user_id)
        .await?
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(names, ["Milk", "Eggs", "Rice"]);
    assert!(reopened.list_items(Uuid::new_v4()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_gateway_over_sqlite_enforces_free_limit() -> Result<()> {
    let store = Arc::new(memory_store().await?);
    let user_id = store.create_user(Tier::Free).await?;
    store.set_usage(user_id, ActionKind::MealRecommendation, 4).await?;
    let gateway = QuotaGateway::new(store.clone(), test_gateway_config());

    let mut reservation = gateway
        .check_and_reserve(user_id, ActionKind::MealRecommendation)
        .await?
        .into_reservation()?;
    gateway.commit(&mut reservation).await?;

    let decision = gateway
        .check_and_reserve(user_id, ActionKind::MealRecommendation)
        .await?;
    assert!(!decision.is_allowed());

    store.set_tier(user_id, Tier::Pro).await?;
    let decision = gateway
        .check_and_reserve(user_id, ActionKind::MealRecommendation)
        .await?;
    assert!(decision.is_allowed());
    Ok(())
}
