// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Pantry commands for pantry-chef
// ABOUTME: Manual (unmetered) additions and listing

use pantry_chef::commit::CommitCoordinator;
use pantry_chef::errors::AppResult;
use pantry_chef::stores::sqlite::SqliteStore;
use pantry_chef::stores::PantryStore;
use std::sync::Arc;
use uuid::Uuid;

/// Add one item by hand
pub async fn add(store: &SqliteStore, user_id: Uuid, name: &str, quantity: &str) -> AppResult<()> {
    let coordinator = CommitCoordinator::new(Arc::new(store.clone()));
    let receipt = coordinator.add_manual_item(user_id, name, quantity).await?;
    println!("Added {} item to the pantry", receipt.count);
    Ok(())
}

/// Print every pantry item
pub async fn list(store: &SqliteStore, user_id: Uuid) -> AppResult<()> {
    let items = store.list_items(user_id).await?;
    if items.is_empty() {
        println!("Pantry is empty");
        return Ok(());
    }
    for item in items {
        println!("{:<30} {}", item.name, item.quantity);
    }
    Ok(())
}
