// ABOUTME: Store abstraction layer for the account (quota) store and the pantry store
// ABOUTME: Pluggable backends (in-memory, SQLite) behind async collaborator traits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Collaborator Stores
//!
//! The quota gateway and the commit coordinator only depend on the two traits
//! defined here. Every backend must surface transport failures as
//! `StoreUnavailable`; the account store's `increment_if_below` is the sole
//! mutation path for usage counters and must be atomic.

/// In-memory store implementations
pub mod memory;
/// `SQLite` store implementation backed by sqlx
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use pantry_chef_core::errors::AppResult;
use pantry_chef_core::models::{ActionKind, PantryItem, UserQuotaState};
use uuid::Uuid;

/// Account store contract: user tier and per-action usage counters
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Read a user's tier and usage counters
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store cannot be reached and
    /// `ResourceNotFound` if the user does not exist
    async fn get_user(&self, user_id: Uuid) -> AppResult<UserQuotaState>;

    /// Atomically increment `usage[action]` if it is strictly below `limit`
    ///
    /// Returns `true` when the counter was incremented, `false` when the
    /// ceiling was already reached. Concurrent callers can never push the
    /// counter past `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store cannot be reached and
    /// `ResourceNotFound` if the user does not exist
    async fn increment_if_below(
        &self,
        user_id: Uuid,
        action: ActionKind,
        limit: u32,
    ) -> AppResult<bool>;
}

/// Pantry store contract: durable ingredient records
#[async_trait]
pub trait PantryStore: Send + Sync {
    /// Write a batch of items; either all are recorded or an error is returned
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` (or another store error) if the batch was not
    /// durably recorded
    async fn write_items(&self, user_id: Uuid, items: &[PantryItem]) -> AppResult<()>;

    /// List a user's pantry in insertion order
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store cannot be reached
    async fn list_items(&self, user_id: Uuid) -> AppResult<Vec<PantryItem>>;
}
