// ABOUTME: In-memory account and pantry stores for tests and single-process deployments
// ABOUTME: DashMap shard locks make the increment-with-ceiling check and write atomic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AccountStore, PantryStore};
use async_trait::async_trait;
use dashmap::DashMap;
use pantry_chef_core::errors::{AppError, AppResult};
use pantry_chef_core::models::{ActionKind, PantryItem, Tier, UserQuotaState};
use uuid::Uuid;

/// Account store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    users: DashMap<Uuid, UserQuotaState>,
}

impl InMemoryAccountStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with zero usage and return its id
    pub fn create_user(&self, tier: Tier) -> Uuid {
        let user_id = Uuid::new_v4();
        self.users.insert(user_id, UserQuotaState::new(user_id, tier));
        user_id
    }

    /// Insert or replace a user's full state (seeding existing usage)
    pub fn upsert_user(&self, state: UserQuotaState) {
        self.users.insert(state.user_id, state);
    }

    /// Change a user's tier
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist
    pub fn set_tier(&self, user_id: Uuid, tier: Tier) -> AppResult<()> {
        let mut state = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;
        state.tier = tier;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_user(&self, user_id: Uuid) -> AppResult<UserQuotaState> {
        self.users
            .get(&user_id)
            .map(|state| state.value().clone())
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))
    }

    async fn increment_if_below(
        &self,
        user_id: Uuid,
        action: ActionKind,
        limit: u32,
    ) -> AppResult<bool> {
        // get_mut holds the shard write lock across the check and the write
        let mut state = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;
        let used = state.usage.entry(action).or_insert(0);
        if *used >= limit {
            return Ok(false);
        }
        *used += 1;
        drop(state);
        Ok(true)
    }
}

/// Pantry store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryPantryStore {
    items: DashMap<Uuid, Vec<PantryItem>>,
}

impl InMemoryPantryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total items across every user
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.items.iter().map(|entry| entry.value().len()).sum()
    }
}

#[async_trait]
impl PantryStore for InMemoryPantryStore {
    async fn write_items(&self, user_id: Uuid, items: &[PantryItem]) -> AppResult<()> {
        self.items
            .entry(user_id)
            .or_default()
            .extend_from_slice(items);
        Ok(())
    }

    async fn list_items(&self, user_id: Uuid) -> AppResult<Vec<PantryItem>> {
        Ok(self
            .items
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_increment_stops_at_ceiling() {
        let store = InMemoryAccountStore::new();
        let user_id = store.create_user(Tier::Free);

        assert!(store
            .increment_if_below(user_id, ActionKind::RecipeCreate, 2)
            .await
            .unwrap());
        assert!(store
            .increment_if_below(user_id, ActionKind::RecipeCreate, 2)
            .await
            .unwrap());
        assert!(!store
            .increment_if_below(user_id, ActionKind::RecipeCreate, 2)
            .await
            .unwrap());

        let state = store.get_user(user_id).await.unwrap();
        assert_eq!(state.used(ActionKind::RecipeCreate), 2);
        assert_eq!(state.used(ActionKind::PantryScan), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = InMemoryAccountStore::new();
        let err = store.get_user(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(
            err.code,
            pantry_chef_core::errors::ErrorCode::ResourceNotFound
        );
    }
}
