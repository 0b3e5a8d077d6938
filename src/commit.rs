// ABOUTME: Commit coordinator validating draft batches and writing them to the pantry store
// ABOUTME: Shared write path for reviewed scans and unmetered manual additions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::stores::PantryStore;
use pantry_chef_core::errors::{AppError, AppResult, ErrorCode};
use pantry_chef_core::models::{IngredientDraft, PantryItem};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// How a pantry write was counted against the user's quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    /// Not a metered write
    Unmetered,
    /// The scan was counted
    Recorded,
    /// The account store could not count the scan; it is retried before the next scan
    Pending,
    /// The limit was reached elsewhere before this scan could be counted
    OverLimit,
}

/// Result of a successful batch write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    /// Number of items written
    pub count: usize,
    /// Quota outcome of the write
    pub usage: UsageStatus,
}

/// Validates drafts and persists them as one batch
#[derive(Clone)]
pub struct CommitCoordinator {
    pantry: Arc<dyn PantryStore>,
}

impl CommitCoordinator {
    /// Create a coordinator over a pantry store
    #[must_use]
    pub fn new(pantry: Arc<dyn PantryStore>) -> Self {
        Self { pantry }
    }

    /// Validate every draft, then write them all in one batch
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the batch is empty or a draft has a blank field;
    ///   nothing is written
    /// - `CommitFailed` if the pantry store rejects the batch
    pub async fn commit_drafts(
        &self,
        user_id: Uuid,
        drafts: &[IngredientDraft],
    ) -> AppResult<CommitReceipt> {
        if drafts.is_empty() {
            return Err(AppError::validation("drafts", "Nothing to add to the pantry")
                .with_user_id(user_id));
        }

        let items = drafts
            .iter()
            .enumerate()
            .map(|(position, draft)| {
                draft
                    .to_pantry_item()
                    .map_err(|e| e.with_resource_id(format!("position {position}")))
            })
            .collect::<AppResult<Vec<PantryItem>>>()
            .map_err(|e| e.with_user_id(user_id))?;

        self.write(user_id, &items).await
    }

    /// Add one hand-entered item; shares the batch validation and write path
    ///
    /// # Errors
    ///
    /// - `ValidationError` if either field is blank; nothing is written
    /// - `CommitFailed` if the pantry store rejects the write
    pub async fn add_manual_item(
        &self,
        user_id: Uuid,
        name: &str,
        quantity: &str,
    ) -> AppResult<CommitReceipt> {
        self.commit_drafts(user_id, &[IngredientDraft::manual(name, quantity)])
            .await
    }

    async fn write(&self, user_id: Uuid, items: &[PantryItem]) -> AppResult<CommitReceipt> {
        match self.pantry.write_items(user_id, items).await {
            Ok(()) => {
                info!(%user_id, count = items.len(), "Pantry items committed");
                Ok(CommitReceipt {
                    count: items.len(),
                    usage: UsageStatus::Unmetered,
                })
            }
            Err(e) => {
                warn!(%user_id, count = items.len(), error = %e, "Pantry write failed");
                let cause = if e.code == ErrorCode::CommitFailed {
                    e.message.clone()
                } else {
                    format!("Pantry write failed: {}", e.message)
                };
                Err(AppError::commit_failed(cause)
                    .with_user_id(user_id)
                    .with_source(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory::InMemoryPantryStore;
    use crate::stores::PantryStore as _;

    #[tokio::test]
    async fn test_invalid_draft_blocks_whole_batch() {
        let pantry = Arc::new(InMemoryPantryStore::new());
        let coordinator = CommitCoordinator::new(pantry.clone());
        let user_id = Uuid::new_v4();

        let drafts = vec![
            IngredientDraft::recognized("Milk", "1L", Some(0.9)),
            IngredientDraft::recognized("Flour", " ", Some(0.7)),
        ];
        let err = coordinator.commit_drafts(user_id, &drafts).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.context.resource_id.as_deref(), Some("position 1"));
        assert!(pantry.list_items(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manual_item_is_trimmed() {
        let pantry = Arc::new(InMemoryPantryStore::new());
        let coordinator = CommitCoordinator::new(pantry.clone());
        let user_id = Uuid::new_v4();

        let receipt = coordinator
            .add_manual_item(user_id, "  Rice ", " 1kg")
            .await
            .unwrap();

        assert_eq!(receipt.count, 1);
        assert_eq!(receipt.usage, UsageStatus::Unmetered);
        assert_eq!(
            pantry.list_items(user_id).await.unwrap(),
            vec![PantryItem {
                name: "Rice".into(),
                quantity: "1kg".into()
            }]
        );
    }
}
