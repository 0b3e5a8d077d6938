// ABOUTME: Serializable read-only view of a review session for callers and the CLI
// ABOUTME: Exposes drafts with ids, positions and confidence percentages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{DraftId, EditBuffer, ReviewSession};
use serde::Serialize;

/// One draft as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftView {
    /// Stable id
    pub id: DraftId,
    /// Current position
    pub position: usize,
    /// Ingredient name
    pub name: String,
    /// Quantity; empty means the user still has to supply one
    pub quantity: String,
    /// Rounded recognition confidence, absent for manual entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_percent: Option<u8>,
}

/// Point-in-time view of a review session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSnapshot {
    /// `empty`, `reviewing` or `editing`
    pub state: &'static str,
    /// Drafts in display order
    pub drafts: Vec<DraftView>,
    /// Edit in progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing: Option<EditBuffer>,
}

impl ReviewSnapshot {
    pub(super) fn from_session(session: &ReviewSession) -> Self {
        let drafts = session
            .drafts()
            .enumerate()
            .map(|(position, (id, draft))| DraftView {
                id,
                position,
                name: draft.name.clone(),
                quantity: draft.quantity.clone(),
                confidence_percent: draft.confidence_percent(),
            })
            .collect();

        Self {
            state: session.state().name(),
            drafts,
            editing: session.editing().cloned(),
        }
    }

    /// Drafts whose quantity still has to be filled in
    #[must_use]
    pub fn incomplete(&self) -> Vec<DraftId> {
        self.drafts
            .iter()
            .filter(|draft| draft.quantity.trim().is_empty())
            .map(|draft| draft.id)
            .collect()
    }
}
