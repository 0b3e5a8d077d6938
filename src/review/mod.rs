// ABOUTME: Draft review engine: per-session state machine over ingredient drafts
// ABOUTME: Load, edit, remove and commit-preparation with stable draft identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Draft Review Engine
//!
//! A [`ReviewSession`] holds the ordered drafts of one scan or manual-entry
//! flow and at most one in-progress edit.
//!
//! ```text
//!   Empty --load--> Reviewing --start_edit--> Editing
//!     ^                ^  |                     |
//!     |                |  +--remove             |
//!     |                +------save/cancel-------+
//!     +------------------reset (any state)
//! ```
//!
//! Drafts are addressed by a [`DraftId`] assigned at load, so removing an
//! earlier draft never retargets a later edit. Positions are still exposed
//! through [`ReviewSession::id_at`] for callers that work positionally.
//!
//! Transitions are synchronous; the session is owned by exactly one pipeline
//! and mutated through `&mut self`.

mod snapshot;

pub use snapshot::{DraftView, ReviewSnapshot};

use pantry_chef_core::errors::{AppError, AppResult};
use pantry_chef_core::models::{validate_fields, IngredientDraft};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a draft within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DraftId(u64);

impl DraftId {
    /// Raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "draft-{}", self.0)
    }
}

/// Mutable copy of a draft's editable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditBuffer {
    /// Draft being edited
    pub id: DraftId,
    /// Working name
    pub name: String,
    /// Working quantity
    pub quantity: String,
}

/// Session lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    /// No drafts loaded
    Empty,
    /// Drafts loaded, no edit in progress
    Reviewing,
    /// One draft is being edited
    Editing(EditBuffer),
}

impl ReviewState {
    /// Short state name for logs and snapshots
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Reviewing => "reviewing",
            Self::Editing(_) => "editing",
        }
    }
}

/// Ordered drafts plus at most one edit in progress
#[derive(Debug, Clone)]
pub struct ReviewSession {
    drafts: Vec<(DraftId, IngredientDraft)>,
    state: ReviewState,
    next_id: u64,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    /// Create an empty session
    #[must_use]
    pub const fn new() -> Self {
        Self {
            drafts: Vec::new(),
            state: ReviewState::Empty,
            next_id: 0,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &ReviewState {
        &self.state
    }

    /// Edit in progress, if any
    #[must_use]
    pub const fn editing(&self) -> Option<&EditBuffer> {
        match &self.state {
            ReviewState::Editing(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Number of drafts
    #[must_use]
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Whether the session holds no drafts
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Drafts in display order with their ids
    pub fn drafts(&self) -> impl Iterator<Item = (DraftId, &IngredientDraft)> {
        self.drafts.iter().map(|(id, draft)| (*id, draft))
    }

    /// Draft by id
    #[must_use]
    pub fn get(&self, id: DraftId) -> Option<&IngredientDraft> {
        self.drafts
            .iter()
            .find(|(draft_id, _)| *draft_id == id)
            .map(|(_, draft)| draft)
    }

    /// Id of the draft currently at `position`
    #[must_use]
    pub fn id_at(&self, position: usize) -> Option<DraftId> {
        self.drafts.get(position).map(|(id, _)| *id)
    }

    /// Current position of a draft
    #[must_use]
    pub fn position_of(&self, id: DraftId) -> Option<usize> {
        self.drafts.iter().position(|(draft_id, _)| *draft_id == id)
    }

    /// Load drafts into an empty session; an empty list is valid
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the session is empty
    pub fn load(&mut self, drafts: Vec<IngredientDraft>) -> AppResult<()> {
        self.require("load", |state| matches!(state, ReviewState::Empty))?;

        self.drafts = drafts
            .into_iter()
            .map(|draft| {
                let id = DraftId(self.next_id);
                self.next_id += 1;
                (id, draft)
            })
            .collect();
        self.state = ReviewState::Reviewing;
        Ok(())
    }

    /// Begin editing a draft, capturing a working copy of its fields
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless reviewing with no edit active
    /// - `ResourceNotFound` if the draft does not exist
    pub fn start_edit(&mut self, id: DraftId) -> AppResult<()> {
        self.require("start_edit", |state| matches!(state, ReviewState::Reviewing))?;
        let draft = self
            .get(id)
            .ok_or_else(|| AppError::not_found(format!("Draft {id}")))?;

        let buffer = EditBuffer {
            id,
            name: draft.name.clone(),
            quantity: draft.quantity.clone(),
        };
        self.state = ReviewState::Editing(buffer);
        Ok(())
    }

    /// Update the working copy without leaving the editing state
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless editing
    pub fn update_edit(&mut self, name: &str, quantity: &str) -> AppResult<()> {
        match &mut self.state {
            ReviewState::Editing(buffer) => {
                name.clone_into(&mut buffer.name);
                quantity.clone_into(&mut buffer.quantity);
                Ok(())
            }
            other => Err(wrong_state("update_edit", other)),
        }
    }

    /// Validate and apply an edit, returning to reviewing
    ///
    /// On a validation failure the session stays in the editing state with the
    /// rejected values kept in the working copy.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless editing
    /// - `ValidationError` if either field is blank after trimming
    pub fn save_edit(&mut self, name: &str, quantity: &str) -> AppResult<DraftId> {
        let ReviewState::Editing(buffer) = &mut self.state else {
            return Err(wrong_state("save_edit", &self.state));
        };
        name.clone_into(&mut buffer.name);
        quantity.clone_into(&mut buffer.quantity);
        let id = buffer.id;

        let (name, quantity) = validate_fields(name, quantity)?;
        let draft = self
            .drafts
            .iter_mut()
            .find(|(draft_id, _)| *draft_id == id)
            .map(|(_, draft)| draft)
            .ok_or_else(|| AppError::not_found(format!("Draft {id}")))?;

        name.clone_into(&mut draft.name);
        quantity.clone_into(&mut draft.quantity);
        self.state = ReviewState::Reviewing;
        Ok(id)
    }

    /// Discard the working copy; the draft is left untouched
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless editing
    pub fn cancel_edit(&mut self) -> AppResult<()> {
        self.require("cancel_edit", |state| matches!(state, ReviewState::Editing(_)))?;
        self.state = ReviewState::Reviewing;
        Ok(())
    }

    /// Remove a draft; later drafts shift one position down
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless reviewing with no edit active
    /// - `ResourceNotFound` if the draft does not exist
    pub fn remove(&mut self, id: DraftId) -> AppResult<IngredientDraft> {
        self.require("remove", |state| matches!(state, ReviewState::Reviewing))?;
        let position = self
            .position_of(id)
            .ok_or_else(|| AppError::not_found(format!("Draft {id}")))?;
        Ok(self.drafts.remove(position).1)
    }

    /// Drop every draft and return to empty from any state
    pub fn reset(&mut self) {
        self.drafts.clear();
        self.state = ReviewState::Empty;
    }

    /// Drafts to hand to the commit coordinator
    ///
    /// The session is unchanged; the caller discards it once the write succeeds
    /// and keeps it for a retry otherwise.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless reviewing with no edit active
    /// - `ValidationError` if there are no drafts
    pub fn commit_batch(&self) -> AppResult<Vec<IngredientDraft>> {
        self.require("commit", |state| matches!(state, ReviewState::Reviewing))?;
        if self.drafts.is_empty() {
            return Err(AppError::validation("drafts", "Nothing to add to the pantry"));
        }
        Ok(self.drafts.iter().map(|(_, draft)| draft.clone()).collect())
    }

    /// Serializable view of the session
    #[must_use]
    pub fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot::from_session(self)
    }

    fn require(&self, operation: &str, allowed: impl Fn(&ReviewState) -> bool) -> AppResult<()> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(wrong_state(operation, &self.state))
        }
    }
}

fn wrong_state(operation: &str, state: &ReviewState) -> AppError {
    AppError::invalid_state(format!(
        "Cannot {operation} while the review session is {}",
        state.name()
    ))
}
