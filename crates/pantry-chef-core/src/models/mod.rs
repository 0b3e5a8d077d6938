// ABOUTME: Core data models for quota enforcement and pantry ingredient handling
// ABOUTME: Re-exports Tier, ActionKind, UserQuotaState, IngredientDraft and PantryItem
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - `Tier` / `ActionKind`: subscription level and metered feature category
//! - `QuotaLimit` / `QuotaLimits`: the per-tier limit table
//! - `UserQuotaState`: a user's tier and monthly usage counters
//! - `IngredientDraft`: an editable, not-yet-persisted ingredient
//! - `PantryItem`: the durable record written to the pantry store

mod ingredient;
mod quota;

pub use ingredient::{validate_fields, IngredientDraft, PantryItem};
pub use quota::{ActionKind, QuotaLimit, QuotaLimits, Tier, UserQuotaState};
