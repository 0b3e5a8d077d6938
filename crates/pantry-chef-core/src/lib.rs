// ABOUTME: Core types and constants for the Pantry Chef quota and pantry pipeline
// ABOUTME: Foundation crate with error handling, tier/action models, and limit constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pantry Chef Core
//!
//! Foundation crate providing shared types and constants for the Pantry Chef
//! quota gateway and scan-review-commit pipeline. This crate is designed to
//! change infrequently, enabling incremental compilation benefits in the
//! workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `AppResult`
//! - **constants**: Tier names, action keys, and default free-tier limits
//! - **models**: Tiers, action kinds, quota state, ingredient drafts and pantry items

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (`Tier`, `ActionKind`, `IngredientDraft`, `PantryItem`, etc.)
pub mod models;
