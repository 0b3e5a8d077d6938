// ABOUTME: Subscription tier, metered action kinds and the per-tier limit table
// ABOUTME: UserQuotaState mirrors the account store record read by the quota gateway
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{actions, limits, tiers};
use crate::errors::AppError;

/// User subscription tier
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Free tier with monthly limits
    #[default]
    Free,
    /// Pro tier, unlimited for every action
    Pro,
}

impl Tier {
    /// Convert to string for storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => tiers::FREE,
            Self::Pro => tiers::PRO,
        }
    }

    /// Parse a stored tier, treating missing or unknown values as free
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            tiers::FREE => Ok(Self::Free),
            tiers::PRO => Ok(Self::Pro),
            other => Err(AppError::validation(
                "tier",
                format!("Invalid tier: {other}"),
            )),
        }
    }
}

/// Quota-metered feature category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Pantry photo scan
    PantryScan,
    /// AI meal recommendation
    MealRecommendation,
    /// Recipe creation
    RecipeCreate,
}

impl ActionKind {
    /// Every action kind, in display order
    pub const ALL: [Self; 3] = [Self::PantryScan, Self::MealRecommendation, Self::RecipeCreate];

    /// Storage / wire identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PantryScan => actions::PANTRY_SCAN,
            Self::MealRecommendation => actions::MEAL_RECOMMENDATION,
            Self::RecipeCreate => actions::RECIPE_CREATE,
        }
    }

    /// Message shown when a free user has exhausted `limit` for this action
    #[must_use]
    pub fn denial_message(&self, limit: u32) -> String {
        match self {
            Self::PantryScan => format!(
                "You've used all {limit} scans this month. Upgrade to Pro for unlimited scans!"
            ),
            Self::MealRecommendation => format!(
                "You've used all {limit} recommendations this month. Upgrade to Pro!"
            ),
            Self::RecipeCreate => format!(
                "You've created {limit} recipes this month. Upgrade to Pro for unlimited!"
            ),
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            actions::PANTRY_SCAN => Ok(Self::PantryScan),
            actions::MEAL_RECOMMENDATION => Ok(Self::MealRecommendation),
            actions::RECIPE_CREATE => Ok(Self::RecipeCreate),
            other => Err(AppError::validation(
                "action",
                format!("Unknown action kind: {other}"),
            )),
        }
    }
}

/// Limit for one (tier, action) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum QuotaLimit {
    /// At most this many actions per counting period
    Finite(u32),
    /// No limit
    Unlimited,
}

impl QuotaLimit {
    /// Ceiling passed to the store's atomic increment
    #[must_use]
    pub const fn ceiling(&self) -> u32 {
        match self {
            Self::Finite(n) => *n,
            Self::Unlimited => u32::MAX,
        }
    }

    /// Finite value, if any
    #[must_use]
    pub const fn as_finite(&self) -> Option<u32> {
        match self {
            Self::Finite(n) => Some(*n),
            Self::Unlimited => None,
        }
    }
}

/// Per-tier limit table; `pro` is always unlimited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    /// Monthly pantry scans on the free tier
    pub free_pantry_scans: u32,
    /// Monthly meal recommendations on the free tier
    pub free_meal_recommendations: u32,
    /// Monthly recipes created on the free tier
    pub free_recipes: u32,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            free_pantry_scans: limits::FREE_PANTRY_SCANS,
            free_meal_recommendations: limits::FREE_MEAL_RECOMMENDATIONS,
            free_recipes: limits::FREE_RECIPES,
        }
    }
}

impl QuotaLimits {
    /// Look up the limit for a tier and action
    #[must_use]
    pub const fn limit(&self, tier: Tier, action: ActionKind) -> QuotaLimit {
        match tier {
            Tier::Pro => QuotaLimit::Unlimited,
            Tier::Free => QuotaLimit::Finite(match action {
                ActionKind::PantryScan => self.free_pantry_scans,
                ActionKind::MealRecommendation => self.free_meal_recommendations,
                ActionKind::RecipeCreate => self.free_recipes,
            }),
        }
    }
}

/// A user's tier and usage counters for the current period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuotaState {
    /// Owner of the counters
    pub user_id: Uuid,
    /// Subscription tier
    pub tier: Tier,
    /// Usage per action kind; absent entries count as zero
    pub usage: HashMap<ActionKind, u32>,
}

impl UserQuotaState {
    /// Fresh state with zero usage
    #[must_use]
    pub fn new(user_id: Uuid, tier: Tier) -> Self {
        Self {
            user_id,
            tier,
            usage: HashMap::new(),
        }
    }

    /// Usage count for an action
    #[must_use]
    pub fn used(&self, action: ActionKind) -> u32 {
        self.usage.get(&action).copied().unwrap_or(0)
    }
}
