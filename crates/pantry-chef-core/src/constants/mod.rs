// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Tier names, action keys, default limits and user-facing quota messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! large file.

/// Subscription tier identifiers as stored in the account store
pub mod tiers {
    /// Free tier with monthly limits
    pub const FREE: &str = "free";
    /// Paid tier with unlimited usage
    pub const PRO: &str = "pro";
}

/// Quota-metered action identifiers
pub mod actions {
    /// Pantry photo scan
    pub const PANTRY_SCAN: &str = "pantry_scan";
    /// AI meal recommendation
    pub const MEAL_RECOMMENDATION: &str = "meal_recommendation";
    /// Recipe creation / cookbook save
    pub const RECIPE_CREATE: &str = "recipe_create";
}

/// Default monthly limits for the free tier
pub mod limits {
    /// Pantry scans per month on the free tier
    pub const FREE_PANTRY_SCANS: u32 = 10;
    /// Meal recommendations per month on the free tier
    pub const FREE_MEAL_RECOMMENDATIONS: u32 = 5;
    /// Recipes created per month on the free tier
    pub const FREE_RECIPES: u32 = 3;
}

/// Reservation lifetimes
pub mod reservations {
    /// Default hold time for a reserved-but-uncommitted quota slot
    pub const DEFAULT_TTL_SECS: u64 = 30 * 60;
    /// Default interval for the background expiry sweep
    pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
}

/// Service identifiers used in logs
pub mod service_names {
    /// Name reported by the logging layer
    pub const PANTRY_CHEF: &str = "pantry-chef";
    /// Name used when wrapping recognition service failures
    pub const RECOGNITION_SERVICE: &str = "recognition-service";
}
