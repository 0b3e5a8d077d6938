// ABOUTME: Environment configuration for the pantry services
// ABOUTME: Database location, recognition endpoint, reservation timing and free-tier limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration

use crate::quota::GatewayConfig;
use pantry_chef_core::constants::{limits, reservations};
use pantry_chef_core::errors::{AppError, AppResult};
use pantry_chef_core::models::QuotaLimits;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Default database location
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/pantry_chef.db";

/// Default recognition request timeout
pub const DEFAULT_RECOGNITION_TIMEOUT_SECS: u64 = 30;

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database file
    SQLite {
        /// File path
        path: PathBuf,
    },
    /// In-memory `SQLite` (tests and demos)
    Memory,
}

impl DatabaseUrl {
    /// Parse a `sqlite:` URL or a bare file path
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for an empty value or a non-SQLite scheme
    pub fn parse_url(s: &str) -> AppResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AppError::config_invalid("DATABASE_URL must not be empty"));
        }
        if let Some(path) = s.strip_prefix("sqlite:") {
            let path = path.trim_start_matches("//");
            return Ok(if path == ":memory:" {
                Self::Memory
            } else {
                Self::SQLite {
                    path: PathBuf::from(path),
                }
            });
        }
        if s.contains("://") {
            return Err(AppError::config_invalid(format!(
                "Unsupported DATABASE_URL scheme: {s}"
            )));
        }
        Ok(Self::SQLite {
            path: PathBuf::from(s),
        })
    }

    /// Connection string for sqlx
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Whether this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/pantry_chef.db"),
        }
    }
}

impl std::fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Recognition service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Endpoint receiving `POST` requests; `None` disables scanning
    pub service_url: Option<String>,
    /// Bearer token, never logged
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    /// Request timeout
    pub timeout_secs: u64,
}

/// Reservation timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    /// Lifetime of an uncommitted reservation
    pub ttl_secs: u64,
    /// Interval of the expiry sweep
    pub sweep_interval_secs: u64,
}

/// Complete runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Database location
    pub database_url: DatabaseUrl,
    /// Recognition service settings
    pub recognition: RecognitionConfig,
    /// Reservation timing
    pub reservations: ReservationConfig,
    /// Free-tier limits
    pub limits: QuotaLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DatabaseUrl::default(),
            recognition: RecognitionConfig {
                service_url: None,
                api_token: None,
                timeout_secs: DEFAULT_RECOGNITION_TIMEOUT_SECS,
            },
            reservations: ReservationConfig {
                ttl_secs: reservations::DEFAULT_TTL_SECS,
                sweep_interval_secs: reservations::DEFAULT_SWEEP_INTERVAL_SECS,
            },
            limits: QuotaLimits::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if a variable cannot be parsed or the result
    /// fails validation
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            database_url: DatabaseUrl::parse_url(&env_var_or(
                "DATABASE_URL",
                DEFAULT_DATABASE_URL,
            ))?,
            recognition: RecognitionConfig {
                service_url: env_non_empty("RECOGNITION_SERVICE_URL"),
                api_token: env_non_empty("RECOGNITION_API_TOKEN"),
                timeout_secs: env_parse(
                    "RECOGNITION_TIMEOUT_SECS",
                    DEFAULT_RECOGNITION_TIMEOUT_SECS,
                )?,
            },
            reservations: ReservationConfig {
                ttl_secs: env_parse("RESERVATION_TTL_SECS", reservations::DEFAULT_TTL_SECS)?,
                sweep_interval_secs: env_parse(
                    "RESERVATION_SWEEP_INTERVAL_SECS",
                    reservations::DEFAULT_SWEEP_INTERVAL_SECS,
                )?,
            },
            limits: QuotaLimits {
                free_pantry_scans: env_parse("FREE_PANTRY_SCAN_LIMIT", limits::FREE_PANTRY_SCANS)?,
                free_meal_recommendations: env_parse(
                    "FREE_MEAL_RECOMMENDATION_LIMIT",
                    limits::FREE_MEAL_RECOMMENDATIONS,
                )?,
                free_recipes: env_parse("FREE_RECIPE_CREATE_LIMIT", limits::FREE_RECIPES)?,
            },
        };

        config.validate()?;
        info!("Configuration loaded");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for zero timings or a malformed service URL
    pub fn validate(&self) -> AppResult<()> {
        if self.reservations.ttl_secs == 0 {
            return Err(AppError::config_invalid("RESERVATION_TTL_SECS must be positive"));
        }
        if self.reservations.sweep_interval_secs == 0 {
            return Err(AppError::config_invalid(
                "RESERVATION_SWEEP_INTERVAL_SECS must be positive",
            ));
        }
        if self.recognition.timeout_secs == 0 {
            return Err(AppError::config_invalid("RECOGNITION_TIMEOUT_SECS must be positive"));
        }
        if let Some(raw) = &self.recognition.service_url {
            let parsed = Url::parse(raw).map_err(|e| {
                AppError::config_invalid(format!("Invalid RECOGNITION_SERVICE_URL '{raw}': {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::config_invalid(format!(
                    "RECOGNITION_SERVICE_URL must be an http(s) URL, got {raw}"
                )));
            }
        }
        if self.recognition.service_url.is_none() && self.recognition.api_token.is_some() {
            warn!("RECOGNITION_API_TOKEN is set but RECOGNITION_SERVICE_URL is not");
        }
        Ok(())
    }

    /// Quota gateway settings derived from this configuration
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            limits: self.limits.clone(),
            reservation_ttl: Duration::from_secs(self.reservations.ttl_secs),
            sweep_interval: Duration::from_secs(self.reservations.sweep_interval_secs),
            enable_background_sweep: true,
        }
    }

    /// Recognition request timeout
    #[must_use]
    pub const fn recognition_timeout(&self) -> Duration {
        Duration::from_secs(self.recognition.timeout_secs)
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Pantry Chef Configuration:\n\
             - Database: {}\n\
             - Recognition Service: {}\n\
             - Recognition Auth: {}\n\
             - Reservation TTL: {}s (sweep every {}s)\n\
             - Free Limits: {} scans, {} recommendations, {} recipes",
            self.database_url,
            self.recognition
                .service_url
                .as_deref()
                .unwrap_or("Disabled"),
            if self.recognition.api_token.is_some() {
                "Bearer token"
            } else {
                "None"
            },
            self.reservations.ttl_secs,
            self.reservations.sweep_interval_secs,
            self.limits.free_pantry_scans,
            self.limits.free_meal_recommendations,
            self.limits.free_recipes,
        )
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::config_invalid(format!("Invalid {key} value: {value}"))),
        Err(_) => Ok(default),
    }
}
