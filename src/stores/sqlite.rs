// ABOUTME: SQLite implementation of the account and pantry stores using sqlx
// ABOUTME: Conditional UPDATE provides the atomic increment-with-ceiling primitive
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! `SQLite` store implementation
//!
//! One pool serves both collaborator contracts. Usage counters live in their
//! own table keyed by `(user_id, action)` so the atomic increment is a single
//! conditional `UPDATE`.

use super::{AccountStore, PantryStore};
use async_trait::async_trait;
use chrono::Utc;
use pantry_chef_core::errors::{AppError, AppResult};
use pantry_chef_core::models::{ActionKind, PantryItem, Tier, UserQuotaState};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Account and pantry store backed by `SQLite`
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Connect and run migrations
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the database cannot be opened or migrated
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Each in-memory connection would otherwise see its own database
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(database_url, "SQLite store ready");
        Ok(store)
    }

    /// Get a reference to the pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create tables if they do not exist
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if a statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                tier TEXT NOT NULL DEFAULT 'free',
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS quota_usage (
                user_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                action TEXT NOT NULL,
                used INTEGER NOT NULL DEFAULT 0 CHECK (used >= 0),
                PRIMARY KEY (user_id, action)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS pantry_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                quantity TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_pantry_items_user ON pantry_items(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create an account with zero usage
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the insert fails
    pub async fn create_user(&self, tier: Tier) -> AppResult<Uuid> {
        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO accounts (id, tier, created_at) VALUES (?, ?, ?)")
            .bind(user_id.to_string())
            .bind(tier.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        debug!(%user_id, %tier, "account created");
        Ok(user_id)
    }

    /// Change an account's tier
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the account does not exist
    pub async fn set_tier(&self, user_id: Uuid, tier: Tier) -> AppResult<()> {
        let result = sqlx::query("UPDATE accounts SET tier = ? WHERE id = ?")
            .bind(tier.as_str())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id}")));
        }
        Ok(())
    }

    /// Overwrite a usage counter (period resets and seeding)
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the account does not exist
    pub async fn set_usage(&self, user_id: Uuid, action: ActionKind, used: u32) -> AppResult<()> {
        self.ensure_account(user_id).await?;
        sqlx::query(
            r"
            INSERT INTO quota_usage (user_id, action, used) VALUES (?, ?, ?)
            ON CONFLICT(user_id, action) DO UPDATE SET used = excluded.used
            ",
        )
        .bind(user_id.to_string())
        .bind(action.as_str())
        .bind(i64::from(used))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ensure_account(&self, user_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query("SELECT 1 FROM accounts WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if exists {
            Ok(())
        } else {
            Err(AppError::not_found(format!("User {user_id}")))
        }
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn get_user(&self, user_id: Uuid) -> AppResult<UserQuotaState> {
        let row = sqlx::query("SELECT tier FROM accounts WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;

        let tier_value: Option<String> = row.try_get("tier")?;
        let mut state = UserQuotaState::new(user_id, Tier::from_stored(tier_value.as_deref()));

        let rows = sqlx::query("SELECT action, used FROM quota_usage WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            let action: String = row.try_get("action")?;
            let used: i64 = row.try_get("used")?;
            match action.parse::<ActionKind>() {
                Ok(kind) => {
                    state
                        .usage
                        .insert(kind, u32::try_from(used).unwrap_or(u32::MAX));
                }
                Err(_) => warn!(%user_id, action = %action, "ignoring usage row for unknown action"),
            }
        }

        Ok(state)
    }

    async fn increment_if_below(
        &self,
        user_id: Uuid,
        action: ActionKind,
        limit: u32,
    ) -> AppResult<bool> {
        self.ensure_account(user_id).await?;

        sqlx::query(
            "INSERT INTO quota_usage (user_id, action, used) VALUES (?, ?, 0) ON CONFLICT(user_id, action) DO NOTHING",
        )
        .bind(user_id.to_string())
        .bind(action.as_str())
        .execute(&self.pool)
        .await?;

        // Single statement: the WHERE clause is the ceiling check
        let result = sqlx::query(
            "UPDATE quota_usage SET used = used + 1 WHERE user_id = ? AND action = ? AND used < ?",
        )
        .bind(user_id.to_string())
        .bind(action.as_str())
        .bind(i64::from(limit))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl PantryStore for SqliteStore {
    async fn write_items(&self, user_id: Uuid, items: &[PantryItem]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let created_at = Utc::now().to_rfc3339();

        for item in items {
            sqlx::query(
                "INSERT INTO pantry_items (user_id, name, quantity, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(user_id.to_string())
            .bind(&item.name)
            .bind(&item.quantity)
            .bind(&created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_items(&self, user_id: Uuid) -> AppResult<Vec<PantryItem>> {
        let rows = sqlx::query("SELECT name, quantity FROM pantry_items WHERE user_id = ? ORDER BY id")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> AppResult<PantryItem> {
                Ok(PantryItem {
                    name: row.try_get("name")?,
                    quantity: row.try_get("quantity")?,
                })
            })
            .collect()
    }
}
