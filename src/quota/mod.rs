// ABOUTME: Quota gateway enforcing per-user, per-action monthly tier limits
// ABOUTME: Check-and-reserve, commit via atomic increment-with-ceiling, release, expiry sweep
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Quota Gateway
//!
//! The gateway decides whether a metered action may proceed and performs the
//! post-action increment. Three rules hold:
//!
//! - A check that cannot read the account store denies the action (fail-closed).
//! - A granted check places an expiring hold so concurrent checks in this
//!   process see the slot as taken until it is committed, released or times out.
//! - The usage counter only moves through the store's atomic
//!   `increment_if_below`, so no interleaving can push a user past the limit.

/// Counting-period helpers
pub mod period;
/// Reservation objects and the hold table
pub mod reservation;

pub use reservation::{Reservation, ReservationState};

use crate::stores::AccountStore;
use chrono::{DateTime, Utc};
use pantry_chef_core::constants::reservations;
use pantry_chef_core::errors::{AppError, AppResult};
use pantry_chef_core::models::{ActionKind, QuotaLimit, QuotaLimits};
use reservation::HoldTable;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Remaining quota reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Remaining {
    /// No limit applies
    Unbounded,
    /// This many more actions fit in the current period
    Finite(u32),
}

/// Outcome of `check_and_reserve`
#[derive(Debug)]
pub enum Decision {
    /// The action may proceed; the reservation must be committed or released
    Allowed {
        /// Quota left before this action
        remaining: Remaining,
        /// Held slot
        reservation: Reservation,
        /// When usage counters next reset
        resets_at: DateTime<Utc>,
    },
    /// The limit is reached; the action must not proceed
    Denied {
        /// Action that was refused
        action: ActionKind,
        /// User-facing message with an upgrade hint
        message: String,
        /// Always zero
        remaining: u32,
        /// When usage counters next reset
        resets_at: DateTime<Utc>,
    },
}

impl Decision {
    /// Whether the action may proceed
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Quota left; zero for a denial
    #[must_use]
    pub const fn remaining(&self) -> Remaining {
        match self {
            Self::Allowed { remaining, .. } => *remaining,
            Self::Denied { remaining, .. } => Remaining::Finite(*remaining),
        }
    }

    /// When usage counters next reset
    #[must_use]
    pub const fn resets_at(&self) -> DateTime<Utc> {
        match self {
            Self::Allowed { resets_at, .. } | Self::Denied { resets_at, .. } => *resets_at,
        }
    }

    /// Take the reservation, turning a denial into a `QuotaDenied` error
    ///
    /// # Errors
    ///
    /// Returns `QuotaDenied` when the decision was a denial
    pub fn into_reservation(self) -> AppResult<Reservation> {
        match self {
            Self::Allowed { reservation, .. } => Ok(reservation),
            Self::Denied {
                action,
                message,
                resets_at,
                ..
            } => Err(AppError::quota_denied(action.as_str(), message).with_details(
                serde_json::json!({
                    "action": action.as_str(),
                    "remaining": 0,
                    "upgrade": "pro",
                    "resets_at": resets_at.to_rfc3339(),
                }),
            )),
        }
    }
}

/// Per-action usage line for display
#[derive(Debug, Clone, Serialize)]
pub struct ActionUsage {
    /// Metered action
    pub action: ActionKind,
    /// Committed usage this period
    pub used: u32,
    /// Reservations currently held in this process
    pub pending: u32,
    /// Tier limit
    pub limit: QuotaLimit,
    /// Quota left, counting pending holds as used
    pub remaining: Remaining,
}

/// Usage overview for one user
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    /// Owning user
    pub user_id: Uuid,
    /// Tier name
    pub tier: String,
    /// One line per action kind
    pub actions: Vec<ActionUsage>,
    /// When usage counters next reset
    pub resets_at: DateTime<Utc>,
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Per-tier limit table
    pub limits: QuotaLimits,
    /// How long an uncommitted reservation holds its slot
    pub reservation_ttl: Duration,
    /// Interval of the background expiry sweep
    pub sweep_interval: Duration,
    /// Spawn the background sweep (requires a Tokio runtime)
    pub enable_background_sweep: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            limits: QuotaLimits::default(),
            reservation_ttl: Duration::from_secs(reservations::DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(reservations::DEFAULT_SWEEP_INTERVAL_SECS),
            enable_background_sweep: false,
        }
    }
}

/// Per-user, per-action quota gateway
pub struct QuotaGateway {
    accounts: Arc<dyn AccountStore>,
    limits: QuotaLimits,
    reservation_ttl: Duration,
    holds: Arc<HoldTable>,
    shutdown_tx: Option<tokio::sync::mpsc::Sender<()>>,
}

impl QuotaGateway {
    /// Create a gateway over an account store
    ///
    /// When `enable_background_sweep` is set this spawns a Tokio task and must be
    /// called from within a runtime.
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountStore>, config: GatewayConfig) -> Self {
        let holds = Arc::new(HoldTable::default());

        let shutdown_tx = if config.enable_background_sweep {
            let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
            let sweep_holds = holds.clone();
            let sweep_interval = config.sweep_interval;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(sweep_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let released = sweep_holds.sweep_expired(Instant::now());
                            if released > 0 {
                                info!(released, "Released expired quota reservations");
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            debug!("Reservation sweep received shutdown signal");
                            break;
                        }
                    }
                }
            });

            Some(shutdown_tx)
        } else {
            None
        };

        Self {
            accounts,
            limits: config.limits,
            reservation_ttl: config.reservation_ttl,
            holds,
            shutdown_tx,
        }
    }

    /// Limit table in force
    #[must_use]
    pub const fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    /// Decide whether `action` may proceed for `user_id` and hold a slot if so
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` (or `ResourceNotFound`) when the account store
    /// cannot answer; the action is then denied
    pub async fn check_and_reserve(&self, user_id: Uuid, action: ActionKind) -> AppResult<Decision> {
        let slot = self.holds.slot(user_id, action);
        let mut holds = slot.lock().await;
        let expired = holds.prune(Instant::now());
        if expired > 0 {
            debug!(%user_id, %action, expired, "Pruned expired reservations");
        }

        let state = self.accounts.get_user(user_id).await.map_err(|e| {
            warn!(%user_id, %action, error = %e, "Quota check failed, denying action");
            e.with_user_id(user_id)
        })?;

        let resets_at = period::next_monthly_reset(Utc::now());
        let limit = self.limits.limit(state.tier, action);

        let Some(ceiling) = limit.as_finite() else {
            debug!(%user_id, %action, tier = %state.tier, "Unlimited tier, allowing");
            return Ok(Decision::Allowed {
                remaining: Remaining::Unbounded,
                reservation: Reservation::new(user_id, action, limit, None),
                resets_at,
            });
        };

        let used = state.used(action);
        let pending = u32::try_from(holds.len()).unwrap_or(u32::MAX);
        let effective = used.saturating_add(pending);

        if effective >= ceiling {
            info!(%user_id, %action, used, pending, limit = ceiling, "Quota exhausted");
            return Ok(Decision::Denied {
                action,
                message: action.denial_message(ceiling),
                remaining: 0,
                resets_at,
            });
        }

        let expires_at = Instant::now() + self.reservation_ttl;
        let reservation = Reservation::new(user_id, action, limit, Some(expires_at));
        holds.insert(reservation.id(), expires_at);
        drop(holds);

        debug!(
            %user_id,
            %action,
            reservation_id = %reservation.id(),
            remaining = ceiling - effective,
            "Quota slot reserved"
        );

        Ok(Decision::Allowed {
            remaining: Remaining::Finite(ceiling - effective),
            reservation,
            resets_at,
        })
    }

    /// Consume the reserved slot: increment usage by exactly one
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the reservation was already committed or released
    /// - `QuotaDenied` if the limit was reached meanwhile (an expired hold, another
    ///   process, or a downgrade to a limited tier)
    /// - `StoreUnavailable` if the store cannot be reached (the reservation
    ///   stays reserved and may be committed again)
    pub async fn commit(&self, reservation: &mut Reservation) -> AppResult<()> {
        match reservation.state() {
            ReservationState::Reserved => {}
            ReservationState::Committed => {
                return Err(AppError::invalid_state("Reservation already committed")
                    .with_resource_id(reservation.id().to_string()));
            }
            ReservationState::Released => {
                return Err(AppError::invalid_state("Reservation already released")
                    .with_resource_id(reservation.id().to_string()));
            }
        }

        let user_id = reservation.user_id();
        let action = reservation.action();
        let slot = self.holds.slot(user_id, action);
        let mut holds = slot.lock().await;
        let was_held = holds.remove(&reservation.id());

        // The tier may have changed since the slot was reserved
        let outcome = async {
            let state = self.accounts.get_user(user_id).await?;
            let ceiling = self.limits.limit(state.tier, action).ceiling();
            let incremented = self
                .accounts
                .increment_if_below(user_id, action, ceiling)
                .await?;
            Ok::<_, AppError>((incremented, ceiling))
        }
        .await;

        let (incremented, ceiling) = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                if let (true, Some(expires_at)) = (was_held, reservation.expires_at()) {
                    holds.insert(reservation.id(), expires_at);
                }
                warn!(%user_id, %action, error = %e, "Quota commit failed");
                return Err(e.with_user_id(user_id));
            }
        };
        drop(holds);

        if !incremented {
            reservation.mark(ReservationState::Released);
            warn!(
                %user_id,
                %action,
                reservation_id = %reservation.id(),
                was_held,
                "Quota ceiling reached at commit"
            );
            return Err(AppError::quota_denied(action.as_str(), action.denial_message(ceiling))
                .with_user_id(user_id));
        }

        reservation.mark(ReservationState::Committed);
        info!(%user_id, %action, reservation_id = %reservation.id(), "Quota usage committed");
        Ok(())
    }

    /// Return the reserved slot without touching usage; no-op unless reserved
    pub async fn release(&self, reservation: &mut Reservation) {
        if reservation.state() != ReservationState::Reserved {
            return;
        }

        if reservation.holds_slot() {
            let slot = self.holds.slot(reservation.user_id(), reservation.action());
            slot.lock().await.remove(&reservation.id());
        }

        reservation.mark(ReservationState::Released);
        debug!(
            user_id = %reservation.user_id(),
            action = %reservation.action(),
            reservation_id = %reservation.id(),
            "Quota reservation released"
        );
    }

    /// Reserve, run `op`, then commit on success or release on failure
    ///
    /// Used for metered features without a review step (meal recommendations,
    /// recipe creation).
    ///
    /// # Errors
    ///
    /// Returns `QuotaDenied` without running `op` when the limit is reached,
    /// the store error when the check cannot complete, or the error from `op`
    pub async fn run_metered<T, F, Fut>(
        &self,
        user_id: Uuid,
        action: ActionKind,
        op: F,
    ) -> AppResult<T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
        T: Send,
    {
        let mut reservation = self
            .check_and_reserve(user_id, action)
            .await?
            .into_reservation()?;

        match op().await {
            Ok(value) => {
                self.commit(&mut reservation).await?;
                Ok(value)
            }
            Err(e) => {
                self.release(&mut reservation).await;
                Err(e)
            }
        }
    }

    /// Per-action usage overview for display
    ///
    /// # Errors
    ///
    /// Returns the account store error if the user cannot be read
    pub async fn usage_summary(&self, user_id: Uuid) -> AppResult<UsageSummary> {
        let state = self.accounts.get_user(user_id).await?;
        let mut actions = Vec::with_capacity(ActionKind::ALL.len());

        for action in ActionKind::ALL {
            let used = state.used(action);
            let pending =
                u32::try_from(self.holds.pending(user_id, action).await).unwrap_or(u32::MAX);
            let limit = self.limits.limit(state.tier, action);
            let remaining = match limit {
                QuotaLimit::Unlimited => Remaining::Unbounded,
                QuotaLimit::Finite(n) => Remaining::Finite(n.saturating_sub(used.saturating_add(pending))),
            };
            actions.push(ActionUsage {
                action,
                used,
                pending,
                limit,
                remaining,
            });
        }

        Ok(UsageSummary {
            user_id,
            tier: state.tier.to_string(),
            actions,
            resets_at: period::next_monthly_reset(Utc::now()),
        })
    }

    /// Release every expired hold now; returns how many were released
    pub fn sweep_expired(&self) -> usize {
        self.holds.sweep_expired(Instant::now())
    }
}

impl Drop for QuotaGateway {
    fn drop(&mut self) {
        if let Some(tx) = &self.shutdown_tx {
            if let Err(e) = tx.try_send(()) {
                debug!(error = ?e, "Reservation sweep shutdown signal send failed (channel likely closed)");
            }
        }
    }
}
