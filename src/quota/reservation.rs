// ABOUTME: Explicit quota reservation objects and the expiring hold table behind them
// ABOUTME: Reservations move reserved -> committed | released; abandoned holds time out
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use dashmap::DashMap;
use pantry_chef_core::models::{ActionKind, QuotaLimit};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Lifecycle of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    /// Slot held, waiting for commit or release
    Reserved,
    /// Usage counter incremented
    Committed,
    /// Slot returned without touching the usage counter
    Released,
}

/// Tentative quota consumption held between check and commit/release
///
/// Not `Clone`: one reservation commits at most once.
#[derive(Debug)]
#[must_use = "a reservation must be committed or released"]
pub struct Reservation {
    id: Uuid,
    user_id: Uuid,
    action: ActionKind,
    limit: QuotaLimit,
    expires_at: Option<Instant>,
    state: ReservationState,
}

impl Reservation {
    pub(crate) fn new(
        user_id: Uuid,
        action: ActionKind,
        limit: QuotaLimit,
        expires_at: Option<Instant>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            action,
            limit,
            expires_at,
            state: ReservationState::Reserved,
        }
    }

    /// Reservation identifier
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Owning user
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Metered action
    #[must_use]
    pub const fn action(&self) -> ActionKind {
        self.action
    }

    /// Limit in force when the slot was reserved
    #[must_use]
    pub const fn limit(&self) -> QuotaLimit {
        self.limit
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> ReservationState {
        self.state
    }

    /// Whether the hold has timed out (unlimited reservations never do)
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Whether this reservation occupies a slot in the hold table
    pub(crate) const fn holds_slot(&self) -> bool {
        self.expires_at.is_some()
    }

    pub(crate) const fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub(crate) fn mark(&mut self, state: ReservationState) {
        self.state = state;
    }
}

/// Pending holds for one `(user, action)` pair, keyed by reservation id
#[derive(Debug, Default)]
pub(crate) struct Holds {
    expiries: HashMap<Uuid, Instant>,
}

impl Holds {
    /// Drop holds whose deadline has passed, returning how many were removed
    pub(crate) fn prune(&mut self, now: Instant) -> usize {
        let before = self.expiries.len();
        self.expiries.retain(|_, at| *at > now);
        before - self.expiries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.expiries.len()
    }

    pub(crate) fn insert(&mut self, id: Uuid, expires_at: Instant) {
        self.expiries.insert(id, expires_at);
    }

    pub(crate) fn remove(&mut self, id: &Uuid) -> bool {
        self.expiries.remove(id).is_some()
    }
}

/// Per-`(user, action)` hold sets; each set is guarded by an async mutex so a
/// check and its hold insertion happen as one step
#[derive(Debug, Default)]
pub(crate) struct HoldTable {
    slots: DashMap<(Uuid, ActionKind), Arc<Mutex<Holds>>>,
}

impl HoldTable {
    pub(crate) fn slot(&self, user_id: Uuid, action: ActionKind) -> Arc<Mutex<Holds>> {
        self.slots
            .entry((user_id, action))
            .or_default()
            .value()
            .clone()
    }

    /// Number of live holds for a pair (expired holds excluded)
    pub(crate) async fn pending(&self, user_id: Uuid, action: ActionKind) -> usize {
        let slot = self.slot(user_id, action);
        let mut holds = slot.lock().await;
        holds.prune(Instant::now());
        holds.len()
    }

    /// Release every expired hold; slots currently locked by a check are
    /// skipped and will prune themselves on their next use
    pub(crate) fn sweep_expired(&self, now: Instant) -> usize {
        let released = self
            .slots
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .try_lock()
                    .ok()
                    .map(|mut holds| holds.prune(now))
            })
            .sum();

        // A slot handed out by `slot()` but not yet locked still has a second owner
        self.slots.retain(|_, slot| {
            Arc::strong_count(slot) > 1 || slot.try_lock().map_or(true, |holds| holds.len() > 0)
        });

        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_prune_drops_only_expired_holds() {
        let now = Instant::now();
        let mut holds = Holds::default();
        holds.insert(Uuid::new_v4(), now - Duration::from_secs(1));
        holds.insert(Uuid::new_v4(), now + Duration::from_secs(60));

        assert_eq!(holds.prune(now), 1);
        assert_eq!(holds.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_releases_expired_slots() {
        let table = HoldTable::default();
        let user_id = Uuid::new_v4();
        let past = Instant::now() - Duration::from_millis(5);
        table
            .slot(user_id, ActionKind::PantryScan)
            .lock()
            .await
            .insert(Uuid::new_v4(), past);

        assert_eq!(table.sweep_expired(Instant::now()), 1);
        assert_eq!(table.pending(user_id, ActionKind::PantryScan).await, 0);
    }
}
