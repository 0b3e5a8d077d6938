// ABOUTME: Per-client scan-review-commit pipeline tying quota, recognition, review and commit together
// ABOUTME: Owns the review session and its quota reservation; releases the slot on every failure path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Scan-Review-Commit Pipeline
//!
//! One [`PantryPipeline`] serves one client and one user. It owns at most one
//! review session together with the quota reservation taken when the scan
//! began:
//!
//! 1. `begin_scan` reserves a `pantry_scan` slot, calls the recognition
//!    adapter and loads the drafts into a fresh session.
//! 2. Review operations mutate the session synchronously.
//! 3. `commit_review` writes the drafts and, once the write succeeded,
//!    commits the reservation. A failed write keeps the session and the
//!    reservation for a retry. The receipt's [`UsageStatus`] reports whether
//!    the scan was counted; a scan the account store could not count stays
//!    pending and is counted before the next scan is allowed.
//!
//! The reservation is released when recognition fails, when the scan finds
//! nothing, when the session is cancelled or replaced, and when the pipeline
//! is dropped. Abandoned reservations that escape all of these expire.

use crate::commit::{CommitCoordinator, CommitReceipt, UsageStatus};
use crate::quota::{Decision, QuotaGateway, Remaining, Reservation, ReservationState};
use crate::recognition::RecognitionAdapter;
use crate::review::{DraftId, ReviewSession, ReviewSnapshot};
use chrono::{DateTime, Utc};
use pantry_chef_core::errors::{AppError, AppResult, ErrorCode};
use pantry_chef_core::models::{ActionKind, IngredientDraft};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared collaborators; cheap to clone, one per process
#[derive(Clone)]
pub struct PantryServices {
    /// Quota gateway
    pub gateway: Arc<QuotaGateway>,
    /// Recognition adapter
    pub recognition: RecognitionAdapter,
    /// Commit coordinator
    pub coordinator: CommitCoordinator,
}

impl PantryServices {
    /// Bundle the collaborators
    #[must_use]
    pub const fn new(
        gateway: Arc<QuotaGateway>,
        recognition: RecognitionAdapter,
        coordinator: CommitCoordinator,
    ) -> Self {
        Self {
            gateway,
            recognition,
            coordinator,
        }
    }

    /// Open a pipeline for one client acting as `user_id`
    #[must_use]
    pub fn pipeline(&self, user_id: Uuid) -> PantryPipeline {
        PantryPipeline::new(self.clone(), user_id)
    }
}

/// Result of a successful `begin_scan`
#[derive(Debug, Clone, Serialize)]
pub struct ScanStarted {
    /// Scans left before this one is committed
    pub remaining: Remaining,
    /// When usage counters next reset
    pub resets_at: DateTime<Utc>,
    /// Session contents after loading
    pub review: ReviewSnapshot,
}

struct ActiveScan {
    session: ReviewSession,
    reservation: Option<Reservation>,
}

/// Single-owner pipeline for one client
pub struct PantryPipeline {
    services: PantryServices,
    user_id: Uuid,
    active: Option<ActiveScan>,
    unrecorded: Option<Reservation>,
}

impl PantryPipeline {
    /// Create a pipeline with no session
    #[must_use]
    pub const fn new(services: PantryServices, user_id: Uuid) -> Self {
        Self {
            services,
            user_id,
            active: None,
            unrecorded: None,
        }
    }

    /// User this pipeline acts for
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Whether a review session exists
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a committed scan still waits to be counted
    #[must_use]
    pub const fn has_pending_usage(&self) -> bool {
        self.unrecorded.is_some()
    }

    /// Count a scan whose pantry write succeeded while the account store was
    /// unavailable; no-op when nothing is pending
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the account store still cannot be reached; the
    /// scan stays pending
    pub async fn record_pending_usage(&mut self) -> AppResult<UsageStatus> {
        let Some(mut reservation) = self.unrecorded.take() else {
            return Ok(UsageStatus::Unmetered);
        };
        match self.settle_usage(&mut reservation).await {
            Ok(status) => Ok(status),
            Err(e) => {
                self.unrecorded = Some(reservation);
                Err(e)
            }
        }
    }

    /// Reserve a scan, recognize the image and open a review session
    ///
    /// An existing session is discarded first and its reservation released.
    /// A scan still waiting to be counted is counted first.
    ///
    /// # Errors
    ///
    /// - `QuotaDenied` when the scan limit is reached; recognition is not called
    /// - `StoreUnavailable` when the quota check cannot complete or a pending
    ///   scan still cannot be counted
    /// - `RecognitionFailed` when recognition fails; no session is created and
    ///   the reservation is released
    pub async fn begin_scan(&mut self, image: &[u8]) -> AppResult<ScanStarted> {
        if self.active.is_some() {
            debug!(user_id = %self.user_id, "Replacing existing review session");
            self.cancel().await;
        }
        self.record_pending_usage().await?;

        let decision = self
            .services
            .gateway
            .check_and_reserve(self.user_id, ActionKind::PantryScan)
            .await?;
        if let Decision::Denied { message, .. } = &decision {
            info!(user_id = %self.user_id, %message, "Scan refused by quota gateway");
        }
        let remaining = decision.remaining();
        let resets_at = decision.resets_at();
        let mut reservation = decision.into_reservation()?;

        let drafts = match self.services.recognition.recognize(image).await {
            Ok(drafts) => drafts,
            Err(e) => {
                self.services.gateway.release(&mut reservation).await;
                warn!(user_id = %self.user_id, error = %e, "Scan failed, reservation released");
                return Err(e.with_user_id(self.user_id));
            }
        };

        let reservation = if drafts.is_empty() {
            self.services.gateway.release(&mut reservation).await;
            info!(user_id = %self.user_id, "Scan found no ingredients, reservation released");
            None
        } else {
            Some(reservation)
        };

        let mut session = ReviewSession::new();
        session.load(drafts)?;
        let review = session.snapshot();
        info!(user_id = %self.user_id, count = session.len(), "Review session opened");

        self.active = Some(ActiveScan {
            session,
            reservation,
        });

        Ok(ScanStarted {
            remaining,
            resets_at,
            review,
        })
    }

    /// Current session view, `None` when no session exists
    #[must_use]
    pub fn review_state(&self) -> Option<ReviewSnapshot> {
        self.active.as_ref().map(|active| active.session.snapshot())
    }

    /// Borrow the session directly
    #[must_use]
    pub fn session(&self) -> Option<&ReviewSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    /// Begin editing a draft
    ///
    /// # Errors
    ///
    /// `InvalidState` without a session or outside reviewing; `ResourceNotFound`
    /// for an unknown draft
    pub fn start_edit(&mut self, id: DraftId) -> AppResult<()> {
        self.session_mut()?.start_edit(id)
    }

    /// Apply the edit in progress
    ///
    /// # Errors
    ///
    /// `ValidationError` leaves the session editing; `InvalidState` without an edit
    pub fn save_edit(&mut self, name: &str, quantity: &str) -> AppResult<DraftId> {
        self.session_mut()?.save_edit(name, quantity)
    }

    /// Abandon the edit in progress
    ///
    /// # Errors
    ///
    /// `InvalidState` without an edit
    pub fn cancel_edit(&mut self) -> AppResult<()> {
        self.session_mut()?.cancel_edit()
    }

    /// Edit a draft in one step; on failure the session is left as it was
    ///
    /// # Errors
    ///
    /// `ValidationError` for blank fields, `ResourceNotFound` for an unknown
    /// draft, `InvalidState` without a session or while another edit is active
    pub fn edit_draft(&mut self, id: DraftId, name: &str, quantity: &str) -> AppResult<()> {
        let session = self.session_mut()?;
        session.start_edit(id)?;
        if let Err(e) = session.save_edit(name, quantity) {
            session.cancel_edit()?;
            return Err(e);
        }
        Ok(())
    }

    /// Remove a draft
    ///
    /// # Errors
    ///
    /// `InvalidState` without a session or while editing; `ResourceNotFound`
    /// for an unknown draft
    pub fn remove_draft(&mut self, id: DraftId) -> AppResult<IngredientDraft> {
        self.session_mut()?.remove(id)
    }

    /// Write the reviewed drafts and consume the scan
    ///
    /// On success the session is discarded and the receipt reports how the
    /// scan was counted. On `CommitFailed` the session and its reservation are
    /// kept so the caller can retry without re-scanning.
    ///
    /// # Errors
    ///
    /// `InvalidState` without a reviewing session, `ValidationError` for an
    /// empty or invalid batch, `CommitFailed` if the pantry write fails
    pub async fn commit_review(&mut self) -> AppResult<CommitReceipt> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| AppError::invalid_state("No review session to commit"))?;
        let batch = active.session.commit_batch()?;

        let mut receipt = self
            .services
            .coordinator
            .commit_drafts(self.user_id, &batch)
            .await?;

        let reservation = self.active.take().and_then(|active| active.reservation);
        receipt.usage = match reservation {
            Some(mut reservation) => match self.settle_usage(&mut reservation).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(
                        user_id = %self.user_id,
                        reservation_id = %reservation.id(),
                        error = %e,
                        "Pantry written but scan usage could not be recorded yet"
                    );
                    self.unrecorded = Some(reservation);
                    UsageStatus::Pending
                }
            },
            None => UsageStatus::Unmetered,
        };

        Ok(receipt)
    }

    /// Commit a reservation whose pantry write already succeeded
    ///
    /// A lost ceiling race cannot undo the write, so it is reported as
    /// `OverLimit` rather than as an error. Store failures are returned and the
    /// reservation stays reserved.
    async fn settle_usage(&self, reservation: &mut Reservation) -> AppResult<UsageStatus> {
        match self.services.gateway.commit(reservation).await {
            Ok(()) => Ok(UsageStatus::Recorded),
            Err(e) if e.code == ErrorCode::QuotaDenied => {
                warn!(
                    user_id = %self.user_id,
                    reservation_id = %reservation.id(),
                    "Pantry written after the scan limit was reached elsewhere"
                );
                Ok(UsageStatus::OverLimit)
            }
            Err(e) => Err(e),
        }
    }

    /// Add one hand-entered item; unmetered and independent of any session
    ///
    /// # Errors
    ///
    /// `ValidationError` for blank fields, `CommitFailed` if the write fails
    pub async fn add_manual_item(&self, name: &str, quantity: &str) -> AppResult<CommitReceipt> {
        self.services
            .coordinator
            .add_manual_item(self.user_id, name, quantity)
            .await
    }

    /// Clear the drafts but keep the session and its reservation (re-scan prep)
    ///
    /// # Errors
    ///
    /// `InvalidState` without a session
    pub fn reset(&mut self) -> AppResult<()> {
        self.session_mut()?.reset();
        Ok(())
    }

    /// Discard the session and release its reservation
    pub async fn cancel(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        if let Some(mut reservation) = active.reservation {
            self.services.gateway.release(&mut reservation).await;
        }
        debug!(user_id = %self.user_id, "Review session discarded");
    }

    fn session_mut(&mut self) -> AppResult<&mut ReviewSession> {
        self.active
            .as_mut()
            .map(|active| &mut active.session)
            .ok_or_else(|| AppError::invalid_state("No review session"))
    }
}

impl Drop for PantryPipeline {
    fn drop(&mut self) {
        let held = self
            .active
            .take()
            .and_then(|active| active.reservation)
            .filter(|reservation| reservation.state() == ReservationState::Reserved);
        let unrecorded = self.unrecorded.take();
        if held.is_none() && unrecorded.is_none() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let gateway = self.services.gateway.clone();
                let user_id = self.user_id;
                handle.spawn(async move {
                    if let Some(mut reservation) = held {
                        gateway.release(&mut reservation).await;
                    }
                    if let Some(mut reservation) = unrecorded {
                        if let Err(e) = gateway.commit(&mut reservation).await {
                            warn!(
                                %user_id,
                                reservation_id = %reservation.id(),
                                error = %e,
                                "Pending scan usage dropped uncounted"
                            );
                        }
                    }
                });
            }
            Err(_) => {
                debug!(
                    user_id = %self.user_id,
                    "No runtime to settle reservations on drop; holds will expire"
                );
            }
        }
    }
}
