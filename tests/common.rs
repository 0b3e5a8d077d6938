// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory stores, scripted recognition service and failure-injecting collaborators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `pantry_chef`

use async_trait::async_trait;
use pantry_chef::commit::CommitCoordinator;
use pantry_chef::errors::{AppError, AppResult};
use pantry_chef::models::{ActionKind, PantryItem, Tier, UserQuotaState};
use pantry_chef::pipeline::PantryServices;
use pantry_chef::quota::{GatewayConfig, QuotaGateway};
use pantry_chef::recognition::{RecognitionAdapter, RecognitionService, RecognizedCandidate};
use pantry_chef::stores::memory::{InMemoryAccountStore, InMemoryPantryStore};
use pantry_chef::stores::{AccountStore, PantryStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Gateway settings for tests: no background task, long-lived holds
pub fn test_gateway_config() -> GatewayConfig {
    GatewayConfig {
        enable_background_sweep: false,
        ..GatewayConfig::default()
    }
}

/// Account store whose every call fails as if the backend were down
#[derive(Default)]
pub struct UnreachableAccountStore;

#[async_trait]
impl AccountStore for UnreachableAccountStore {
    async fn get_user(&self, _user_id: Uuid) -> AppResult<UserQuotaState> {
        Err(AppError::store_unavailable("account store connection refused"))
    }

    async fn increment_if_below(
        &self,
        _user_id: Uuid,
        _action: ActionKind,
        _limit: u32,
    ) -> AppResult<bool> {
        Err(AppError::store_unavailable("account store connection refused"))
    }
}

/// Account store that reads normally but can be told to fail increments
pub struct FlakyAccountStore {
    pub inner: InMemoryAccountStore,
    pub fail_increments: AtomicBool,
}

impl FlakyAccountStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryAccountStore::new(),
            fail_increments: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AccountStore for FlakyAccountStore {
    async fn get_user(&self, user_id: Uuid) -> AppResult<UserQuotaState> {
        self.inner.get_user(user_id).await
    }

    async fn increment_if_below(
        &self,
        user_id: Uuid,
        action: ActionKind,
        limit: u32,
    ) -> AppResult<bool> {
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(AppError::store_unavailable("account store write timed out"));
        }
        self.inner.increment_if_below(user_id, action, limit).await
    }
}

/// Pantry store that rejects the next `failures` writes, then delegates
pub struct FlakyPantryStore {
    pub inner: InMemoryPantryStore,
    failures: AtomicUsize,
    pub attempts: AtomicUsize,
}

impl FlakyPantryStore {
    pub fn failing(failures: usize) -> Self {
        Self {
            inner: InMemoryPantryStore::new(),
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PantryStore for FlakyPantryStore {
    async fn write_items(&self, user_id: Uuid, items: &[PantryItem]) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::store_unavailable("pantry store write rejected"));
        }
        self.inner.write_items(user_id, items).await
    }

    async fn list_items(&self, user_id: Uuid) -> AppResult<Vec<PantryItem>> {
        self.inner.list_items(user_id).await
    }
}

/// Recognition service returning a fixed script and counting calls
pub struct ScriptedRecognition {
    result: Mutex<Result<Vec<RecognizedCandidate>, String>>,
    pub calls: AtomicUsize,
}

impl ScriptedRecognition {
    pub fn returning(candidates: Vec<RecognizedCandidate>) -> Self {
        Self {
            result: Mutex::new(Ok(candidates)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(cause: &str) -> Self {
        Self {
            result: Mutex::new(Err(cause.to_owned())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_result(&self, candidates: Vec<RecognizedCandidate>) {
        *self.result.lock().unwrap() = Ok(candidates);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionService for ScriptedRecognition {
    async fn detect(&self, _image: &[u8]) -> AppResult<Vec<RecognizedCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.result.lock().unwrap().clone();
        result.map_err(AppError::recognition_failed)
    }
}

/// Milk and eggs, as recognized from a fridge photo
pub fn fridge_candidates() -> Vec<RecognizedCandidate> {
    vec![
        RecognizedCandidate::new("Milk", Some("1L"), Some(0.95)),
        RecognizedCandidate::new("Eggs", Some("12"), Some(0.88)),
    ]
}

/// Fully wired in-memory services
pub struct Harness {
    pub accounts: Arc<InMemoryAccountStore>,
    pub pantry: Arc<InMemoryPantryStore>,
    pub recognition: Arc<ScriptedRecognition>,
    pub gateway: Arc<QuotaGateway>,
    pub services: PantryServices,
}

impl Harness {
    pub fn new(recognition: ScriptedRecognition) -> Self {
        init_test_logging();
        let accounts = Arc::new(InMemoryAccountStore::new());
        let pantry = Arc::new(InMemoryPantryStore::new());
        let recognition = Arc::new(recognition);
        let gateway = Arc::new(QuotaGateway::new(accounts.clone(), test_gateway_config()));
        let services = PantryServices::new(
            gateway.clone(),
            RecognitionAdapter::new(recognition.clone()),
            CommitCoordinator::new(pantry.clone()),
        );
        Self {
            accounts,
            pantry,
            recognition,
            gateway,
            services,
        }
    }

    /// Create a user whose counter for `action` already stands at `used`
    pub fn user_with_usage(&self, tier: Tier, action: ActionKind, used: u32) -> Uuid {
        let user_id = Uuid::new_v4();
        let mut state = UserQuotaState::new(user_id, tier);
        state.usage.insert(action, used);
        self.accounts.upsert_user(state);
        user_id
    }

    pub async fn scans_used(&self, user_id: Uuid) -> u32 {
        self.accounts
            .get_user(user_id)
            .await
            .unwrap()
            .used(ActionKind::PantryScan)
    }
}

/// Let spawned release tasks run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
