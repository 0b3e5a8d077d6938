// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Quota inspection command for pantry-chef
// ABOUTME: Prints per-action usage, limits and the next reset

use crate::helpers::display::display_usage;
use pantry_chef::config::ServerConfig;
use pantry_chef::errors::AppResult;
use pantry_chef::quota::{GatewayConfig, QuotaGateway};
use pantry_chef::stores::sqlite::SqliteStore;
use std::sync::Arc;
use uuid::Uuid;

/// Show monthly usage for one account
pub async fn show(store: &SqliteStore, config: &ServerConfig, user_id: Uuid) -> AppResult<()> {
    let gateway = QuotaGateway::new(
        Arc::new(store.clone()),
        GatewayConfig {
            enable_background_sweep: false,
            ..config.gateway_config()
        },
    );
    let summary = gateway.usage_summary(user_id).await?;
    display_usage(&summary);
    Ok(())
}
