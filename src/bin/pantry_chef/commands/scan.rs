// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Scan command for pantry-chef: recognize, review and optionally commit
// ABOUTME: Applies positional edits and removals before handing drafts to the pipeline

use crate::helpers::display::{display_receipt, display_review};
use pantry_chef::commit::CommitCoordinator;
use pantry_chef::config::ServerConfig;
use pantry_chef::errors::{AppError, AppResult};
use pantry_chef::pipeline::PantryServices;
use pantry_chef::quota::QuotaGateway;
use pantry_chef::recognition::{HttpRecognitionService, RecognitionAdapter};
use pantry_chef::review::DraftId;
use pantry_chef::stores::sqlite::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Arguments of one scan invocation
pub struct ScanRequest {
    pub user_id: Uuid,
    pub image: PathBuf,
    pub edits: Vec<String>,
    pub removals: Vec<usize>,
    pub commit: bool,
}

struct Edit {
    position: usize,
    name: String,
    quantity: String,
}

fn parse_edit(raw: &str) -> AppResult<Edit> {
    let invalid = || AppError::validation("edit", format!("Expected N=NAME:QTY, got '{raw}'"));
    let (position, rest) = raw.split_once('=').ok_or_else(invalid)?;
    let (name, quantity) = rest.rsplit_once(':').ok_or_else(invalid)?;
    Ok(Edit {
        position: position.trim().parse().map_err(|_| invalid())?,
        name: name.to_owned(),
        quantity: quantity.to_owned(),
    })
}

/// Run a scan through the full pipeline
pub async fn run(store: &SqliteStore, config: &ServerConfig, request: ScanRequest) -> AppResult<()> {
    let service_url = config.recognition.service_url.clone().ok_or_else(|| {
        AppError::config("RECOGNITION_SERVICE_URL must be set to scan images")
    })?;
    let edits = request
        .edits
        .iter()
        .map(|raw| parse_edit(raw))
        .collect::<AppResult<Vec<_>>>()?;

    let image = tokio::fs::read(&request.image).await.map_err(|e| {
        AppError::validation("image", format!("Cannot read {}: {e}", request.image.display()))
    })?;

    let service = HttpRecognitionService::new(
        service_url,
        config.recognition.api_token.clone(),
        config.recognition_timeout(),
    )?;
    let services = PantryServices::new(
        Arc::new(QuotaGateway::new(
            Arc::new(store.clone()),
            config.gateway_config(),
        )),
        RecognitionAdapter::new(Arc::new(service)),
        CommitCoordinator::new(Arc::new(store.clone())),
    );

    let mut pipeline = services.pipeline(request.user_id);
    let started = pipeline.begin_scan(&image).await?;
    info!(user_id = %request.user_id, remaining = ?started.remaining, "Scan complete");
    display_review(&started.review);

    // Positions refer to the list as first shown; resolve them before anything shifts
    let session = pipeline
        .session()
        .ok_or_else(|| AppError::internal("Scan finished without a review session"))?;
    let resolve = |position: usize| {
        session
            .id_at(position)
            .ok_or_else(|| AppError::not_found(format!("Draft at position {position}")))
    };
    let edit_targets = edits
        .iter()
        .map(|edit| resolve(edit.position))
        .collect::<AppResult<Vec<DraftId>>>()?;
    let removal_targets = request
        .removals
        .iter()
        .map(|position| resolve(*position))
        .collect::<AppResult<Vec<DraftId>>>()?;

    for (edit, id) in edits.iter().zip(edit_targets) {
        pipeline.edit_draft(id, &edit.name, &edit.quantity)?;
    }
    for id in removal_targets {
        pipeline.remove_draft(id)?;
    }

    if let Some(review) = pipeline.review_state() {
        if !request.edits.is_empty() || !request.removals.is_empty() {
            display_review(&review);
        }
    }

    if request.commit {
        let receipt = pipeline.commit_review().await?;
        display_receipt(&receipt);
    } else {
        pipeline.cancel().await;
        println!("Review discarded; rerun with --commit to save (the scan was not counted)");
    }
    Ok(())
}
