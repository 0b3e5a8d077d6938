// ABOUTME: Recognition adapter turning pantry photos into ingredient drafts
// ABOUTME: Wraps a pluggable recognition service and normalizes its candidates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Recognition
//!
//! [`RecognitionService`] is the collaborator contract: image bytes in, raw
//! candidates out. [`RecognitionAdapter`] sits in front of it and produces the
//! [`IngredientDraft`] sequence that seeds a review session.
//!
//! Normalization rules:
//! - names are trimmed; candidates with a blank name are dropped
//! - a missing quantity becomes an empty placeholder the user must fill in
//! - confidence is clamped to `[0, 1]`; non-finite scores are dropped
//! - zero candidates is a valid result, distinct from a service failure

/// HTTP recognition service client
pub mod http;

pub use http::HttpRecognitionService;

use async_trait::async_trait;
use pantry_chef_core::errors::{AppError, AppResult, ErrorCode};
use pantry_chef_core::models::IngredientDraft;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw candidate as reported by a recognition service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedCandidate {
    /// Detected ingredient name
    pub name: String,
    /// Best-guess quantity, if the service offers one
    #[serde(default)]
    pub quantity: Option<String>,
    /// Detection confidence, nominally in `[0, 1]`
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl RecognizedCandidate {
    /// Convenience constructor
    pub fn new(name: impl Into<String>, quantity: Option<&str>, confidence: Option<f64>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.map(str::to_owned),
            confidence,
        }
    }
}

/// Image recognition service contract
#[async_trait]
pub trait RecognitionService: Send + Sync {
    /// Detect ingredients in an image
    ///
    /// # Errors
    ///
    /// Returns `RecognitionFailed` on transport errors or malformed output
    async fn detect(&self, image: &[u8]) -> AppResult<Vec<RecognizedCandidate>>;
}

/// Normalizing front for a [`RecognitionService`]
#[derive(Clone)]
pub struct RecognitionAdapter {
    service: Arc<dyn RecognitionService>,
}

impl RecognitionAdapter {
    /// Wrap a recognition service
    #[must_use]
    pub fn new(service: Arc<dyn RecognitionService>) -> Self {
        Self { service }
    }

    /// Recognize ingredients in `image` and return them as drafts
    ///
    /// # Errors
    ///
    /// Returns `RecognitionFailed` if the image is empty or the service fails;
    /// any other error kind from the service is folded into `RecognitionFailed`
    pub async fn recognize(&self, image: &[u8]) -> AppResult<Vec<IngredientDraft>> {
        if image.is_empty() {
            return Err(AppError::recognition_failed("Image is empty"));
        }

        let candidates = self.service.detect(image).await.map_err(|e| {
            if e.code == ErrorCode::RecognitionFailed {
                e
            } else {
                AppError::recognition_failed(e.message.clone()).with_source(e)
            }
        })?;

        let received = candidates.len();
        let drafts: Vec<IngredientDraft> = candidates.into_iter().filter_map(normalize).collect();

        debug!(
            received,
            kept = drafts.len(),
            image_bytes = image.len(),
            "Recognition completed"
        );
        Ok(drafts)
    }
}

fn normalize(candidate: RecognizedCandidate) -> Option<IngredientDraft> {
    let name = candidate.name.trim();
    if name.is_empty() {
        warn!("Dropping recognition candidate with blank name");
        return None;
    }

    let quantity = candidate
        .quantity
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();

    Some(IngredientDraft::recognized(name, quantity, candidate.confidence))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedService(Vec<RecognizedCandidate>);

    #[async_trait]
    impl RecognitionService for FixedService {
        async fn detect(&self, _image: &[u8]) -> AppResult<Vec<RecognizedCandidate>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenService;

    #[async_trait]
    impl RecognitionService for BrokenService {
        async fn detect(&self, _image: &[u8]) -> AppResult<Vec<RecognizedCandidate>> {
            Err(AppError::internal("model crashed"))
        }
    }

    #[tokio::test]
    async fn test_candidates_are_normalized() {
        let adapter = RecognitionAdapter::new(Arc::new(FixedService(vec![
            RecognizedCandidate::new(" Milk ", Some("1L"), Some(1.4)),
            RecognizedCandidate::new("   ", Some("3"), Some(0.5)),
            RecognizedCandidate::new("Basil", None, Some(f64::NAN)),
        ])));

        let drafts = adapter.recognize(b"jpeg").await.unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].name, "Milk");
        assert_eq!(drafts[0].confidence, Some(1.0));
        assert_eq!(drafts[1].quantity, "");
        assert_eq!(drafts[1].confidence, None);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let adapter = RecognitionAdapter::new(Arc::new(FixedService(Vec::new())));
        assert!(adapter.recognize(b"jpeg").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_errors_become_recognition_failed() {
        let adapter = RecognitionAdapter::new(Arc::new(BrokenService));
        let err = adapter.recognize(b"jpeg").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RecognitionFailed);

        let err = adapter.recognize(&[]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RecognitionFailed);
    }
}
