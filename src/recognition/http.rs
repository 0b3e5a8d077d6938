// ABOUTME: HTTP client for the external ingredient recognition service
// ABOUTME: Posts base64-encoded images as JSON and parses the candidate list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{RecognitionService, RecognizedCandidate};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use pantry_chef_core::constants::service_names;
use pantry_chef_core::errors::{AppError, AppResult};
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize)]
struct DetectRequest<'a> {
    image: &'a str,
}

#[derive(Deserialize)]
struct DetectResponse {
    ingredients: Vec<RecognizedCandidate>,
}

/// Recognition service reached over HTTP
#[derive(Clone)]
pub struct HttpRecognitionService {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpRecognitionService {
    /// Build a client for `endpoint` with a request timeout
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the HTTP client cannot be constructed
    pub fn new(
        endpoint: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token,
        })
    }

    /// Service endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RecognitionService for HttpRecognitionService {
    async fn detect(&self, image: &[u8]) -> AppResult<Vec<RecognizedCandidate>> {
        let encoded = general_purpose::STANDARD.encode(image);
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&DetectRequest { image: &encoded });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                warn!(
                    service = service_names::RECOGNITION_SERVICE,
                    status = status.as_u16(),
                    error = %e,
                    "Failed to read recognition error response"
                );
                AppError::recognition_failed(format!(
                    "{} returned {status} and its response could not be read: {e}",
                    service_names::RECOGNITION_SERVICE
                ))
                .with_source(e)
            })?;
            warn!(
                service = service_names::RECOGNITION_SERVICE,
                status = status.as_u16(),
                "Recognition service returned an error status"
            );
            return Err(AppError::recognition_failed(format!(
                "{} returned {status}: {body}",
                service_names::RECOGNITION_SERVICE
            )));
        }

        let parsed: DetectResponse = response.json().await.map_err(|e| {
            AppError::recognition_failed(format!("Malformed recognition response: {e}")).with_source(e)
        })?;

        debug!(
            service = service_names::RECOGNITION_SERVICE,
            candidates = parsed.ingredients.len(),
            "Recognition response parsed"
        );
        Ok(parsed.ingredients)
    }
}
