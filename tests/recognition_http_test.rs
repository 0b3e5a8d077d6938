// ABOUTME: Integration tests for the HTTP recognition client against a mock service
// ABOUTME: Request encoding, bearer auth, error statuses and malformed responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use common::init_test_logging;
use pantry_chef::errors::ErrorCode;
use pantry_chef::recognition::{HttpRecognitionService, RecognitionAdapter, RecognitionService};
use serde_json::json;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nfridge";

fn client_for(server: &MockServer, token: Option<&str>) -> Result<HttpRecognitionService> {
    Ok(HttpRecognitionService::new(
        format!("{}/detect", server.uri()),
        token.map(str::to_owned),
        Duration::from_secs(5),
    )?)
}

#[tokio::test]
async fn test_detect_posts_base64_image_and_parses_candidates() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(body_json(json!({ "image": general_purpose::STANDARD.encode(IMAGE) })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ingredients": [
                { "name": "Milk", "quantity": "1L", "confidence": 0.95 },
                { "name": "Eggs", "quantity": "12" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = client_for(&server, None)?.detect(IMAGE).await?;

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].name, "Milk");
    assert_eq!(candidates[0].confidence, Some(0.95));
    assert_eq!(candidates[1].quantity.as_deref(), Some("12"));
    assert_eq!(candidates[1].confidence, None);
    Ok(())
}

#[tokio::test]
async fn test_detect_sends_bearer_token() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(header("authorization", "Bearer vision-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ingredients": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = client_for(&server, Some("vision-secret"))?
        .detect(IMAGE)
        .await?;

    assert!(candidates.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_error_status_becomes_recognition_failed() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model warming up"))
        .mount(&server)
        .await;

    let err = client_for(&server, None)?.detect(IMAGE).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::RecognitionFailed);
    assert!(err.message.contains("503"));
    assert!(err.message.contains("model warming up"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_becomes_recognition_failed() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "labels": ["milk"] })))
        .mount(&server)
        .await;

    let err = client_for(&server, None)?.detect(IMAGE).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::RecognitionFailed);
    assert!(err.message.starts_with("Malformed recognition response"));
    Ok(())
}

#[tokio::test]
async fn test_adapter_normalizes_http_candidates() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ingredients": [
                { "name": "  Butter ", "quantity": " 250g ", "confidence": 0.7 },
                { "name": "   ", "quantity": "1" },
                { "name": "Basil" }
            ]
        })))
        .mount(&server)
        .await;

    let adapter = RecognitionAdapter::new(Arc::new(client_for(&server, None)?));
    let drafts = adapter.recognize(IMAGE).await?;

    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].name, "Butter");
    assert_eq!(drafts[0].quantity, "250g");
    assert_eq!(drafts[1].name, "Basil");
    assert_eq!(drafts[1].quantity, "");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_service_becomes_recognition_failed() -> Result<()> {
    init_test_logging();
    let port = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let endpoint = format!("http://127.0.0.1:{port}/detect");

    let client = HttpRecognitionService::new(endpoint, None, Duration::from_secs(2))?;
    let err = client.detect(IMAGE).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::RecognitionFailed);
    assert!(err.is_retryable());
    Ok(())
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}

/// Answer one request with a 503 whose body ends before its declared length
fn truncated_error_endpoint() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    std::thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0_u8; 4096];
        while !request_complete(&request) {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let _ = stream.write_all(
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Type: text/plain\r\nContent-Length: 64\r\n\r\nmodel warm",
        );
        let _ = stream.flush();
    });
    Ok(format!("http://{addr}/detect"))
}

#[tokio::test]
async fn test_unreadable_error_body_becomes_recognition_failed() -> Result<()> {
    init_test_logging();
    let client =
        HttpRecognitionService::new(truncated_error_endpoint()?, None, Duration::from_secs(5))?;

    let err = client.detect(IMAGE).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::RecognitionFailed);
    assert!(err.message.contains("503"));
    assert!(err.message.contains("could not be read"));
    assert!(std::error::Error::source(&err).is_some());
    Ok(())
}
