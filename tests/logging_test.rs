// ABOUTME: Integration tests for logging configuration and subscriber installation
// ABOUTME: Environment parsing and the single global subscriber rule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use pantry_chef::errors::ErrorCode;
use pantry_chef::logging::{LogFormat, LoggingConfig};
use serial_test::serial;
use std::env;

const LOGGING_VARS: &[&str] = &[
    "RUST_LOG",
    "LOG_FORMAT",
    "ENVIRONMENT",
    "SERVICE_NAME",
    "LOG_INCLUDE_LOCATION",
    "LOG_INCLUDE_SPANS",
];

fn clear_logging_env() {
    for var in LOGGING_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_logging_env();

    let config = LoggingConfig::from_env();

    assert_eq!(config.level, "info");
    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.service_name, "pantry-chef");
    assert_eq!(config.environment, "development");
    assert!(!config.include_location);
}

#[test]
#[serial]
fn test_production_json_logging() {
    clear_logging_env();
    env::set_var("ENVIRONMENT", "production");
    env::set_var("LOG_FORMAT", "JSON");
    env::set_var("RUST_LOG", "pantry_chef=debug");

    let config = LoggingConfig::from_env();
    clear_logging_env();

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, "pantry_chef=debug");
    assert!(config.include_location);
    assert!(config.env_filter().to_string().contains("pantry_chef=debug"));
}

#[test]
#[serial]
fn test_second_install_is_a_config_error() {
    clear_logging_env();
    let config = LoggingConfig {
        format: LogFormat::Compact,
        level: "warn".into(),
        ..LoggingConfig::default()
    };

    config.init().unwrap();
    let err = config.init().unwrap_err();

    assert_eq!(err.code, ErrorCode::ConfigError);
}
