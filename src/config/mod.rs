// ABOUTME: Configuration management module for the pantry services
// ABOUTME: Environment-driven settings for stores, recognition, reservations and limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! All settings come from environment variables; see
//! [`environment::ServerConfig::from_env`].

/// Environment and server configuration
pub mod environment;

pub use environment::{DatabaseUrl, RecognitionConfig, ReservationConfig, ServerConfig};
