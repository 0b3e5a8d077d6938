// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Re-exports command modules for pantry-chef
// ABOUTME: Account, quota, scan and pantry commands

pub mod pantry;
pub mod quota;
pub mod scan;
pub mod user;
