// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fundlens library — resilient remote-browser scraping orchestration.
//!
//! This library crate exposes the core modules for integration testing.

#![allow(dead_code, clippy::new_without_default)]

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod domains;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod retry;
pub mod session;
pub mod store;
pub mod testutil;
pub mod throttle;
pub mod upstream;
