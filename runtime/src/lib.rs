// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! bullion-live scrapes bullion rates from a client-rendered page with
//! headless Chromium and serves the latest snapshot as JSON.
//!
//! The library crate exposes the core modules for integration testing.

pub mod cli;
pub mod config;
pub mod extract;
pub mod renderer;
pub mod rest;
pub mod scheduler;
pub mod snapshot;
pub mod state;
