// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Start the scheduler and the HTTP API.

use crate::config;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{NoopRenderer, PageRenderer};
use crate::rest;
use crate::scheduler::Scheduler;
use crate::state::StateStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Run the server until Ctrl-C.
pub async fn run(port: u16) -> Result<()> {
    info!("starting bullion-live v{}", env!("CARGO_PKG_VERSION"));

    // Initialize browser renderer
    let renderer: Arc<dyn PageRenderer> = match ChromiumRenderer::new() {
        Ok(renderer) => {
            info!(executable = %renderer.executable().display(), "Chromium found");
            Arc::new(renderer)
        }
        Err(e) => {
            warn!("{e}");
            warn!("every fetch cycle will fail until Chromium is installed");
            Arc::new(NoopRenderer)
        }
    };

    let store = StateStore::new();
    let reader = store.reader();
    let scheduler = Scheduler::new(renderer, store).spawn();

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
    };

    let result = rest::start(config::bind_addr(port), reader, shutdown)
        .await
        .with_context(|| format!("HTTP server on port {port} failed"));

    scheduler.abort();
    info!("server stopped");
    result
}
