// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! `bullion-live fetch`: run one render session and print the snapshot.

use crate::config::RenderOptions;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::PageRenderer;
use anyhow::{Context, Result};

/// Run the fetch command.
pub async fn run(compact: bool) -> Result<()> {
    let renderer = ChromiumRenderer::new()?;
    let options = RenderOptions::default();
    eprintln!("Fetching {} ...", options.url);

    let snapshot = renderer.render_and_extract(&options).await?;

    let json = if compact {
        serde_json::to_string(&snapshot)
    } else {
        serde_json::to_string_pretty(&snapshot)
    }
    .context("failed to serialize snapshot")?;
    println!("{json}");
    Ok(())
}
