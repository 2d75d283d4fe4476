// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Renderer abstraction for producing a [`Snapshot`] from the live page.
//!
//! Defines the `PageRenderer` trait that abstracts over the browser engine
//! (currently Chromium via chromiumoxide) so the scheduler can be driven by
//! any source of snapshots.

pub mod chromium;
pub mod network;

use crate::config::RenderOptions;
use crate::snapshot::Snapshot;
use async_trait::async_trait;

/// Failure of one render session. The message is what API clients see.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Chromium not found. Set BULLION_CHROMIUM_PATH or install chromium.")]
    BrowserNotFound,

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("navigation timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

impl RenderError {
    /// True for the navigation budget running out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::Timeout { .. })
    }
}

/// Something that can render the target page and extract a snapshot.
///
/// Each call owns its engine instance for the duration of the call and
/// releases it before returning, on success and on failure.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render `options.url` and run the extractor over the settled DOM.
    async fn render_and_extract(&self, options: &RenderOptions) -> Result<Snapshot, RenderError>;
}

/// A renderer that always fails, used when Chromium is unavailable.
///
/// Lets the API come up and report the problem through `/data` instead of
/// refusing to start.
pub struct NoopRenderer;

#[async_trait]
impl PageRenderer for NoopRenderer {
    async fn render_and_extract(&self, _options: &RenderOptions) -> Result<Snapshot, RenderError> {
        Err(RenderError::BrowserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let e = RenderError::Timeout { ms: 60_000 };
        assert_eq!(e.to_string(), "navigation timed out after 60000ms");
        assert!(e.is_timeout());
        assert!(!RenderError::Launch("boom".into()).is_timeout());
    }

    #[tokio::test]
    async fn test_noop_renderer_fails() {
        let err = NoopRenderer
            .render_and_extract(&RenderOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, RenderError::BrowserNotFound);
    }
}
