// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based render session using chromiumoxide.
//!
//! Every call to [`ChromiumRenderer::render_and_extract`] launches its own
//! browser, drives one page through navigation, network idle and the settle
//! delay, snapshots the DOM and shuts the browser down again.

use super::network::NetworkIdle;
use super::{PageRenderer, RenderError};
use crate::config::{RenderOptions, ViewportSpec, CHROMIUM_PATH_ENV};
use crate::extract;
use crate::snapshot::Snapshot;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{EventLoadEventFired, NavigateParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Serialized DOM of the rendered page, with the doctype name kept apart
/// since `outerHTML` drops it.
const DOM_SNAPSHOT_JS: &str = r#"({
    doctype: document.doctype ? document.doctype.name : null,
    html: document.documentElement.outerHTML
})"#;

/// Upper bound on browser shutdown before the process is killed.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Headroom of the per-command CDP timeout over the navigation budget, so
/// the navigation timeout is always the one that fires.
const CDP_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. BULLION_CHROMIUM_PATH env
    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.bullion-live/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".bullion-live/chromium/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".bullion-live/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".bullion-live/chromium/chrome-linux64/chrome"),
                home.join(".bullion-live/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser", "headless_shell"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Renderer that launches a fresh headless Chromium per session.
pub struct ChromiumRenderer {
    executable: PathBuf,
}

impl ChromiumRenderer {
    /// Locate Chromium on this machine.
    pub fn new() -> Result<Self, RenderError> {
        let executable = find_chromium().ok_or(RenderError::BrowserNotFound)?;
        Ok(Self::with_executable(executable))
    }

    /// Use an explicit Chromium binary.
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render_and_extract(&self, options: &RenderOptions) -> Result<Snapshot, RenderError> {
        let start = Instant::now();
        let engine = Engine::launch(&self.executable, options).await?;

        let result = drive_page(&engine.browser, options).await;
        engine.release().await;

        if let Ok(snapshot) = &result {
            info!(
                panels = snapshot.panels_found(),
                empty_panels = snapshot.empty_panels(),
                tables = snapshot.tables.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "render session complete"
            );
        }
        result
    }
}

/// CDP command timeout used for the browser. Larger than the navigation
/// budget.
pub fn cdp_request_timeout(options: &RenderOptions) -> Duration {
    options.nav_timeout + CDP_TIMEOUT_MARGIN
}

/// A launched browser plus its CDP event-loop task.
struct Engine {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Engine {
    async fn launch(executable: &Path, options: &RenderOptions) -> Result<Self, RenderError> {
        let viewport: &ViewportSpec = &options.viewport;
        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .viewport(Viewport {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: Some(viewport.device_scale_factor),
                emulating_mobile: viewport.mobile,
                is_landscape: false,
                has_touch: viewport.mobile,
            })
            .window_size(viewport.width, viewport.height)
            .request_timeout(cdp_request_timeout(options))
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| RenderError::Launch(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // Spawn the handler task
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("cdp handler: {e}");
                }
            }
        });

        debug!(executable = %executable.display(), "browser launched");
        Ok(Self { browser, handler })
    }

    /// Shut the browser down. Failures are logged, never returned.
    ///
    /// A browser that does not exit in time is killed when `Browser` drops.
    async fn release(mut self) {
        let shutdown = async {
            if let Err(e) = self.browser.close().await {
                warn!("browser close failed: {e}");
            }
            if let Err(e) = self.browser.wait().await {
                warn!("browser wait failed: {e}");
            }
        };

        if tokio::time::timeout(TEARDOWN_TIMEOUT, shutdown).await.is_err() {
            warn!(
                "browser did not exit within {}s, killing",
                TEARDOWN_TIMEOUT.as_secs()
            );
        }

        self.handler.abort();
        debug!("browser released");
    }
}

/// Serialized DOM as returned by [`DOM_SNAPSHOT_JS`].
#[derive(Debug, Clone, Deserialize)]
pub struct DomSnapshot {
    pub doctype: Option<String>,
    pub html: String,
}

impl DomSnapshot {
    /// Markup to re-parse. The doctype is restored so the parser picks the
    /// same (no-)quirks mode as the live page.
    pub fn into_source(self) -> String {
        match self.doctype {
            Some(name) => format!("<!DOCTYPE {name}>{}", self.html),
            None => self.html,
        }
    }
}

/// Navigate, wait for the page to settle and extract.
async fn drive_page(browser: &Browser, options: &RenderOptions) -> Result<Snapshot, RenderError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| RenderError::Launch(format!("failed to create new page: {e}")))?;

    navigate(&page, options).await?;

    debug!(
        settle_ms = options.settle_delay.as_millis() as u64,
        "waiting for client-side rendering"
    );
    tokio::time::sleep(options.settle_delay).await;

    let dom: DomSnapshot = page
        .evaluate(DOM_SNAPSHOT_JS)
        .await
        .map_err(|e| RenderError::Evaluation(e.to_string()))?
        .into_value()
        .map_err(|e| RenderError::Evaluation(format!("failed to convert JS result: {e:?}")))?;

    Ok(extract::extract(&dom.into_source()))
}

/// Map a CDP failure during navigation. A CDP-level timeout counts as the
/// navigation budget running out.
fn navigation_error(e: CdpError, timeout_ms: u64) -> RenderError {
    match e {
        CdpError::Timeout => RenderError::Timeout { ms: timeout_ms },
        other => RenderError::Navigation(other.to_string()),
    }
}

/// Load `options.url`, wait for the load event and network idle, all within
/// the navigation timeout. Running out of time is a failure.
async fn navigate(page: &Page, options: &RenderOptions) -> Result<(), RenderError> {
    let timeout_ms = options.nav_timeout.as_millis() as u64;
    let to_error = move |e: CdpError| navigation_error(e, timeout_ms);

    let idle = NetworkIdle::subscribe(page).await.map_err(to_error)?;
    let mut loaded = page
        .event_listener::<EventLoadEventFired>()
        .await
        .map_err(to_error)?;

    let load = async move {
        let nav = page
            .execute(NavigateParams::new(options.url.as_str()))
            .await
            .map_err(to_error)?;
        if let Some(text) = nav.result.error_text.as_deref().filter(|t| !t.is_empty()) {
            return Err(RenderError::Navigation(text.to_string()));
        }
        loaded.next().await;
        debug!("load event fired");
        idle.wait(options.idle_max_inflight, options.idle_quiet).await;
        Ok::<_, RenderError>(())
    };

    match tokio::time::timeout(options.nav_timeout, load).await {
        Ok(result) => result,
        Err(_) => Err(RenderError::Timeout { ms: timeout_ms }),
    }
}
