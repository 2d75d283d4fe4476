// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed fetch parameters and the option structs built from them.
//!
//! The target page, viewport and timings are tuned to one site's rendering
//! latency and are not exposed as runtime flags. Only the listening port,
//! the Chromium binary location and logging are configured at runtime.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Page the rates are scraped from.
pub const TARGET_URL: &str = "http://anjujewellery.in/";

/// Mobile viewport width in CSS pixels. The target serves a different
/// layout on desktop widths.
pub const VIEWPORT_WIDTH: u32 = 390;
/// Mobile viewport height in CSS pixels.
pub const VIEWPORT_HEIGHT: u32 = 844;
/// Device pixel ratio.
pub const VIEWPORT_SCALE: f64 = 2.0;

/// Hard budget for navigation plus network idle.
pub const NAV_TIMEOUT_MS: u64 = 60_000;
/// Unconditional wait after navigation for client-side rendering.
pub const SETTLE_DELAY_MS: u64 = 6_000;
/// Sleep between the end of one cycle and the start of the next.
pub const POLL_INTERVAL_MS: u64 = 10_000;

/// Network counts as idle with at most this many requests in flight...
pub const IDLE_MAX_INFLIGHT: usize = 2;
/// ...sustained for this long.
pub const IDLE_QUIET_MS: u64 = 500;

/// Port used when neither `PORT` nor `--port` is given.
pub const DEFAULT_PORT: u16 = 5000;

/// Environment variable overriding the Chromium executable.
pub const CHROMIUM_PATH_ENV: &str = "BULLION_CHROMIUM_PATH";

/// Browser viewport emulated for every render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSpec {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    /// Mobile and touch emulation. Off: only the window size and scale are
    /// set, the page sees a desktop user agent.
    pub mobile: bool,
}

impl Default for ViewportSpec {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
            device_scale_factor: VIEWPORT_SCALE,
            mobile: false,
        }
    }
}

/// Parameters of a single render session.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub url: String,
    pub viewport: ViewportSpec,
    pub nav_timeout: Duration,
    pub settle_delay: Duration,
    pub idle_max_inflight: usize,
    pub idle_quiet: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            url: TARGET_URL.to_string(),
            viewport: ViewportSpec::default(),
            nav_timeout: Duration::from_millis(NAV_TIMEOUT_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
            idle_max_inflight: IDLE_MAX_INFLIGHT,
            idle_quiet: Duration::from_millis(IDLE_QUIET_MS),
        }
    }
}

/// Scheduler timing.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptions {
    pub interval: Duration,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }
}

/// Address the HTTP API binds to: all interfaces on `port`.
pub fn bind_addr(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_defaults() {
        let opts = RenderOptions::default();
        assert_eq!(opts.url, TARGET_URL);
        assert_eq!(opts.viewport.width, 390);
        assert_eq!(opts.viewport.height, 844);
        assert_eq!(opts.viewport.device_scale_factor, 2.0);
        assert!(!opts.viewport.mobile);
        assert_eq!(opts.nav_timeout, Duration::from_secs(60));
        assert_eq!(opts.settle_delay, Duration::from_secs(6));
        assert_eq!(ScheduleOptions::default().interval, Duration::from_secs(10));
    }

    #[test]
    fn test_bind_addr_all_interfaces() {
        let addr = bind_addr(DEFAULT_PORT);
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), 5000);
    }
}
