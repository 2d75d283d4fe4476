// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Network-idle detection from CDP network events.
//!
//! The page counts as settled once at most `max_inflight` requests have been
//! outstanding for `quiet` without interruption.

use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Bookkeeping of in-flight request ids.
#[derive(Debug)]
pub struct InflightTracker {
    inflight: HashSet<String>,
    max_inflight: usize,
    idle_since: Option<Instant>,
}

impl InflightTracker {
    pub fn new(max_inflight: usize, now: Instant) -> Self {
        Self {
            inflight: HashSet::new(),
            max_inflight,
            idle_since: Some(now),
        }
    }

    pub fn request_started(&mut self, id: &str, now: Instant) {
        self.inflight.insert(id.to_string());
        self.refresh(now);
    }

    pub fn request_done(&mut self, id: &str, now: Instant) {
        self.inflight.remove(id);
        self.refresh(now);
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// Instant at which the network will count as idle, if it currently
    /// stays under the threshold.
    pub fn idle_deadline(&self, quiet: Duration) -> Option<Instant> {
        self.idle_since.map(|since| since + quiet)
    }

    fn refresh(&mut self, now: Instant) {
        if self.inflight.len() > self.max_inflight {
            self.idle_since = None;
        } else if self.idle_since.is_none() {
            self.idle_since = Some(now);
        }
    }
}

/// Subscription to a page's network events.
///
/// Created before navigation starts so requests issued during the initial
/// load are counted.
pub struct NetworkIdle {
    started: EventStream<EventRequestWillBeSent>,
    finished: EventStream<EventLoadingFinished>,
    failed: EventStream<EventLoadingFailed>,
}

impl NetworkIdle {
    pub async fn subscribe(page: &Page) -> chromiumoxide::error::Result<Self> {
        Ok(Self {
            started: page.event_listener::<EventRequestWillBeSent>().await?,
            finished: page.event_listener::<EventLoadingFinished>().await?,
            failed: page.event_listener::<EventLoadingFailed>().await?,
        })
    }

    /// Wait until the network has been quiet long enough.
    ///
    /// Unbounded on its own; callers apply the navigation timeout.
    pub async fn wait(mut self, max_inflight: usize, quiet: Duration) {
        let mut tracker = InflightTracker::new(max_inflight, Instant::now());

        loop {
            let deadline = tracker.idle_deadline(quiet);
            tokio::select! {
                Some(ev) = self.started.next() => {
                    let id: &str = ev.request_id.as_ref();
                    tracker.request_started(id, Instant::now());
                }
                Some(ev) = self.finished.next() => {
                    let id: &str = ev.request_id.as_ref();
                    tracker.request_done(id, Instant::now());
                }
                Some(ev) = self.failed.next() => {
                    let id: &str = ev.request_id.as_ref();
                    tracker.request_done(id, Instant::now());
                }
                _ = sleep_until(deadline) => {
                    trace!(inflight = tracker.inflight(), "network idle");
                    return;
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_idle_from_start() {
        let t0 = Instant::now();
        let tracker = InflightTracker::new(2, t0);
        assert_eq!(tracker.idle_deadline(QUIET), Some(t0 + QUIET));
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_above_threshold() {
        let t0 = Instant::now();
        let mut tracker = InflightTracker::new(2, t0);
        tracker.request_started("1", t0);
        tracker.request_started("2", t0);
        assert!(tracker.idle_deadline(QUIET).is_some());
        tracker.request_started("3", t0);
        assert_eq!(tracker.inflight(), 3);
        assert!(tracker.idle_deadline(QUIET).is_none());

        let t1 = t0 + Duration::from_millis(800);
        tracker.request_done("2", t1);
        assert_eq!(tracker.idle_deadline(QUIET), Some(t1 + QUIET));
    }

    #[tokio::test(start_paused = true)]
    async fn test_under_threshold_does_not_reset_window() {
        let t0 = Instant::now();
        let mut tracker = InflightTracker::new(2, t0);
        tracker.request_started("a", t0 + Duration::from_millis(100));
        tracker.request_done("a", t0 + Duration::from_millis(200));
        assert_eq!(tracker.idle_deadline(QUIET), Some(t0 + QUIET));
    }

    #[tokio::test(start_paused = true)]
    async fn test_redirect_reuses_id() {
        let t0 = Instant::now();
        let mut tracker = InflightTracker::new(0, t0);
        tracker.request_started("r", t0);
        tracker.request_started("r", t0);
        assert_eq!(tracker.inflight(), 1);
        tracker.request_done("r", t0);
        assert_eq!(tracker.inflight(), 0);
        tracker.request_done("unknown", t0);
        assert_eq!(tracker.inflight(), 0);
    }
}
