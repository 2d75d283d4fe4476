// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Background fetch loop.
//!
//! One cycle at a time: mark the state loading, run a render session,
//! publish the snapshot or the error, sleep the poll interval, repeat.
//! Nothing escapes the loop; a failed cycle only changes `last_error`.

use crate::config::{RenderOptions, ScheduleOptions};
use crate::renderer::{PageRenderer, RenderError};
use crate::state::{ServingState, StateStore};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Result of one fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Published { panels: usize, tables: usize },
    Failed(RenderError),
}

/// Drives the renderer on a fixed interval and owns the state store.
pub struct Scheduler {
    renderer: Arc<dyn PageRenderer>,
    store: StateStore,
    render: RenderOptions,
    schedule: ScheduleOptions,
}

impl Scheduler {
    pub fn new(renderer: Arc<dyn PageRenderer>, store: StateStore) -> Self {
        Self {
            renderer,
            store,
            render: RenderOptions::default(),
            schedule: ScheduleOptions::default(),
        }
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn with_schedule(mut self, schedule: ScheduleOptions) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run one fetch cycle and publish its outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.store.update(ServingState::begin_cycle);
        let cycle = self.store.current().cycle();
        info!(cycle, url = %self.render.url, "fetching live data");

        let start = Instant::now();
        match self.renderer.render_and_extract(&self.render).await {
            Ok(snapshot) => {
                let outcome = CycleOutcome::Published {
                    panels: snapshot.panels_found(),
                    tables: snapshot.tables.len(),
                };
                let snapshot_empty = snapshot.empty_panels();
                self.store.update(|s| s.succeeded(snapshot));
                info!(
                    cycle,
                    empty_panels = snapshot_empty,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "data updated"
                );
                outcome
            }
            Err(e) => {
                self.store.update(|s| s.failed(e.to_string()));
                error!(cycle, error = %e, "fetch cycle failed");
                CycleOutcome::Failed(e)
            }
        }
    }

    /// Loop forever.
    pub async fn run(self) {
        info!(
            interval_ms = self.schedule.interval.as_millis() as u64,
            "scheduler started"
        );
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.schedule.interval).await;
        }
    }

    /// Run the loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{QuoteBox, Snapshot};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns scripted results in order, then keeps failing.
    struct Scripted(Mutex<Vec<Result<Snapshot, RenderError>>>);

    impl Scripted {
        fn new(mut results: Vec<Result<Snapshot, RenderError>>) -> Arc<Self> {
            results.reverse();
            Arc::new(Self(Mutex::new(results)))
        }
    }

    #[async_trait]
    impl PageRenderer for Scripted {
        async fn render_and_extract(&self, _: &RenderOptions) -> Result<Snapshot, RenderError> {
            self.0
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(RenderError::Evaluation("script exhausted".into())))
        }
    }

    fn gold(bid: &str) -> Snapshot {
        let mut snap = Snapshot::default();
        snap.spots.gold = Some(QuoteBox::from_fields([bid]));
        snap
    }

    #[tokio::test]
    async fn test_cycle_success_publishes() {
        let scheduler = Scheduler::new(Scripted::new(vec![Ok(gold("1"))]), StateStore::new());
        let outcome = scheduler.run_cycle().await;
        assert_eq!(outcome, CycleOutcome::Published { panels: 1, tables: 0 });

        let state = scheduler.store().current();
        assert!(!state.is_loading());
        assert!(state.last_error().is_none());
        assert_eq!(**state.cache().unwrap(), gold("1"));
    }

    #[tokio::test]
    async fn test_failure_does_not_touch_cache() {
        let scheduler = Scheduler::new(
            Scripted::new(vec![Ok(gold("1")), Err(RenderError::Timeout { ms: 60_000 })]),
            StateStore::new(),
        );
        scheduler.run_cycle().await;
        let outcome = scheduler.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::Failed(ref e) if e.is_timeout()));

        let state = scheduler.store().current();
        assert!(!state.is_loading());
        assert_eq!(state.cycle(), 2);
        assert_eq!(
            state.last_error(),
            Some("navigation timed out after 60000ms")
        );
        assert_eq!(**state.cache().unwrap(), gold("1"));
    }

    #[tokio::test]
    async fn test_first_cycle_failure_leaves_cache_empty() {
        let scheduler = Scheduler::new(
            Scripted::new(vec![Err(RenderError::Launch("no display".into()))]),
            StateStore::new(),
        );
        scheduler.run_cycle().await;
        let state = scheduler.store().current();
        assert!(state.cache().is_none());
        assert_eq!(state.last_error(), Some("failed to launch browser: no display"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_keeps_running_after_failures() {
        let store = StateStore::new();
        let mut reader = store.reader();
        let handle = Scheduler::new(
            Scripted::new(vec![
                Err(RenderError::Navigation("net::ERR_NAME_NOT_RESOLVED".into())),
                Err(RenderError::Timeout { ms: 60_000 }),
                Ok(gold("3")),
            ]),
            store,
        )
        .spawn();

        let state = reader
            .wait_for(|s| s.cache().is_some() && !s.is_loading())
            .await
            .unwrap();
        assert_eq!(state.cycle(), 3);
        assert!(state.last_error().is_none());
        assert!(!handle.is_finished());
        handle.abort();
    }
}
