//! Concurrent readers never observe a record mixing two cycles.

use async_trait::async_trait;
use bullion_live::config::{RenderOptions, ScheduleOptions};
use bullion_live::renderer::{PageRenderer, RenderError};
use bullion_live::scheduler::Scheduler;
use bullion_live::snapshot::{QuoteBox, Snapshot};
use bullion_live::state::{ServingState, StateStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Odd calls succeed with the call number as gold bid, even calls fail.
#[derive(Default)]
struct Alternating {
    calls: AtomicU64,
}

#[async_trait]
impl PageRenderer for Alternating {
    async fn render_and_extract(&self, _: &RenderOptions) -> Result<Snapshot, RenderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::task::yield_now().await;
        if n % 2 == 1 {
            let mut snap = Snapshot::default();
            snap.spots.gold = Some(QuoteBox::from_fields([n.to_string()]));
            Ok(snap)
        } else {
            Err(RenderError::Evaluation(format!("fail {n}")))
        }
    }
}

fn cached_bid(state: &ServingState) -> Option<u64> {
    state
        .cache()
        .and_then(|s| s.spots.gold.as_ref())
        .and_then(|q| q.bid.as_deref())
        .and_then(|b| b.parse().ok())
}

fn check(state: &ServingState) {
    let c = state.cycle();
    if state.is_loading() {
        assert!(state.last_error().is_none(), "loading with error: {state:?}");
        return;
    }
    if c == 0 {
        assert!(state.cache().is_none());
        return;
    }
    if c % 2 == 1 {
        assert!(state.last_error().is_none(), "cycle {c}: {state:?}");
        assert_eq!(cached_bid(state), Some(c));
    } else {
        assert_eq!(state.last_error(), Some(format!("evaluation failed: fail {c}").as_str()));
        assert_eq!(cached_bid(state), Some(c - 1));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_whole_cycles() {
    let store = StateStore::new();
    let reader = store.reader();
    let scheduler = Scheduler::new(Arc::new(Alternating::default()), store)
        .with_schedule(ScheduleOptions {
            interval: Duration::ZERO,
        })
        .spawn();

    let mut readers = Vec::new();
    for _ in 0..4 {
        let reader = reader.clone();
        readers.push(tokio::spawn(async move {
            let mut seen = 0;
            for _ in 0..2_000 {
                let state = reader.current();
                check(&state);
                seen = seen.max(state.cycle());
                tokio::task::yield_now().await;
            }
            seen
        }));
    }

    for r in readers {
        r.await.unwrap();
    }

    let mut reader = reader;
    let state = reader.wait_for(|s| s.cycle() >= 10 && !s.is_loading()).await.unwrap();
    check(&state);
    scheduler.abort();
}
