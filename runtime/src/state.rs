// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Serving state shared between the scheduler and API handlers.
//!
//! The state is an immutable record. The scheduler builds the next record
//! from the current one and publishes it whole through a `watch` channel,
//! so readers always see `loading`, the cached snapshot and the last error
//! from the same cycle boundary.

use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

/// Latest view of the fetch lifecycle.
#[derive(Debug, Clone, Default)]
pub struct ServingState {
    cache: Option<Arc<Snapshot>>,
    loading: bool,
    last_error: Option<String>,
    cycle: u64,
    last_success_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
}

impl ServingState {
    /// State at the start of a cycle: loading, error cleared, cache kept.
    pub fn begin_cycle(&self) -> Self {
        Self {
            loading: true,
            last_error: None,
            cycle: self.cycle + 1,
            ..self.clone()
        }
    }

    /// State after a successful cycle: the new snapshot replaces the cache.
    pub fn succeeded(&self, snapshot: Snapshot) -> Self {
        Self {
            cache: Some(Arc::new(snapshot)),
            loading: false,
            last_error: None,
            last_success_at: Some(Utc::now()),
            ..self.clone()
        }
    }

    /// State after a failed cycle: the error is recorded, the cache is left
    /// as it was.
    pub fn failed(&self, message: impl Into<String>) -> Self {
        Self {
            loading: false,
            last_error: Some(message.into()),
            last_failure_at: Some(Utc::now()),
            ..self.clone()
        }
    }

    pub fn cache(&self) -> Option<&Arc<Snapshot>> {
        self.cache.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of cycles started since process start.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }

    pub fn last_failure_at(&self) -> Option<DateTime<Utc>> {
        self.last_failure_at
    }
}

/// Write side of the serving state. Owned by the scheduler.
#[derive(Debug)]
pub struct StateStore {
    tx: watch::Sender<ServingState>,
}

impl StateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ServingState::default());
        Self { tx }
    }

    /// Clone of the current record.
    pub fn current(&self) -> ServingState {
        self.tx.borrow().clone()
    }

    /// Derive the next record from the current one and publish it whole.
    /// Succeeds with or without readers.
    pub fn update(&self, f: impl FnOnce(&ServingState) -> ServingState) {
        self.tx.send_modify(|state| {
            let next = f(state);
            *state = next;
        });
    }

    pub fn reader(&self) -> StateReader {
        StateReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of the serving state. Cheap to clone, one per handler.
#[derive(Debug, Clone)]
pub struct StateReader {
    rx: watch::Receiver<ServingState>,
}

impl StateReader {
    /// Clone of the latest published record.
    pub fn current(&self) -> ServingState {
        self.rx.borrow().clone()
    }

    /// Wait until a published record satisfies `f`, then return it.
    ///
    /// Returns `None` if the store has been dropped.
    pub async fn wait_for(&mut self, f: impl FnMut(&ServingState) -> bool) -> Option<ServingState> {
        self.rx
            .wait_for(f)
            .await
            .ok()
            .map(|state| ServingState::clone(&state))
    }
}
