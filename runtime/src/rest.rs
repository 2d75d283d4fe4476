// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP API over the serving state.
//!
//! Every handler reads one published [`ServingState`] record and renders
//! it; nothing here mutates state or waits on the scheduler.

use crate::snapshot::Snapshot;
use crate::state::{ServingState, StateReader};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Body of `GET /`.
pub const LIVENESS_BODY: &str = "Ambica Live Server OK";

/// Body of `GET /data`, tagged by `status`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DataResponse {
    Loading,
    Error { error: String },
    Ok { data: Arc<Snapshot> },
}

impl DataResponse {
    /// Map a state record to the client-facing shape.
    ///
    /// A cached snapshot wins over a newer error; an error is only shown
    /// while nothing has ever been cached.
    pub fn from_state(state: &ServingState) -> Self {
        if state.is_loading() {
            return DataResponse::Loading;
        }
        match (state.cache(), state.last_error()) {
            (Some(snapshot), _) => DataResponse::Ok {
                data: Arc::clone(snapshot),
            },
            (None, Some(error)) => DataResponse::Error {
                error: error.to_string(),
            },
            (None, None) => DataResponse::Loading,
        }
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub cycle: u64,
    pub loading: bool,
    pub has_data: bool,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl From<&ServingState> for StatusResponse {
    fn from(state: &ServingState) -> Self {
        Self {
            cycle: state.cycle(),
            loading: state.is_loading(),
            has_data: state.cache().is_some(),
            last_error: state.last_error().map(str::to_string),
            last_success_at: state.last_success_at(),
            last_failure_at: state.last_failure_at(),
        }
    }
}

/// Build the axum Router with all endpoints.
pub fn router(reader: StateReader) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(liveness))
        .route("/data", get(handle_data))
        .route("/status", get(handle_status))
        .layer(cors)
        .with_state(reader)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn start(
    addr: SocketAddr,
    reader: StateReader,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, reader, shutdown).await
}

/// Serve the API on an already bound listener.
pub async fn serve(
    listener: tokio::net::TcpListener,
    reader: StateReader,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    tracing::info!("Server running on {}", listener.local_addr()?);
    axum::serve(listener, router(reader))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────

async fn liveness() -> &'static str {
    LIVENESS_BODY
}

async fn handle_data(State(reader): State<StateReader>) -> Json<DataResponse> {
    Json(DataResponse::from_state(&reader.current()))
}

async fn handle_status(State(reader): State<StateReader>) -> Json<StatusResponse> {
    Json(StatusResponse::from(&reader.current()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::QuoteBox;
    use serde_json::json;

    fn to_json(state: &ServingState) -> serde_json::Value {
        serde_json::to_value(DataResponse::from_state(state)).unwrap()
    }

    #[test]
    fn test_startup_is_loading() {
        assert_eq!(to_json(&ServingState::default()), json!({"status": "loading"}));
    }

    #[test]
    fn test_in_flight_is_loading_even_with_cache() {
        let state = ServingState::default()
            .begin_cycle()
            .succeeded(Snapshot::default())
            .begin_cycle();
        assert_eq!(to_json(&state), json!({"status": "loading"}));
    }

    #[test]
    fn test_error_without_cache() {
        let state = ServingState::default()
            .begin_cycle()
            .failed("navigation timed out after 60000ms");
        assert_eq!(
            to_json(&state),
            json!({"status": "error", "error": "navigation timed out after 60000ms"})
        );
    }

    #[test]
    fn test_stale_cache_served_over_error() {
        let mut snap = Snapshot::default();
        snap.spots.gold = Some(QuoteBox::from_fields(["1234.50"]));
        let state = ServingState::default()
            .begin_cycle()
            .succeeded(snap)
            .begin_cycle()
            .failed("boom");
        let body = to_json(&state);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["data"]["spots"]["gold"]["bid"], "1234.50");
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_status_response() {
        let state = ServingState::default().begin_cycle().failed("x");
        let status = StatusResponse::from(&state);
        assert_eq!(status.cycle, 1);
        assert!(!status.loading);
        assert!(!status.has_data);
        assert_eq!(status.last_error.as_deref(), Some("x"));
        assert!(status.last_failure_at.is_some());
        assert!(status.last_success_at.is_none());
    }
}
