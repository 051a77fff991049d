// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! HTTP facade: the three endpoints shelf labels and operators actually call.
//!
//! Thin handlers over the cache manager. Every response is JSON and carries a
//! permissive CORS header, since the labels' companion web tools are served
//! from arbitrary origins on the lab network.

use crate::cache::CacheManager;
use crate::nemo::RecordSource;
use crate::resolver;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub struct AppState<S> {
    cache: Arc<CacheManager<S>>,
}

// hand-rolled because #[derive(Clone)] would demand S: Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct RefreshBody {
    status: &'static str,
    users: usize,
    bins: usize,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    users: usize,
    bins: usize,
    /// Epoch seconds of the last successful refresh
    last_refresh: u64,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: error.into() })).into_response()
}

/// Build the full router. Generic over the record source so tests can drive the
/// whole HTTP surface against a fixture upstream.
pub fn router<S>(cache: Arc<CacheManager<S>>) -> Router
where
    S: RecordSource + Send + Sync + 'static,
{
    Router::new()
        .route("/bin", get(bin_usage))
        .route("/bin/", get(bin_usage))
        .route("/bin/:key", get(lookup_bin))
        .route("/refresh", get(refresh_cache))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { cache })
}

/// Deliberately a 200: the firmware treats this as a usage hint, not a failure.
#[allow(clippy::unused_async)] // axum handlers must be async
async fn bin_usage() -> Response {
    (
        StatusCode::OK,
        Json(ErrorBody {
            error: "Please specify a bin ID: /bin/<bin_id>".to_string(),
        }),
    )
        .into_response()
}

async fn lookup_bin<S>(State(state): State<AppState<S>>, Path(key): Path<String>) -> Response
where
    S: RecordSource + Send + Sync + 'static,
{
    if key.is_empty() {
        // a blank key is a caller bug, distinct from a valid-but-unknown key
        return error_response(StatusCode::BAD_REQUEST, "Bin ID required");
    }
    let cache = state.cache.ensure_fresh().await;
    match resolver::resolve(&key, &cache.users, &cache.bins) {
        Some(result) => (StatusCode::OK, Json(result)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("Bin not found: {key}")),
    }
}

async fn refresh_cache<S>(State(state): State<AppState<S>>) -> Response
where
    S: RecordSource + Send + Sync + 'static,
{
    match state.cache.refresh().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(RefreshBody {
                status: "Cache refreshed",
                users: summary.users,
                bins: summary.bins,
            }),
        )
            .into_response(),
        Err(error) => {
            // the previous cache keeps serving; only the rebuild failed
            warn!("manual refresh failed: {error}");
            error_response(StatusCode::BAD_GATEWAY, format!("Cache refresh failed: {error}"))
        }
    }
}

async fn health<S>(State(state): State<AppState<S>>) -> Response
where
    S: RecordSource + Send + Sync + 'static,
{
    let state = state.cache.snapshot().await;
    (
        StatusCode::OK,
        Json(HealthBody {
            status: "ok",
            users: state.users.len(),
            bins: state.bins.len(),
            last_refresh: state.last_refresh.as_epoch_seconds(),
        }),
    )
        .into_response()
}

#[allow(clippy::unused_async)] // axum handlers must be async
async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
