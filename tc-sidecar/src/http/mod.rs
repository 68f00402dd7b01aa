//! HTTP endpoints for tc-sidecar.
//!
//! - `POST /tc/apply` applies one impairment
//! - `GET /tc/stats/:node` returns raw `tc -s qdisc show` output
//! - `GET /health` reports liveness

pub mod health;

use crate::error::SidecarError;
use crate::server::TcSidecar;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tc_types::{ApplyRequest, ApplyResponse, StatsResponse};

pub use health::health_handler;

/// Build the HTTP router with all endpoints.
pub fn build_router(sidecar: Arc<TcSidecar>) -> Router {
    Router::new()
        .route("/tc/apply", post(apply_handler))
        .route("/tc/stats/:node", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(Extension(sidecar))
}

async fn apply_handler(
    Extension(sidecar): Extension<Arc<TcSidecar>>,
    payload: Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<Json<ApplyResponse>, SidecarError> {
    let Json(request) = payload.map_err(|e| SidecarError::InvalidRequest(e.body_text()))?;
    tracing::info!(node = %request.node, command = %request.command, value = %request.value, "apply");

    let response = sidecar.apply(&request).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    interface: Option<String>,
}

async fn stats_handler(
    Extension(sidecar): Extension<Arc<TcSidecar>>,
    Path(node): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, SidecarError> {
    let response = sidecar.stats(&node, query.interface.as_deref()).await?;
    Ok(Json(response))
}
