//! HTTP snapshot API.
//!
//! Thin axum layer over [`SnapshotApi`]. Handlers never block on a
//! session; every response is built from point-in-time store snapshots.

use std::future::Future;

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use gridtel_core::{
    AggregateStats, BgpSummary, CoreError, DeviceSummary, HealthReport, InterfaceListing,
    LinkStatus, RouteListing, SnapshotApi, SystemMetrics,
};

// ── Router ───────────────────────────────────────────────────────────

pub fn router(api: SnapshotApi) -> Router {
    Router::new()
        .route("/api/devices", get(list_devices))
        .route("/api/devices/{id}/interfaces", get(interfaces))
        .route("/api/devices/{id}/system", get(system))
        .route("/api/devices/{id}/bgp", get(bgp))
        .route("/api/devices/{id}/routes", get(routes))
        .route("/api/links", get(list_links))
        .route("/api/links/{id}", get(link_status))
        .route("/api/stats", get(stats))
        .route("/health", get(health))
        .with_state(api)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

/// Read-only API open to browser dashboards on any origin.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    api: SnapshotApi,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP API listening");
    axum::serve(listener, router(api))
        .with_graceful_shutdown(shutdown)
        .await
}

// ── Errors ───────────────────────────────────────────────────────────

/// A `CoreError` rendered as `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self.0 {
            CoreError::UnknownDevice { .. } => (StatusCode::NOT_FOUND, "unknown_device"),
            CoreError::UnknownLink { .. } => (StatusCode::NOT_FOUND, "unknown_link"),
            CoreError::DataUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "data_unavailable")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self.0, "request failed");
        } else {
            debug!(code, error = %self.0, "request rejected");
        }
        let body = json!({
            "error": {
                "code": code,
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── Handlers ─────────────────────────────────────────────────────────

async fn list_devices(State(api): State<SnapshotApi>) -> Json<Vec<DeviceSummary>> {
    Json(api.list_devices())
}

async fn interfaces(
    State(api): State<SnapshotApi>,
    Path(id): Path<String>,
) -> ApiResult<InterfaceListing> {
    Ok(Json(api.get_interfaces(&id)?))
}

async fn system(State(api): State<SnapshotApi>, Path(id): Path<String>) -> ApiResult<SystemMetrics> {
    Ok(Json(api.get_system(&id)?))
}

async fn bgp(State(api): State<SnapshotApi>, Path(id): Path<String>) -> ApiResult<BgpSummary> {
    Ok(Json(api.get_bgp(&id)?))
}

async fn routes(State(api): State<SnapshotApi>, Path(id): Path<String>) -> ApiResult<RouteListing> {
    Ok(Json(api.get_routes(&id)?))
}

async fn list_links(State(api): State<SnapshotApi>) -> Json<Vec<LinkStatus>> {
    Json(api.list_links())
}

async fn link_status(
    State(api): State<SnapshotApi>,
    Path(id): Path<String>,
) -> ApiResult<LinkStatus> {
    Ok(Json(api.get_link_status(&id)?))
}

async fn stats(State(api): State<SnapshotApi>) -> Json<AggregateStats> {
    Json(api.get_aggregate_stats())
}

async fn health(State(api): State<SnapshotApi>) -> Json<HealthReport> {
    Json(api.health())
}
