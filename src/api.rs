//! HTTP surface: the dashboard endpoint and health check.

use std::sync::Arc;

use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregate::aggregate;
use crate::config::AppConfig;
use crate::fetch::HttpFetcher;

/// Header the original dashboard client keys on; kept verbatim.
pub const SERVER_HEADER_NAME: &str = "x-custom-server-header";
pub const SERVER_HEADER_VALUE: &str = "Custom data";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(|| async { "OK" }))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// One aggregate call per request. The fetcher (and its connection pool)
/// lives exactly as long as this handler invocation, so cancellation or an
/// early return releases all upstream connections.
async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let fetcher = HttpFetcher::new(state.config.fetch_timeout())?;
    let groups = aggregate(&fetcher, &state.config.sources).await;

    Ok(([(SERVER_HEADER_NAME, SERVER_HEADER_VALUE)], Json(groups)))
}

/// Upstream failures are degraded groups inside a 200; only a failure to
/// build the response itself surfaces as a 5xx.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}
