//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::{self, CreateJobQuery, ImageQuery};
use crate::error::ApiError;
use crate::models::{AppConfig, FilterConfig, JobCreated, JobInfo};
use crate::services::InMemoryJobStore;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemoryJobStore>,
    pub defaults: Arc<FilterConfig>,
}

/// Create application state from the loaded configuration.
pub fn create_app_state(config: &AppConfig) -> AppState {
    AppState {
        jobs: Arc::new(InMemoryJobStore::with_limits(
            config.server.max_jobs,
            config.server.job_ttl(),
        )),
        defaults: Arc::new(config.filter.clone()),
    }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", post(handle_create))
        .route("/api/jobs/:id", get(handle_status).delete(handle_delete))
        .route("/api/jobs/:id/image", get(handle_image))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_create(
    State(state): State<AppState>,
    query: Query<CreateJobQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<JobCreated>), ApiError> {
    api::handle_create(State(state.jobs), State(state.defaults), query, body).await
}

async fn handle_status(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<Json<JobInfo>, ApiError> {
    api::handle_status(State(state.jobs), path).await
}

async fn handle_image(
    State(state): State<AppState>,
    path: Path<String>,
    query: Query<ImageQuery>,
) -> Result<Response, ApiError> {
    api::handle_image(State(state.jobs), path, query).await
}

async fn handle_delete(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<StatusCode, ApiError> {
    api::handle_delete(State(state.jobs), path).await
}
