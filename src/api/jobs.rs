use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{FilterConfig, JobCreated, JobId, JobInfo};
use crate::services::{submit, FilterParams, JobStore};

/// Query parameters for job submission; omitted values use the configured
/// defaults
#[derive(Debug, Default, Deserialize)]
pub struct CreateJobQuery {
    #[serde(default)]
    pub radius: Option<usize>,
    #[serde(default)]
    pub darken: Option<f64>,
}

impl CreateJobQuery {
    pub fn to_params(&self, defaults: &FilterConfig) -> FilterParams {
        let mut params = FilterParams::from_config(defaults);
        if let Some(radius) = self.radius {
            params.radius = radius;
        }
        if let Some(darken) = self.darken {
            params.darken_amount = darken;
        }
        params
    }
}

/// Query parameters for image retrieval
#[derive(Debug, Default, Deserialize)]
pub struct ImageQuery {
    /// Return the partially written buffer of a running job
    #[serde(default)]
    pub preview: bool,
}

/// Submit an image for filtering
///
/// The body is a raw PNG or JPEG. Returns 202 with the job id; scanning
/// continues in the background.
pub async fn handle_create<S: JobStore>(
    State(store): State<Arc<S>>,
    State(defaults): State<Arc<FilterConfig>>,
    Query(query): Query<CreateJobQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<JobCreated>), ApiError> {
    let params = query.to_params(&defaults);
    let (job, _created) = submit(store.as_ref(), &body, params).await?;
    let info = job.info();
    Ok((StatusCode::ACCEPTED, Json(info.into())))
}

/// Report job status and progress
pub async fn handle_status<S: JobStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<JobInfo>, ApiError> {
    let job = store
        .find(&JobId::new(id))
        .await?
        .ok_or(ApiError::JobNotFound)?;
    Ok(Json(job.info()))
}

/// Fetch the filtered image as PNG
///
/// Returns 409 while the job is running unless `preview=true` is given.
pub async fn handle_image<S: JobStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ApiError> {
    let job = store
        .find(&JobId::new(id))
        .await?
        .ok_or(ApiError::JobNotFound)?;
    let png_bytes = job.encode_result(query.preview).await?;

    tracing::debug!(job = %job.id(), size_bytes = png_bytes.len(), preview = query.preview, "Serving image");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CONTENT_LENGTH, &png_bytes.len().to_string()),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Bytes::from(png_bytes),
    )
        .into_response())
}

/// Discard a job; its scan stops at the next step boundary
pub async fn handle_delete<S: JobStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let job = store
        .remove(&JobId::new(id))
        .await?
        .ok_or(ApiError::JobNotFound)?;
    job.discard();
    tracing::info!(job = %job.id(), "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}
