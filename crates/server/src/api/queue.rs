//! Job queue API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use topstories_core::{JobHandle, JobInfo, QueueStatus};

use crate::state::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct QueueErrorResponse {
    pub error: String,
}

/// Get worker pool status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    Json(state.queue().status().await)
}

/// Get one job while its record is retained
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<JobHandle>,
) -> Result<Json<JobInfo>, impl IntoResponse> {
    match state.queue().job(&handle).await {
        Some(info) => Ok(Json(info)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(QueueErrorResponse {
                error: format!("Job not found: {}", handle),
            }),
        )),
    }
}
