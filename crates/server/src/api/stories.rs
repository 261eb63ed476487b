//! Top stories API handler.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use topstories_core::{PipelineError, RankedStory};
use tracing::{info, warn};

use crate::state::AppState;

/// Seconds a client is asked to wait before retrying a failed request.
const RETRY_AFTER_SECS: &str = "5";

/// Error response
#[derive(Debug, Serialize)]
pub struct StoriesErrorResponse {
    pub error: String,
}

/// Get the `count` highest-scored current top stories.
pub async fn top_stories(
    State(state): State<Arc<AppState>>,
    Path(count): Path<i64>,
) -> Result<Json<Vec<RankedStory>>, Response> {
    info!("Top stories requested (count: {})", count);

    // A request dropped by the client stops waiting; a server shutdown does too.
    let cancel = state.shutdown_token().child_token();
    let _guard = cancel.clone().drop_guard();

    match state.pipeline().top_stories(count, &cancel).await {
        Ok(stories) => Ok(Json(stories)),
        Err(e) => {
            if e.is_retryable() {
                warn!("Top stories request failed: {}", e);
            }
            Err(error_response(&e))
        }
    }
}

fn error_response(err: &PipelineError) -> Response {
    let body = Json(StoriesErrorResponse {
        error: err.to_string(),
    });

    match err {
        PipelineError::Validation(_) => (StatusCode::BAD_REQUEST, body).into_response(),
        PipelineError::TimedOut => (
            StatusCode::GATEWAY_TIMEOUT,
            [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
            body,
        )
            .into_response(),
        PipelineError::IdFetch { .. }
        | PipelineError::IdsUnavailable
        | PipelineError::NoDetails { .. }
        | PipelineError::Cancelled => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
            body,
        )
            .into_response(),
    }
}
