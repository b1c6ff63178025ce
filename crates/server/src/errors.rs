use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::CoreError;
use thiserror::Error;
use tracing::error;

/// A render that could not produce a page.
///
/// There is no fallback content: upstream faults surface as `502 Bad Gateway`.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to fetch post: {0}")]
    Upstream(#[from] CoreError),
    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),
}

impl PageError {
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::Upstream(_) => StatusCode::BAD_GATEWAY,
            PageError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.to_string();
        error!(error = %msg, status = status.as_u16(), "page render failed");
        (status, Json(serde_json::json!({"error": msg}))).into_response()
    }
}
