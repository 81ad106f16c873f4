use std::fmt::Display;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use todo_types::api::Envelope;

/// Failures surfaced to the browser as a `{success: false, message}` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    /// Persistence or other unexpected failure. The transaction has already
    /// been rolled back by the time this is built.
    #[error("{context}: {detail}")]
    Internal { context: &'static str, detail: String },

    /// The request body could not be read (bad encoding, over the size limit).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    /// `map_err` adapter: `.map_err(ApiError::internal("Failed to add task"))`.
    pub fn internal<E: Display>(context: &'static str) -> impl FnOnce(E) -> Self {
        move |e| Self::Internal {
            context,
            detail: e.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(Envelope::err(self.to_string()))).into_response()
    }
}
