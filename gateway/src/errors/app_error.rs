use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::flow::FlowError;
use crate::provider::ProviderError;
use crate::session::SessionError;

/// Message returned to clients when the voice provider fails.
///
/// Provider bodies can contain account details, so they are only logged.
pub const CALL_START_FAILED: &str = "Call could not be started";

/// Errors returned from HTTP handlers
///
/// Each variant maps to a status code and a `{ "error": ... }` body.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body failed validation
    #[error("{0}")]
    BadRequest(String),

    /// Voice provider call failed
    #[error("Voice provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Session store failed while binding a call
    #[error("Session store error: {0}")]
    Session(#[from] SessionError),
}

impl From<FlowError> for AppError {
    fn from(e: FlowError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Provider(ProviderError::MissingCredentials(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::Session(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to return to the client
    fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Provider(ProviderError::MissingCredentials(msg)) => msg.clone(),
            AppError::Provider(_) => CALL_START_FAILED.to_string(),
            AppError::Session(_) => "Session store unavailable".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = %status, "Request failed");
        } else {
            warn!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
