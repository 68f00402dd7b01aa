//! Error types for tc-sidecar.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tc_core::TcError;
use tc_types::ImpairmentError;

/// Errors returned by sidecar handlers.
#[derive(Debug, thiserror::Error)]
pub enum SidecarError {
    /// The request could not be decoded or validated.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Applying the impairment failed.
    #[error(transparent)]
    Tc(#[from] TcError),
}

impl From<ImpairmentError> for SidecarError {
    fn from(e: ImpairmentError) -> Self {
        SidecarError::InvalidRequest(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<CommandDetails>,
}

#[derive(Debug, Serialize)]
struct CommandDetails {
    command: String,
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl SidecarError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SidecarError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SidecarError::Tc(TcError::Impairment(_)) => StatusCode::BAD_REQUEST,
            SidecarError::Tc(TcError::NotRunning { .. }) => StatusCode::NOT_FOUND,
            SidecarError::Tc(TcError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            SidecarError::Tc(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SidecarError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let error = self.to_string();
        let details = match self {
            SidecarError::Tc(TcError::Command {
                command,
                exit_code,
                stdout,
                stderr,
            }) => Some(CommandDetails {
                command,
                exit_code,
                stdout,
                stderr,
            }),
            _ => None,
        };

        let body = Json(ErrorResponse {
            status: "error",
            error,
            details,
        });

        (status, body).into_response()
    }
}
