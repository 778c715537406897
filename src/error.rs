//! Error taxonomy shared by the factory, dispatcher and HTTP handlers.
//!
//! Engine-originating failures keep their message intact all the way to the
//! page. `MissingCredential` is a prompt rather than a fault.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::ModelSelector;
use crate::protocol::{ErrorBody, ErrorOut};

#[derive(Debug, Error)]
pub enum QnaError {
    #[error("Please enter your Google API Key in the sidebar to continue.")]
    MissingCredential,

    #[error("Failed to initialize the question engine for {model}. Please check your API key and model selection. ({reason})")]
    ClientInitializationFailed { model: ModelSelector, reason: String },

    #[error("Question generation failed: {0}")]
    GenerationFailed(String),

    #[error("Number of questions must be between 1 and 5, got {0}")]
    CountOutOfRange(i64),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown question type: {0}")]
    UnknownQuestionKind(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl QnaError {
    /// Stable machine-readable tag, used by the page to pick warning vs error styling.
    pub fn kind(&self) -> &'static str {
        match self {
            QnaError::MissingCredential => "missing_credential",
            QnaError::ClientInitializationFailed { .. } => "client_initialization_failed",
            QnaError::GenerationFailed(_) => "generation_failed",
            QnaError::CountOutOfRange(_) => "count_out_of_range",
            QnaError::UnknownModel(_) => "unknown_model",
            QnaError::UnknownQuestionKind(_) => "unknown_question_kind",
            QnaError::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            QnaError::MissingCredential => StatusCode::UNAUTHORIZED,
            QnaError::ClientInitializationFailed { .. } | QnaError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            QnaError::CountOutOfRange(_)
            | QnaError::UnknownModel(_)
            | QnaError::UnknownQuestionKind(_)
            | QnaError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Undecodable bodies get the same `{error: {kind, message}}` envelope as
/// every other failure.
impl From<JsonRejection> for QnaError {
    fn from(rejection: JsonRejection) -> Self {
        QnaError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for QnaError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(target: "tubequiz_backend", kind = self.kind(), error = %self, "Request failed");
        } else {
            warn!(target: "tubequiz_backend", kind = self.kind(), error = %self, "Request rejected");
        }
        let body = ErrorOut {
            error: ErrorBody { kind: self.kind().to_string(), message: self.to_string() },
        };
        (status, Json(body)).into_response()
    }
}
