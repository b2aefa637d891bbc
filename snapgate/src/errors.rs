use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data (empty batch, malformed multipart, bad field)
    #[error("{message}")]
    BadRequest { message: String },

    /// More files in one batch than the server accepts
    #[error("Too many files: received {received}, maximum is {max}")]
    TooManyFiles { received: usize, max: usize },

    /// A single file exceeds the configured size limit
    #[error("File '{filename}' exceeds the maximum size of {max_bytes} bytes")]
    PayloadTooLarge { filename: String, max_bytes: u64 },

    /// Wrong HTTP verb on the upload endpoint
    #[error("Method {method} Not Allowed")]
    MethodNotAllowed { method: String },

    /// Storage provider failure (credential acquisition or object creation)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } | Error::TooManyFiles { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::Storage(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Storage(StorageError::Credential { .. }) => {
                "Failed to authenticate with the storage provider".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Storage(StorageError::Credential { .. }) => {
                tracing::error!("Credential acquisition error: {:#}", self);
            }
            Error::Storage(_) | Error::Other(_) => {
                tracing::error!("Storage provider error: {:#}", self);
            }
            Error::MethodNotAllowed { .. } => {
                tracing::debug!("Disallowed method: {}", self);
            }
            Error::BadRequest { .. } | Error::TooManyFiles { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({ "error": self.user_message() });

        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
