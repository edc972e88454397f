use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// ApiError
///
/// The full failure taxonomy of the API, raised at the point of detection and
/// translated to HTTP responses by a single boundary (`IntoResponse` plus the
/// error-envelope middleware in `lib.rs`).
///
/// `Unauthorized` carries no detail on purpose: an expired token and a forged
/// token must be indistinguishable to the caller.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Missing, malformed, expired, or revoked credential.
    #[error("invalid token")]
    Unauthorized,
    /// Authenticated, but the ownership/role policy denies the operation.
    #[error("{0}")]
    Forbidden(String),
    /// Identifier was well-formed but matched no record.
    #[error("{0}")]
    NotFound(String),
    /// Malformed identifier or missing/invalid request fields.
    #[error("{0}")]
    BadRequest(String),
    /// Duplicate unique field on create.
    #[error("{0}")]
    Conflict(String),
    /// Any unanticipated failure. Message is best-effort from the cause.
    #[error("{0}")]
    Internal(String),
}

/// ErrorEnvelope
///
/// Standard error body for everything except 401 responses:
/// `{ timestamp, status, error, message, path }`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ErrorEnvelope {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the standard envelope for this error against the request path.
    /// The path is only known at the router boundary, so `IntoResponse` first
    /// renders with an empty path and the middleware re-stamps it.
    pub fn envelope(&self, path: &str) -> ErrorEnvelope {
        let status = self.status();
        ErrorEnvelope {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: self.to_string(),
            path: path.to_string(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("database error: {:?}", err);
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = match &self {
            // 401 keeps the compact body shape used by the token filter.
            ApiError::Unauthorized => (
                status,
                Json(serde_json::json!({ "message": self.to_string() })),
            )
                .into_response(),
            _ => (status, Json(self.envelope(""))).into_response(),
        };
        // Stashed so the boundary middleware can rebuild the body with the path.
        response.extensions_mut().insert(self);
        response
    }
}
