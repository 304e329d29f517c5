//! Failure taxonomy for authentication and authorization.
//!
//! Every failure is a terminal result for the request; callers return the
//! variant instead of raising. The client-facing bodies are intentionally
//! coarse: `InvalidToken` covers malformed, expired, revoked, and
//! orphaned-identity refresh tokens without saying which.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("refresh token missing")]
    MissingToken,
    #[error("invalid refresh token")]
    InvalidToken,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("internal error")]
    Internal,
}

impl AuthFailure {
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::MissingToken | Self::InvalidToken | Self::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> serde_json::Value {
        match self {
            Self::InvalidCredentials => json!({"detail": "Invalid credentials"}),
            Self::MissingToken => json!({"detail": "Refresh token missing"}),
            Self::InvalidToken => json!({"detail": "Invalid refresh token"}),
            Self::Unauthenticated => json!({"detail": "Unauthorized"}),
            // One message for every role rejection, no matter the route.
            Self::Forbidden => json!({"error": "Not authorized"}),
            Self::Internal => json!({"detail": "Internal server error"}),
        }
    }
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
