//! Authenticated identity endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::SqlitePool;
use std::sync::Arc;

use super::{principal::require_auth, state::AuthState, types::UserOut};

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The authenticated identity's public fields", body = UserOut),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => {
            (StatusCode::OK, Json(UserOut::from_principal(&principal))).into_response()
        }
        Err(failure) => failure.into_response(),
    }
}
