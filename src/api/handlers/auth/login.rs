//! Password login endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::error;

use super::{
    error::AuthFailure,
    password::verify_password,
    session::establish_session,
    state::AuthState,
    storage::lookup_user_by_username,
    types::{AuthResponse, LoginRequest},
};

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; refresh cookie set", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let record = match lookup_user_by_username(&pool, request.username.trim()).await {
        Ok(record) => record,
        Err(err) => {
            error!("Failed to look up user for login: {err}");
            return AuthFailure::Internal.into_response();
        }
    };

    // Unknown users verify against a fallback hash so both failure paths do
    // the same work and produce the same response.
    let stored_hash = record.as_ref().map_or_else(
        || auth_state.fallback_hash().to_string(),
        |user| user.password_hash.clone(),
    );
    let password_matches = verify_password(&request.password, &stored_hash);

    let Some(user) = record.filter(|_| password_matches) else {
        return AuthFailure::InvalidCredentials.into_response();
    };

    establish_session(&auth_state, &user, StatusCode::OK)
}
