//! Registration endpoint.
//!
//! A successful registration immediately establishes a session, exactly like
//! login: access token in the body, refresh token in the cookie.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::error;

use super::{
    error::AuthFailure,
    password::{hash_password, MIN_PASSWORD_LENGTH},
    session::establish_session,
    state::AuthState,
    storage::{insert_user, RegisterOutcome},
    types::{AuthResponse, RegisterRequest},
    utils::valid_email,
};

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful; refresh cookie set", body = AuthResponse),
        (status = 400, description = "Validation failed or username taken")
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let username = request.username.trim();
    if username.is_empty() {
        return validation_error("Invalid username");
    }

    if !valid_email(request.email.trim()) {
        return validation_error("Invalid email");
    }

    if request.password1 != request.password2 {
        return validation_error("Passwords do not match");
    }

    if request.password1.len() < MIN_PASSWORD_LENGTH {
        return validation_error("Password too short");
    }

    let password_hash = match hash_password(&request.password1) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password during registration: {err}");
            return AuthFailure::Internal.into_response();
        }
    };

    let outcome = match insert_user(
        &pool,
        username,
        request.email.trim(),
        &password_hash,
        false,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Failed to insert user during registration: {err}");
            return AuthFailure::Internal.into_response();
        }
    };

    let user = match outcome {
        RegisterOutcome::Created(user) => user,
        RegisterOutcome::Conflict => return validation_error("Username already taken"),
    };

    establish_session(&auth_state, &user, StatusCode::CREATED)
}

fn validation_error(message: &str) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(json!({"detail": message}))).into_response()
}
