//! Refresh coordinator: `/refresh` and `/logout`.
//!
//! Refresh validation happens in a fixed order: cookie presence, signature
//! and expiry, revocation, then subject existence. Every failure after the
//! missing-cookie check reports the same `Invalid refresh token` body.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::{
    error::AuthFailure,
    principal::require_auth,
    session::{clear_refresh_cookie, extract_refresh_token, refresh_cookie},
    state::AuthState,
    storage::{is_refresh_token_revoked, lookup_user_by_id, revoke_refresh_token},
    token::{sign_hs256, verify_hs256, TokenClaims, TokenKind},
    types::{LogoutResponse, RefreshResponse},
    utils::unix_now,
};

#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (status = 200, description = "New access token; cookie rotated when the policy is on", body = RefreshResponse),
        (status = 401, description = "Refresh token missing or invalid")
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(token) = extract_refresh_token(&headers) else {
        return AuthFailure::MissingToken.into_response();
    };

    // Signature and expiry first; both kinds of failure look identical to
    // the caller.
    let claims = match verify_hs256(&token, auth_state.secret(), TokenKind::Refresh, unix_now()) {
        Ok(claims) => claims,
        Err(_) => return AuthFailure::InvalidToken.into_response(),
    };

    match is_refresh_token_revoked(&pool, &claims.jti).await {
        Ok(false) => {}
        Ok(true) => return AuthFailure::InvalidToken.into_response(),
        Err(err) => {
            error!("Failed to check refresh token revocation: {err}");
            return AuthFailure::Internal.into_response();
        }
    }

    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return AuthFailure::InvalidToken.into_response();
    };
    let user = match lookup_user_by_id(&pool, user_id).await {
        Ok(Some(user)) => user,
        // A deleted subject is indistinguishable from a bad token.
        Ok(None) => return AuthFailure::InvalidToken.into_response(),
        Err(err) => {
            error!("Failed to resolve refresh token subject: {err}");
            return AuthFailure::Internal.into_response();
        }
    };

    let now = unix_now();
    let config = auth_state.config();

    let access_claims = TokenClaims::access(user.id, now, config.access_token_ttl_seconds());
    let access = match sign_hs256(auth_state.secret(), &access_claims) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to sign access token: {err}");
            return AuthFailure::Internal.into_response();
        }
    };

    let mut response_headers = HeaderMap::new();
    if config.rotate_refresh() {
        // Revoke before issuing the replacement so the presented token can
        // never be replayed, even if issuing fails afterwards.
        if let Err(err) = revoke_refresh_token(&pool, &claims.jti, claims.exp).await {
            error!("Failed to revoke rotated refresh token: {err}");
            return AuthFailure::Internal.into_response();
        }

        let rotated_claims =
            TokenClaims::refresh(user.id, now, config.refresh_token_ttl_seconds());
        let rotated = match sign_hs256(auth_state.secret(), &rotated_claims) {
            Ok(token) => token,
            Err(err) => {
                error!("Failed to sign rotated refresh token: {err}");
                return AuthFailure::Internal.into_response();
            }
        };
        match refresh_cookie(&auth_state, &rotated) {
            Ok(cookie) => {
                response_headers.insert(SET_COOKIE, cookie);
            }
            Err(err) => {
                error!("Failed to build rotated refresh cookie: {err}");
                return AuthFailure::Internal.into_response();
            }
        }
    }

    (
        StatusCode::OK,
        response_headers,
        Json(RefreshResponse { access }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Refresh token revoked and cookie cleared", body = LogoutResponse),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    if let Err(failure) = require_auth(&headers, &pool, &auth_state).await {
        return failure.into_response();
    }

    // Revoking an absent, unparseable, or already-revoked cookie token is a
    // graceful no-op; logout must stay idempotent.
    if let Some(token) = extract_refresh_token(&headers) {
        if let Ok(claims) =
            verify_hs256(&token, auth_state.secret(), TokenKind::Refresh, unix_now())
        {
            if let Err(err) = revoke_refresh_token(&pool, &claims.jti, claims.exp).await {
                error!("Failed to revoke refresh token on logout: {err}");
                return AuthFailure::Internal.into_response();
            }
        }
    }

    // Always clear the cookie, even when there was nothing to revoke.
    let mut response_headers = HeaderMap::new();
    match clear_refresh_cookie(auth_state.config()) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build clearing cookie: {err}");
            return AuthFailure::Internal.into_response();
        }
    }

    (
        StatusCode::OK,
        response_headers,
        Json(LogoutResponse { success: true }),
    )
        .into_response()
}
