//! Session transport: the refresh cookie and bearer extraction.
//!
//! The refresh token only ever travels in an `HttpOnly` cookie scoped to the
//! whole service; the access token only ever travels in the `Authorization`
//! header. Clearing a session means expiring the cookie *and* revoking the
//! token server-side - the cookie alone proves nothing.

use axum::{
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use super::{
    error::AuthFailure,
    state::{AuthConfig, AuthState},
    storage::UserRecord,
    token::{sign_hs256, TokenClaims},
    types::{AuthResponse, UserOut},
    utils::unix_now,
};

pub(super) const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Build the `HttpOnly` cookie carrying a refresh token.
pub(super) fn refresh_cookie(
    auth_state: &AuthState,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = auth_state.config().refresh_token_ttl_seconds();
    // Only mark the cookie secure when the frontend is served over HTTPS.
    let secure = auth_state.config().cookie_secure();
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_refresh_cookie(
    auth_config: &AuthConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = auth_config.cookie_secure();
    let mut cookie =
        format!("{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == REFRESH_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Issue a fresh access/refresh pair for `user` and wrap it into the login or
/// register response, with the refresh cookie set.
pub(super) fn establish_session(
    auth_state: &AuthState,
    user: &UserRecord,
    status: StatusCode,
) -> Response {
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

    let refresh_claims = TokenClaims::refresh(user.id, now, config.refresh_token_ttl_seconds());
    let refresh = match sign_hs256(auth_state.secret(), &refresh_claims) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to sign refresh token: {err}");
            return AuthFailure::Internal.into_response();
        }
    };

    let mut headers = HeaderMap::new();
    match refresh_cookie(auth_state, &refresh) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build refresh cookie: {err}");
            return AuthFailure::Internal.into_response();
        }
    }

    let body = AuthResponse {
        success: true,
        user: UserOut::from_record(user),
        access,
    };
    (status, headers, Json(body)).into_response()
}
