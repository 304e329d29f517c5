//! Authenticated principal extraction and authorization helpers.
//!
//! Flow Overview: read the bearer token, verify signature and expiry (access
//! tokens are stateless, so there is no revocation lookup here), then resolve
//! the subject to a live user. The admin check is a separate step that every
//! privileged handler applies explicitly.

use axum::http::HeaderMap;
use sqlx::SqlitePool;
use tracing::error;
use uuid::Uuid;

use super::{
    error::AuthFailure,
    session::extract_bearer_token,
    state::AuthState,
    storage::lookup_user_by_id,
    token::{verify_hs256, TokenKind},
    utils::unix_now,
};

/// Authenticated user context derived from the access token.
#[derive(Clone, Debug)]
pub(crate) struct Principal {
    pub(crate) user_id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) is_admin: bool,
}

/// Resolve the bearer access token into a principal.
///
/// A missing, malformed, or expired token and a deleted subject all collapse
/// into `Unauthenticated`.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &SqlitePool,
    auth_state: &AuthState,
) -> Result<Principal, AuthFailure> {
    let token = extract_bearer_token(headers).ok_or(AuthFailure::Unauthenticated)?;

    let claims = verify_hs256(&token, auth_state.secret(), TokenKind::Access, unix_now())
        .map_err(|_| AuthFailure::Unauthenticated)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthFailure::Unauthenticated)?;

    match lookup_user_by_id(pool, user_id).await {
        Ok(Some(user)) => Ok(Principal {
            user_id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
        }),
        Ok(None) => Err(AuthFailure::Unauthenticated),
        Err(err) => {
            error!("Failed to resolve access token subject: {err}");
            Err(AuthFailure::Internal)
        }
    }
}

/// Role gate for privileged operations; authentication never implies it.
pub(crate) fn require_admin(principal: &Principal) -> Result<(), AuthFailure> {
    if principal.is_admin {
        Ok(())
    } else {
        Err(AuthFailure::Forbidden)
    }
}
