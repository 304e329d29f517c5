//! # Laboro (Lab Tasks Portal Backend)
//!
//! `laboro` serves a small catalogue of lab tasks grouped by topics, guarded
//! by JWT authentication with revocable refresh sessions.
//!
//! ## Sessions (Access + Refresh Tokens)
//!
//! Authentication issues two HMAC-signed tokens:
//!
//! - **Access token:** short-lived and stateless. Presented as a bearer token
//!   on every protected request and validated by signature and expiry alone.
//! - **Refresh token:** long-lived and revocable. Carried only in an
//!   `HttpOnly` cookie and used solely to mint new access tokens. Its unique
//!   token id is the revocation key: logout (and rotation, when enabled)
//!   blacklists the id server-side, so a revoked token never validates again
//!   even before its natural expiry.
//!
//! Login failures are uniform: the response never reveals whether the
//! username exists, and refresh failures never reveal whether a token was
//! malformed, expired, or revoked.
//!
//! ## Authorization
//!
//! Roles are flat: a user either is or is not an administrator. Privileged
//! routes check the role explicitly after authentication; it is never implied
//! by a valid token.
//!
//! ## Wiring
//!
//! All state (token issuer, revocation store, labs storage) is constructed
//! once at startup in `cli::actions::server` and injected into handlers via
//! request extensions. There are no process-wide registries.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
