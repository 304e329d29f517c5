//! Request/response types for the auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{principal::Principal, storage::UserRecord};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Public identity fields exposed to clients.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct UserOut {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl UserOut {
    /// Map a stored user to its wire shape.
    pub(super) fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id.to_string(),
            username: record.username.clone(),
            email: record.email.clone(),
            is_admin: record.is_admin,
        }
    }

    /// Map an authenticated principal to its wire shape.
    pub(super) fn from_principal(principal: &Principal) -> Self {
        Self {
            id: principal.user_id.to_string(),
            username: principal.username.clone(),
            email: principal.email.clone(),
            is_admin: principal.is_admin,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserOut,
    pub access: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LogoutResponse {
    pub success: bool,
}
