//! Generated `OpenAPI` document, served as plain JSON.
//!
//! Add new endpoints to `paths(...)` so the served document stays complete.

use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use super::handlers::auth::types::{
    AuthResponse, LoginRequest, LogoutResponse, RefreshResponse, RegisterRequest, UserOut,
};
use super::handlers::labs::types::{CreateLabTaskRequest, LabTaskOut, TopicOut};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::auth::login::login,
        crate::api::handlers::auth::register::register,
        crate::api::handlers::auth::refresh::refresh,
        crate::api::handlers::auth::refresh::logout,
        crate::api::handlers::auth::me::me,
        crate::api::handlers::labs::topics,
        crate::api::handlers::labs::search,
        crate::api::handlers::labs::task,
        crate::api::handlers::labs::download_file,
        crate::api::handlers::labs::download_solution,
        crate::api::handlers::labs::create_task,
        crate::api::handlers::labs::update_task,
        crate::api::handlers::labs::delete_task,
    ),
    components(schemas(
        LoginRequest,
        RegisterRequest,
        UserOut,
        AuthResponse,
        RefreshResponse,
        LogoutResponse,
        TopicOut,
        LabTaskOut,
        CreateLabTaskRequest,
    )),
    tags(
        (name = "auth", description = "Login, registration and session refresh"),
        (name = "labs", description = "Lab tasks grouped by topics"),
        (name = "service", description = "Service metadata")
    )
)]
pub(crate) struct ApiDoc;

// axum handler for the OpenAPI document
pub(super) async fn serve() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let document = ApiDoc::openapi();
        let paths: Vec<&str> = document.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/health",
            "/login",
            "/register",
            "/refresh",
            "/logout",
            "/me",
            "/topics",
            "/search",
            "/tasks/{task_id}",
            "/tasks/{task_id}/download",
            "/tasks/{task_id}/download-solution",
            "/admin/tasks",
            "/admin/tasks/{task_id}",
        ] {
            assert!(paths.contains(&expected), "missing path: {expected}");
        }
    }
}
