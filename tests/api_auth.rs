//! End-to-end auth flows through the full router.

mod common;

use anyhow::{Context, Result};
use axum::http::{header, Method, StatusCode};
use common::{
    access_token_for, cookie_header, login_user, refresh_token_value, register_user, request,
    setup, setup_default,
};
use serde_json::json;

#[tokio::test]
async fn register_creates_session_and_me_works() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let response = register_user(&router, "alice", "alice@x.com", "pw123456").await?;
    assert_eq!(response.status, StatusCode::CREATED);

    let body = response.json()?;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@x.com");
    assert_eq!(body["user"]["is_admin"], false);
    let access = body["access"].as_str().context("missing access token")?;

    // Refresh token arrives only as a protected cookie.
    let set_cookie = response
        .headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .context("missing refresh cookie")?;
    assert!(set_cookie.starts_with("refresh_token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));

    let me = request(&router, Method::GET, "/me", None, Some(access), None).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()?["username"], "alice");

    Ok(())
}

#[tokio::test]
async fn register_duplicate_username_is_rejected() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let first = register_user(&router, "alice", "alice@x.com", "pw123456").await?;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = register_user(&router, "alice", "alice@x.com", "pw123456").await?;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.json()?["detail"], "Username already taken");

    Ok(())
}

#[tokio::test]
async fn register_password_mismatch_creates_nothing() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let response = request(
        &router,
        Method::POST,
        "/register",
        Some(json!({
            "username": "alice",
            "email": "alice@x.com",
            "password1": "pw123456",
            "password2": "different",
        })),
        None,
        None,
    )
    .await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()?["detail"], "Passwords do not match");

    // The user must not exist afterwards.
    let login = login_user(&router, "alice", "pw123456").await?;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_password() -> Result<()> {
    let (router, _pool) = setup_default().await?;
    register_user(&router, "alice", "alice@x.com", "pw123456").await?;

    let response = login_user(&router, "alice", "wrong-password").await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()?["detail"], "Invalid credentials");

    // Unknown usernames read exactly the same.
    let response = login_user(&router, "nobody", "wrong-password").await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()?["detail"], "Invalid credentials");

    Ok(())
}

#[tokio::test]
async fn login_returns_fresh_session() -> Result<()> {
    let (router, _pool) = setup_default().await?;
    register_user(&router, "alice", "alice@x.com", "pw123456").await?;

    let response = login_user(&router, "alice", "pw123456").await?;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json()?;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["access"].as_str().is_some());
    assert!(refresh_token_value(&response.headers).is_some());

    Ok(())
}

#[tokio::test]
async fn refresh_without_cookie_is_missing_token() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let response = request(&router, Method::POST, "/refresh", None, None, None).await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()?["detail"], "Refresh token missing");

    Ok(())
}

#[tokio::test]
async fn refresh_with_garbage_cookie_is_invalid_token() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let response = request(
        &router,
        Method::POST,
        "/refresh",
        None,
        None,
        Some("refresh_token=invalid_token"),
    )
    .await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()?["detail"], "Invalid refresh token");

    Ok(())
}

#[tokio::test]
async fn refresh_mints_a_working_access_token() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let registered = register_user(&router, "alice", "alice@x.com", "pw123456").await?;
    let refresh_token =
        refresh_token_value(&registered.headers).context("missing refresh cookie")?;

    let response = request(
        &router,
        Method::POST,
        "/refresh",
        None,
        None,
        Some(&cookie_header(&refresh_token)),
    )
    .await?;
    assert_eq!(response.status, StatusCode::OK);
    let access = response.json()?["access"]
        .as_str()
        .context("missing access token")?
        .to_string();

    let me = request(&router, Method::GET, "/me", None, Some(&access), None).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()?["username"], "alice");

    // Without rotation the same cookie keeps working.
    let again = request(
        &router,
        Method::POST,
        "/refresh",
        None,
        None,
        Some(&cookie_header(&refresh_token)),
    )
    .await?;
    assert_eq!(again.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn rotation_retires_the_presented_cookie() -> Result<()> {
    let (router, _pool) = setup(true, std::env::temp_dir()).await?;

    let registered = register_user(&router, "alice", "alice@x.com", "pw123456").await?;
    let original = refresh_token_value(&registered.headers).context("missing refresh cookie")?;

    let response = request(
        &router,
        Method::POST,
        "/refresh",
        None,
        None,
        Some(&cookie_header(&original)),
    )
    .await?;
    assert_eq!(response.status, StatusCode::OK);
    let rotated = refresh_token_value(&response.headers).context("missing rotated cookie")?;
    assert_ne!(rotated, original);

    // The old cookie is now permanently dead.
    let replay = request(
        &router,
        Method::POST,
        "/refresh",
        None,
        None,
        Some(&cookie_header(&original)),
    )
    .await?;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.json()?["detail"], "Invalid refresh token");

    // The rotated one works.
    let next = request(
        &router,
        Method::POST,
        "/refresh",
        None,
        None,
        Some(&cookie_header(&rotated)),
    )
    .await?;
    assert_eq!(next.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn logout_revokes_and_clears() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let registered = register_user(&router, "alice", "alice@x.com", "pw123456").await?;
    let access = registered.json()?["access"]
        .as_str()
        .context("missing access token")?
        .to_string();
    let refresh_token =
        refresh_token_value(&registered.headers).context("missing refresh cookie")?;

    let response = request(
        &router,
        Method::POST,
        "/logout",
        None,
        Some(&access),
        Some(&cookie_header(&refresh_token)),
    )
    .await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()?["success"], true);

    // Cookie cleared alongside the server-side revocation.
    let cleared = response
        .headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .context("missing clearing cookie")?;
    assert!(cleared.starts_with("refresh_token=;"));
    assert!(cleared.contains("Max-Age=0"));

    // The revoked refresh token fails well before its natural expiry.
    let refresh = request(
        &router,
        Method::POST,
        "/refresh",
        None,
        None,
        Some(&cookie_header(&refresh_token)),
    )
    .await?;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
    assert_eq!(refresh.json()?["detail"], "Invalid refresh token");

    // A second logout with the already-revoked cookie is a graceful no-op.
    let again = request(
        &router,
        Method::POST,
        "/logout",
        None,
        Some(&access),
        Some(&cookie_header(&refresh_token)),
    )
    .await?;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.json()?["success"], true);

    Ok(())
}

#[tokio::test]
async fn logout_without_access_token_is_unauthorized() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let response = request(&router, Method::POST, "/logout", None, None, None).await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn me_requires_a_valid_access_token() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let missing = request(&router, Method::GET, "/me", None, None, None).await?;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = request(&router, Method::GET, "/me", None, Some("garbage"), None).await?;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn refresh_token_is_not_a_valid_access_token() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let registered = register_user(&router, "alice", "alice@x.com", "pw123456").await?;
    let refresh_token =
        refresh_token_value(&registered.headers).context("missing refresh cookie")?;

    // Presenting the refresh token as a bearer token must fail the gate.
    let response = request(
        &router,
        Method::GET,
        "/me",
        None,
        Some(&refresh_token),
        None,
    )
    .await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let (router, _pool) = setup_default().await?;

    let health = request(&router, Method::GET, "/health", None, None, None).await?;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.json()?["name"], "laboro");

    let root = request(&router, Method::GET, "/", None, None, None).await?;
    assert_eq!(root.status, StatusCode::OK);

    let openapi = request(&router, Method::GET, "/openapi.json", None, None, None).await?;
    assert_eq!(openapi.status, StatusCode::OK);
    assert!(openapi.json()?["paths"]["/login"].is_object());

    Ok(())
}

#[tokio::test]
async fn every_login_issues_a_distinct_refresh_token() -> Result<()> {
    let (router, _pool) = setup_default().await?;
    let _ = access_token_for(&router, "alice", "pw123456").await?;

    let first = login_user(&router, "alice", "pw123456").await?;
    let second = login_user(&router, "alice", "pw123456").await?;

    let first_token = refresh_token_value(&first.headers).context("missing cookie")?;
    let second_token = refresh_token_value(&second.headers).context("missing cookie")?;
    assert_ne!(first_token, second_token);

    Ok(())
}
