#![allow(dead_code)]

//! Shared plumbing for the integration suites: an app instance over an
//! in-memory database, plus request/seeding helpers.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use laboro::api::{self, AuthConfig, AuthState, LabsState};
use secrecy::SecretString;
use serde_json::{json, Value};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::{path::PathBuf, sync::Arc};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Build the full application router over a fresh in-memory database.
pub async fn setup(rotate_refresh: bool, data_dir: PathBuf) -> Result<(Router, SqlitePool)> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .context("failed to open in-memory database")?;
    api::prepare_database(&pool).await?;

    let config =
        AuthConfig::new("http://localhost:5173".to_string()).with_rotate_refresh(rotate_refresh);
    let auth_state = Arc::new(AuthState::new(
        config,
        SecretString::from(TEST_SECRET.to_string()),
    )?);
    let labs_state = Arc::new(LabsState::new(data_dir));

    Ok((api::app(pool.clone(), auth_state, labs_state), pool))
}

pub async fn setup_default() -> Result<(Router, SqlitePool)> {
    setup(false, std::env::temp_dir()).await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.bytes).context("response body is not JSON")
    }
}

pub async fn request(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
    cookie: Option<&str>,
) -> Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_string());
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&value)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = router
        .clone()
        .oneshot(request)
        .await
        .context("request failed")?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .context("failed to collect response body")?
        .to_bytes()
        .to_vec();

    Ok(TestResponse {
        status,
        headers,
        bytes,
    })
}

/// Pull the raw refresh token out of a `Set-Cookie` response header.
pub fn refresh_token_value(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::SET_COOKIE)?.to_str().ok()?;
    let first = value.split(';').next()?;
    let (name, token) = first.split_once('=')?;
    if name.trim() == "refresh_token" && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

pub fn cookie_header(refresh_token: &str) -> String {
    format!("refresh_token={refresh_token}")
}

pub async fn register_user(
    router: &Router,
    username: &str,
    email: &str,
    password: &str,
) -> Result<TestResponse> {
    request(
        router,
        Method::POST,
        "/register",
        Some(json!({
            "username": username,
            "email": email,
            "password1": password,
            "password2": password,
        })),
        None,
        None,
    )
    .await
}

pub async fn login_user(router: &Router, username: &str, password: &str) -> Result<TestResponse> {
    request(
        router,
        Method::POST,
        "/login",
        Some(json!({"username": username, "password": password})),
        None,
        None,
    )
    .await
}

/// Register a user and return their access token.
pub async fn access_token_for(
    router: &Router,
    username: &str,
    password: &str,
) -> Result<String> {
    let response = register_user(router, username, &format!("{username}@x.com"), password).await?;
    anyhow::ensure!(
        response.status == StatusCode::CREATED,
        "registration failed: {}",
        response.status
    );
    let access = response.json()?["access"]
        .as_str()
        .context("missing access token")?
        .to_string();
    Ok(access)
}

pub async fn promote_to_admin(pool: &SqlitePool, username: &str) -> Result<()> {
    sqlx::query("UPDATE users SET is_admin = 1 WHERE username = ?1")
        .bind(username)
        .execute(pool)
        .await
        .context("failed to promote user")?;
    Ok(())
}

pub async fn seed_topic(pool: &SqlitePool, name: &str, description: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO topics (name, description) VALUES (?1, ?2)")
        .bind(name)
        .bind(description)
        .execute(pool)
        .await
        .context("failed to seed topic")?;
    Ok(result.last_insert_rowid())
}

pub async fn seed_task(
    pool: &SqlitePool,
    topic_id: i64,
    title: &str,
    description: &str,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO lab_tasks (title, description, topic_id, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(title)
    .bind(description)
    .bind(topic_id)
    .bind(1_700_000_000_i64)
    .execute(pool)
    .await
    .context("failed to seed task")?;
    Ok(result.last_insert_rowid())
}

pub async fn attach_file(pool: &SqlitePool, task_id: i64, relative_path: &str) -> Result<()> {
    sqlx::query("UPDATE lab_tasks SET file_path = ?2 WHERE id = ?1")
        .bind(task_id)
        .bind(relative_path)
        .execute(pool)
        .await
        .context("failed to attach file")?;
    Ok(())
}

pub async fn count_tasks(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM lab_tasks")
        .fetch_one(pool)
        .await
        .context("failed to count tasks")?;
    Ok(row.0)
}
