use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

/// Failures surfaced by the user and session stores.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("no matching record found")]
    NoRecord,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is inactive")]
    InactiveAccount,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("session has expired")]
    ExpiredSession,
    #[error("password hash: {0}")]
    PasswordHash(String),
    #[error("random source: {0}")]
    Random(#[from] rand::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Error returned by handlers and middleware. Always rendered as a generic
/// 500 page; the cause only goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn internal(msg: &'static str) -> Self {
        AppError::Internal(anyhow::anyhow!(msg))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = ?self, "request failed");
        server_error()
    }
}

const SERVER_ERROR_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Internal Server Error - Lawbook</title></head>
<body>
<header><h1><a href="/">Lawbook</a></h1></header>
<main><h2>Internal Server Error</h2><p>Something went wrong. Please try again later.</p></main>
</body>
</html>"#;

/// Generic failure page; never carries the cause.
pub fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_PAGE)).into_response()
}

/// Plain-text response carrying the canonical reason of `status`.
pub fn client_error(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, reason).into_response()
}
