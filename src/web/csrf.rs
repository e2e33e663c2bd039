//! Double-submit CSRF protection.
//!
//! The token lives in its own HttpOnly cookie rather than in the session, so
//! serving a form to an anonymous visitor never writes a session row. Every
//! state-changing request must echo the cookie's value back in the
//! `csrf_token` form field or the `X-CSRF-Token` header.

use std::sync::Arc;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::config::SessionConfig;
use crate::error::{client_error, AppError, ModelError};
use crate::sessions::token::generate_token;
use crate::state::AppState;

/// Hidden form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";
/// Header alternative for script-driven requests.
pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_COOKIE: &str = "lawbook_csrf";

const MAX_FORM_BYTES: usize = 1024 * 1024;
const COOKIE_MAX_AGE: Duration = Duration::days(365);

#[derive(Debug, Default)]
struct Inner {
    token: Option<String>,
    /// Set when the response has to carry a new cookie.
    issued: bool,
}

/// The visitor's anti-forgery token for this request.
#[derive(Debug, Clone, Default)]
pub struct CsrfToken {
    inner: Arc<Mutex<Inner>>,
}

impl CsrfToken {
    fn from_cookie(token: Option<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                token,
                issued: false,
            })),
        }
    }

    /// Current token, issuing one if the visitor has none yet.
    pub async fn value(&self) -> Result<String, ModelError> {
        let mut inner = self.inner.lock().await;
        if let Some(token) = &inner.token {
            return Ok(token.clone());
        }
        let token = generate_token()?;
        inner.token = Some(token.clone());
        inner.issued = true;
        Ok(token)
    }

    /// Replace the token; forms rendered before this call stop validating.
    pub async fn rotate(&self) -> Result<(), ModelError> {
        let token = generate_token()?;
        let mut inner = self.inner.lock().await;
        inner.token = Some(token);
        inner.issued = true;
        Ok(())
    }

    async fn issued(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        if inner.issued {
            inner.token.clone()
        } else {
            None
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CsrfToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CsrfToken>()
            .cloned()
            .ok_or_else(|| AppError::internal("csrf layer is not installed"))
    }
}

pub fn csrf_cookie(cfg: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token))
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(COOKIE_MAX_AGE)
        .build()
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn form_token(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == CSRF_FIELD)
        .map(|(_, value)| value.into_owned())
}

fn tokens_match(expected: &str, submitted: &str) -> bool {
    let (a, b) = (expected.as_bytes(), submitted.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Check a state-changing request against the cookie token. The body is
/// buffered to read the form field and handed back untouched on success.
async fn check(expected: Option<&str>, req: Request) -> Result<Request, Response> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|_| client_error(StatusCode::PAYLOAD_TOO_LARGE))?;

    let submitted = parts
        .headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| form_token(&bytes));

    let reason = match (expected, submitted) {
        (Some(expected), Some(submitted)) if tokens_match(expected, &submitted) => {
            return Ok(Request::from_parts(parts, Body::from(bytes)));
        }
        (None, _) => "no token cookie",
        (Some(_), None) => "token missing from request",
        (Some(_), Some(_)) => "token does not match",
    };

    warn!(method = %parts.method, path = %parts.uri.path(), reason, "csrf check failed");
    Err((
        StatusCode::BAD_REQUEST,
        format!("CSRF token validation failed: {reason}"),
    )
        .into_response())
}

/// Verify mutating requests, expose a [`CsrfToken`] to handlers, and set the
/// cookie whenever a token was issued or rotated.
pub async fn verify_csrf(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty());

    let mut req = if is_safe(req.method()) {
        req
    } else {
        match check(existing.as_deref(), req).await {
            Ok(req) => req,
            Err(res) => return res,
        }
    };

    let csrf = CsrfToken::from_cookie(existing);
    req.extensions_mut().insert(csrf.clone());
    let mut res = next.run(req).await;

    if let Some(token) = csrf.issued().await {
        let cookie = csrf_cookie(&state.config.session, token);
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                res.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => error!(error = %e, "csrf cookie is not a valid header value"),
        }
    }
    res
}
