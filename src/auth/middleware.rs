use axum::{
    extract::{Request, State},
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info};

use super::extractors::AuthStatus;
use crate::error::{AppError, ModelError};
use crate::sessions::Session;
use crate::state::AppState;
use crate::users::Role;

pub const PERMISSION_DENIED: &str = "You don't have permission to access this page";

/// Annotate the request with an [`AuthStatus`]. A session pointing at a user
/// that no longer exists is treated as unauthenticated and left as is.
pub async fn authenticate(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let status = match session.user_id().await {
        None => AuthStatus::Unauthenticated,
        Some(user_id) if state.users.exists(user_id).await? => {
            AuthStatus::Authenticated { user_id }
        }
        Some(user_id) => {
            debug!(user_id, "session refers to a missing user");
            AuthStatus::Unauthenticated
        }
    };
    req.extensions_mut().insert(status);
    Ok(next.run(req).await)
}

/// Bounce anonymous visitors to the login page; authenticated pages are
/// never cached.
pub async fn require_authentication(auth: AuthStatus, req: Request, next: Next) -> Response {
    if !auth.is_authenticated() {
        return Redirect::to("/user/login").into_response();
    }
    let mut res = next.run(req).await;
    res.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    res
}

async fn require_roles(
    state: &AppState,
    session: &Session,
    allowed: &[Role],
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = session.user_id().await.ok_or(ModelError::NoRecord)?;
    let user = state.users.get(user_id).await?;

    if !allowed.contains(&user.role) {
        info!(user_id, role = %user.role, path = %req.uri().path(), "role not permitted");
        session.put_flash(PERMISSION_DENIED).await;
        return Ok(Redirect::to("/").into_response());
    }
    Ok(next.run(req).await)
}

pub async fn student_only(
    State(state): State<AppState>,
    session: Session,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&state, &session, &[Role::Student], req, next).await
}

pub async fn lawyer_only(
    State(state): State<AppState>,
    session: Session,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&state, &session, &[Role::Lawyer], req, next).await
}

pub async fn recruiter_only(
    State(state): State<AppState>,
    session: Session,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&state, &session, &[Role::Recruiter], req, next).await
}

/// Moot court is open to students and lawyers.
pub async fn moot_court_access(
    State(state): State<AppState>,
    session: Session,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&state, &session, &[Role::Student, Role::Lawyer], req, next).await
}
