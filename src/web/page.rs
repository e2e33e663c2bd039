use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use time::OffsetDateTime;

use crate::auth::extractors::AuthStatus;
use crate::error::AppError;
use crate::sessions::Session;
use crate::web::csrf::CsrfToken;
use crate::state::AppState;
use crate::users::User;

/// Values every rendered page needs.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
    pub user: Option<User>,
}

impl PageContext {
    /// Pops the pending flash message, so only call this when a page is
    /// actually going to be rendered.
    pub async fn build(
        state: &AppState,
        session: &Session,
        csrf: &CsrfToken,
        auth: AuthStatus,
    ) -> Result<Self, AppError> {
        let flash = session.pop_flash().await;
        let csrf_token = csrf.value().await?;
        let user = match auth.user_id() {
            Some(id) => state.users.get(id).await.ok(),
            None => None,
        };
        Ok(Self {
            current_year: OffsetDateTime::now_utc().year(),
            flash,
            is_authenticated: auth.is_authenticated(),
            csrf_token,
            user,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let csrf = CsrfToken::from_request_parts(parts, state).await?;
        let auth = parts
            .extensions
            .get::<AuthStatus>()
            .copied()
            .unwrap_or_default();
        Self::build(state, &session, &csrf, auth).await
    }
}
