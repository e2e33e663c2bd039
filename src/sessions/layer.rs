use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::repo::SessionStore;
use super::repo_types::{SessionData, SessionRecord};
use super::token::generate_token;
use crate::config::SessionConfig;
use crate::error::{AppError, ModelError};
use crate::state::AppState;

#[derive(Debug, Default)]
struct Inner {
    token: Option<String>,
    expiry: Option<OffsetDateTime>,
    data: SessionData,
    /// Token dropped by `renew`, deleted from the store on commit.
    retired: Option<String>,
    modified: bool,
}

/// Request-scoped handle on the visitor's session.
///
/// Cloned into request extensions by [`load_and_save`]; every clone sees the
/// same state, and changes are persisted once the handler has returned.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    fn from_record(record: Option<SessionRecord>) -> Self {
        let inner = match record {
            Some(r) => Inner {
                token: Some(r.token),
                expiry: Some(r.expiry),
                data: r.data,
                ..Inner::default()
            },
            None => Inner::default(),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub async fn user_id(&self) -> Option<i64> {
        self.inner.lock().await.data.authenticated_user_id
    }

    pub async fn put_user_id(&self, user_id: i64) {
        let mut inner = self.inner.lock().await;
        inner.data.authenticated_user_id = Some(user_id);
        inner.modified = true;
    }

    pub async fn remove_user_id(&self) {
        let mut inner = self.inner.lock().await;
        if inner.data.authenticated_user_id.take().is_some() {
            inner.modified = true;
        }
    }

    pub async fn put_flash(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.data.flash = Some(message.into());
        inner.modified = true;
    }

    /// Read-once: the message is gone after this call.
    pub async fn pop_flash(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let flash = inner.data.flash.take();
        if flash.is_some() {
            inner.modified = true;
        }
        flash
    }

    /// Issue a new token on commit and retire the old one; the expiry
    /// restarts from now.
    pub async fn renew(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(old) = inner.token.take() {
            inner.retired.get_or_insert(old);
        }
        inner.expiry = None;
        inner.modified = true;
    }

    /// Persist pending changes. Returns the token and expiry to put in the
    /// cookie, or `None` when nothing changed.
    async fn commit(
        &self,
        store: &dyn SessionStore,
    ) -> Result<Option<(String, OffsetDateTime)>, ModelError> {
        let mut inner = self.inner.lock().await;
        if !inner.modified {
            return Ok(None);
        }
        if let Some(old) = inner.retired.take() {
            store.delete(&old).await?;
            debug!("session token renewed");
        }
        let token = match inner.token.clone() {
            Some(t) => t,
            None => generate_token()?,
        };
        let expiry = inner
            .expiry
            .unwrap_or_else(|| OffsetDateTime::now_utc() + store.lifetime());

        store
            .save(&SessionRecord {
                token: token.clone(),
                data: inner.data.clone(),
                expiry,
            })
            .await?;

        inner.token = Some(token.clone());
        inner.expiry = Some(expiry);
        inner.modified = false;
        Ok(Some((token, expiry)))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::internal("session layer is not installed"))
    }
}

pub fn session_cookie(cfg: &SessionConfig, token: String, expiry: OffsetDateTime) -> Cookie<'static> {
    let max_age = (expiry - OffsetDateTime::now_utc()).max(Duration::ZERO);
    Cookie::build((cfg.cookie_name.clone(), token))
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .expires(expiry)
        .max_age(max_age)
        .build()
}

/// Load the session named by the request cookie (or start an empty one),
/// run the rest of the stack, then save any changes and set the cookie.
pub async fn load_and_save(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let cfg = &state.config.session;

    let record = match jar.get(&cfg.cookie_name) {
        Some(cookie) => match state.sessions.find(cookie.value()).await {
            Ok(record) => Some(record),
            Err(ModelError::NoRecord | ModelError::ExpiredSession) => None,
            Err(e) => return AppError::from(e).into_response(),
        },
        None => None,
    };

    let session = Session::from_record(record);
    req.extensions_mut().insert(session.clone());

    let mut res = next.run(req).await;

    match session.commit(state.sessions.as_ref()).await {
        Ok(Some((token, expiry))) => {
            let cookie = session_cookie(cfg, token, expiry);
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => error!(error = %e, "session cookie is not a valid header value"),
            }
            res
        }
        Ok(None) => res,
        Err(e) => AppError::from(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::memory::MemorySessionStore;

    #[tokio::test]
    async fn untouched_session_is_not_saved() {
        let store = MemorySessionStore::default();
        let session = Session::from_record(None);
        assert!(session.commit(&store).await.unwrap().is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn flash_is_read_once() {
        let store = MemorySessionStore::default();
        let session = Session::from_record(None);
        session.put_flash("hello").await;
        let (token, _) = session.commit(&store).await.unwrap().unwrap();

        let next = Session::from_record(Some(store.find(&token).await.unwrap()));
        assert_eq!(next.pop_flash().await.as_deref(), Some("hello"));
        assert_eq!(next.pop_flash().await, None);
        next.commit(&store).await.unwrap();
        assert_eq!(store.find(&token).await.unwrap().data.flash, None);
    }

    #[tokio::test]
    async fn renew_retires_old_token_and_keeps_data() {
        let store = MemorySessionStore::default();
        let session = Session::from_record(None);
        session.put_user_id(5).await;
        let (old, _) = session.commit(&store).await.unwrap().unwrap();

        let loaded = Session::from_record(Some(store.find(&old).await.unwrap()));
        loaded.renew().await;
        let (new, _) = loaded.commit(&store).await.unwrap().unwrap();

        assert_ne!(old, new);
        assert!(!store.contains(&old));
        assert_eq!(store.get(&new).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn removing_missing_user_id_is_not_a_change() {
        let store = MemorySessionStore::default();
        let session = Session::from_record(None);
        session.remove_user_id().await;
        assert!(session.commit(&store).await.unwrap().is_none());
    }

    #[test]
    fn cookie_carries_required_attributes() {
        let cfg = SessionConfig::default();
        let expiry = OffsetDateTime::now_utc() + Duration::hours(12);
        let cookie = session_cookie(&cfg, "abc".into(), expiry);
        assert_eq!(cookie.name(), "lawbook_session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
