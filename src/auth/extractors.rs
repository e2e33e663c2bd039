use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

/// Outcome of resolving the session's user for this request. Inserted by
/// `authenticate`; absent means the request never went through it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStatus {
    #[default]
    Unauthenticated,
    Authenticated { user_id: i64 },
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            AuthStatus::Authenticated { user_id } => Some(*user_id),
            AuthStatus::Unauthenticated => None,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthStatus
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthStatus>()
            .copied()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn missing_extension_means_unauthenticated() {
        let (mut parts, _) = Request::new(()).into_parts();
        let status = AuthStatus::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(status, AuthStatus::Unauthenticated);
        assert!(!status.is_authenticated());
    }

    #[tokio::test]
    async fn reads_status_from_extensions() {
        let (mut parts, _) = Request::new(()).into_parts();
        parts
            .extensions
            .insert(AuthStatus::Authenticated { user_id: 3 });
        let status = AuthStatus::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(status.user_id(), Some(3));
    }
}
