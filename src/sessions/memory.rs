//! In-process `SessionStore` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use time::{Duration, OffsetDateTime};

use super::repo::SessionStore;
use super::repo_types::SessionRecord;
use crate::error::ModelError;

pub struct MemorySessionStore {
    rows: Mutex<HashMap<String, SessionRecord>>,
    lifetime: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_lifetime(Duration::hours(12))
    }
}

impl MemorySessionStore {
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            lifetime,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.rows.lock().unwrap().contains_key(token)
    }

    /// Moves the expiry of `token` into the past without deleting the row.
    pub fn expire(&self, token: &str) {
        if let Some(rec) = self.rows.lock().unwrap().get_mut(token) {
            rec.expiry = OffsetDateTime::now_utc() - Duration::seconds(1);
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn lifetime(&self) -> Duration {
        self.lifetime
    }

    async fn find(&self, token: &str) -> Result<SessionRecord, ModelError> {
        let record = self
            .rows
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(ModelError::NoRecord)?;
        if record.is_expired_at(OffsetDateTime::now_utc()) {
            return Err(ModelError::ExpiredSession);
        }
        Ok(record)
    }

    async fn save(&self, record: &SessionRecord) -> Result<(), ModelError> {
        self.rows
            .lock()
            .unwrap()
            .insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), ModelError> {
        self.rows.lock().unwrap().remove(token);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: i64) -> Result<u64, ModelError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, rec| rec.user_id() != Some(user_id));
        Ok((before - rows.len()) as u64)
    }

    async fn cleanup_expired(&self) -> Result<u64, ModelError> {
        let now = OffsetDateTime::now_utc();
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, rec| !rec.is_expired_at(now));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_session_resolves_to_user() {
        let store = MemorySessionStore::default();
        let token = store.insert(42).await.unwrap();
        assert_eq!(store.get(&token).await.unwrap(), 42);
        let rec = store.find(&token).await.unwrap();
        let remaining = rec.expiry - OffsetDateTime::now_utc();
        assert!(remaining > Duration::hours(11) && remaining <= Duration::hours(12));
    }

    #[tokio::test]
    async fn unknown_token_is_no_record() {
        let store = MemorySessionStore::default();
        assert!(matches!(store.get("nope").await, Err(ModelError::NoRecord)));
    }

    #[tokio::test]
    async fn session_rejected_after_expiry() {
        let store = MemorySessionStore::default();
        let token = store.insert(1).await.unwrap();
        assert!(store.get(&token).await.is_ok());
        store.expire(&token);
        assert!(matches!(
            store.get(&token).await,
            Err(ModelError::ExpiredSession)
        ));
    }

    #[tokio::test]
    async fn zero_lifetime_session_is_already_expired() {
        let store = MemorySessionStore::with_lifetime(Duration::ZERO);
        let token = store.insert(1).await.unwrap();
        assert!(matches!(
            store.get(&token).await,
            Err(ModelError::ExpiredSession)
        ));
    }

    #[tokio::test]
    async fn delete_all_for_user_leaves_other_users() {
        let store = MemorySessionStore::default();
        let a1 = store.insert(1).await.unwrap();
        let a2 = store.insert(1).await.unwrap();
        let b = store.insert(2).await.unwrap();

        assert_eq!(store.delete_all_for_user(1).await.unwrap(), 2);
        assert!(matches!(store.get(&a1).await, Err(ModelError::NoRecord)));
        assert!(matches!(store.get(&a2).await, Err(ModelError::NoRecord)));
        assert_eq!(store.get(&b).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_rows() {
        let store = MemorySessionStore::default();
        let live = store.insert(1).await.unwrap();
        let dead = store.insert(2).await.unwrap();
        store.expire(&dead);

        assert_eq!(store.cleanup_expired().await.unwrap(), 1);
        assert!(store.contains(&live));
        assert!(!store.contains(&dead));
    }

    #[tokio::test]
    async fn delete_forgets_token() {
        let store = MemorySessionStore::default();
        let token = store.insert(3).await.unwrap();
        store.delete(&token).await.unwrap();
        assert_eq!(store.len(), 0);
    }
}
