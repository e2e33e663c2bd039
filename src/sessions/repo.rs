use axum::async_trait;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::repo_types::{SessionData, SessionRecord, SessionRow};
use super::token::generate_token;
use crate::error::ModelError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// How long a freshly issued session stays valid.
    fn lifetime(&self) -> Duration;

    /// Full session state; `NoRecord` for unknown tokens, `ExpiredSession`
    /// once the expiry has passed even if the row still exists.
    async fn find(&self, token: &str) -> Result<SessionRecord, ModelError>;

    /// Insert or replace the row stored under `record.token`.
    async fn save(&self, record: &SessionRecord) -> Result<(), ModelError>;

    async fn delete(&self, token: &str) -> Result<(), ModelError>;

    async fn delete_all_for_user(&self, user_id: i64) -> Result<u64, ModelError>;

    async fn cleanup_expired(&self) -> Result<u64, ModelError>;

    /// Issue a new session bound to `user_id`.
    async fn insert(&self, user_id: i64) -> Result<String, ModelError> {
        let record = SessionRecord {
            token: generate_token()?,
            data: SessionData {
                authenticated_user_id: Some(user_id),
                ..SessionData::default()
            },
            expiry: OffsetDateTime::now_utc() + self.lifetime(),
        };
        self.save(&record).await?;
        Ok(record.token)
    }

    /// User bound to a live session. Anonymous sessions count as `NoRecord`.
    async fn get(&self, token: &str) -> Result<i64, ModelError> {
        self.find(token).await?.user_id().ok_or(ModelError::NoRecord)
    }
}

#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
    lifetime: Duration,
}

impl PgSessionStore {
    pub fn new(db: PgPool, lifetime: Duration) -> Self {
        Self { db, lifetime }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    fn lifetime(&self) -> Duration {
        self.lifetime
    }

    async fn find(&self, token: &str) -> Result<SessionRecord, ModelError> {
        let record: SessionRecord = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT token, data, expiry
            FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ModelError::NoRecord)?
        .into();

        if record.is_expired_at(OffsetDateTime::now_utc()) {
            return Err(ModelError::ExpiredSession);
        }
        Ok(record)
    }

    async fn save(&self, record: &SessionRecord) -> Result<(), ModelError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, data, expiry)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (token) DO UPDATE
               SET user_id = EXCLUDED.user_id,
                   data = EXCLUDED.data,
                   expiry = EXCLUDED.expiry
            "#,
        )
        .bind(&record.token)
        .bind(record.user_id())
        .bind(sqlx::types::Json(&record.data))
        .bind(record.expiry)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), ModelError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: i64) -> Result<u64, ModelError> {
        let res = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        debug!(user_id, removed = res.rows_affected(), "sessions deleted for user");
        Ok(res.rows_affected())
    }

    async fn cleanup_expired(&self) -> Result<u64, ModelError> {
        let res = sqlx::query("DELETE FROM sessions WHERE expiry < now()")
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
