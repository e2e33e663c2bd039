use axum::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::password::{hash_password, verify_password};
use super::repo_types::{CredentialRow, Role, User, UserRow};
use crate::error::ModelError;

const EMAIL_CONSTRAINT: &str = "users_uc_email";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account; the email must not be taken.
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<i64, ModelError>;

    /// Check a login attempt. Unknown email and wrong password both yield
    /// `InvalidCredentials`.
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError>;

    async fn get(&self, id: i64) -> Result<User, ModelError>;

    async fn exists(&self, id: i64) -> Result<bool, ModelError>;

    async fn update_password(&self, id: i64, new_password: &str) -> Result<(), ModelError>;

    async fn verify_email(&self, id: i64) -> Result<(), ModelError>;

    async fn deactivate(&self, id: i64) -> Result<(), ModelError>;

    /// Newest accounts first.
    async fn list_by_role(
        &self,
        role: Role,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, ModelError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn is_email_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().is_some_and(|code| code.as_ref() == "23505")
                && db_err
                    .constraint()
                    .is_some_and(|c| c == EMAIL_CONSTRAINT || c.contains("email"))
        }
        _ => false,
    }
}

fn expect_one(rows_affected: u64) -> Result<(), ModelError> {
    if rows_affected == 0 {
        return Err(ModelError::NoRecord);
    }
    Ok(())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<i64, ModelError> {
        let hashed = hash_password(password).await?;
        let res = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (name, email, hashed_password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&hashed)
        .bind(role.as_str())
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(id) => {
                debug!(user_id = id, %role, "user inserted");
                Ok(id)
            }
            Err(e) if is_email_conflict(&e) => Err(ModelError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, hashed_password, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ModelError::InvalidCredentials)?;

        if !row.is_active {
            return Err(ModelError::InactiveAccount);
        }
        if !verify_password(password, &row.hashed_password).await? {
            return Err(ModelError::InvalidCredentials);
        }
        Ok(row.id)
    }

    async fn get(&self, id: i64) -> Result<User, ModelError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at, updated_at, is_active, email_verified
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ModelError::NoRecord)?;
        User::try_from(row)
    }

    async fn exists(&self, id: i64) -> Result<bool, ModelError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn update_password(&self, id: i64, new_password: &str) -> Result<(), ModelError> {
        let hashed = hash_password(new_password).await?;
        let res = sqlx::query(
            "UPDATE users SET hashed_password = $1, updated_at = now() WHERE id = $2",
        )
        .bind(&hashed)
        .bind(id)
        .execute(&self.db)
        .await?;
        expect_one(res.rows_affected())
    }

    async fn verify_email(&self, id: i64) -> Result<(), ModelError> {
        let res = sqlx::query(
            "UPDATE users SET email_verified = TRUE, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        expect_one(res.rows_affected())
    }

    async fn deactivate(&self, id: i64) -> Result<(), ModelError> {
        let res = sqlx::query("UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        expect_one(res.rows_affected())
    }

    async fn list_by_role(
        &self,
        role: Role,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, ModelError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at, updated_at, is_active, email_verified
            FROM users
            WHERE role = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }
}
