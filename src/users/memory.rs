//! In-process `UserStore` for tests.

use std::sync::Mutex;

use axum::async_trait;
use time::OffsetDateTime;

use super::password::{hash_password, verify_password};
use super::repo::UserStore;
use super::repo_types::{Role, User};
use crate::error::ModelError;

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<(User, String)>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Simulates an account removed behind the application's back.
    pub fn purge(&self, id: i64) {
        self.rows.lock().unwrap().retain(|(u, _)| u.id != id);
    }

    fn update(&self, id: i64, f: impl FnOnce(&mut User, &mut String)) -> Result<(), ModelError> {
        let mut rows = self.rows.lock().unwrap();
        let (user, hash) = rows
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or(ModelError::NoRecord)?;
        f(user, hash);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<i64, ModelError> {
        let hashed = hash_password(password).await?;
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|(u, _)| u.email == email) {
            return Err(ModelError::DuplicateEmail);
        }
        let id = rows.iter().map(|(u, _)| u.id).max().unwrap_or(0) + 1;
        let now = OffsetDateTime::now_utc();
        rows.push((
            User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                role,
                created_at: now,
                updated_at: now,
                is_active: true,
                email_verified: false,
            },
            hashed,
        ));
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError> {
        let (id, active, hash) = {
            let rows = self.rows.lock().unwrap();
            let (u, h) = rows
                .iter()
                .find(|(u, _)| u.email == email)
                .ok_or(ModelError::InvalidCredentials)?;
            (u.id, u.is_active, h.clone())
        };
        if !active {
            return Err(ModelError::InactiveAccount);
        }
        if !verify_password(password, &hash).await? {
            return Err(ModelError::InvalidCredentials);
        }
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<User, ModelError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone())
            .ok_or(ModelError::NoRecord)
    }

    async fn exists(&self, id: i64) -> Result<bool, ModelError> {
        Ok(self.rows.lock().unwrap().iter().any(|(u, _)| u.id == id))
    }

    async fn update_password(&self, id: i64, new_password: &str) -> Result<(), ModelError> {
        let hashed = hash_password(new_password).await?;
        self.update(id, |_, h| *h = hashed)
    }

    async fn verify_email(&self, id: i64) -> Result<(), ModelError> {
        self.update(id, |u, _| u.email_verified = true)
    }

    async fn deactivate(&self, id: i64) -> Result<(), ModelError> {
        self.update(id, |u, _| u.is_active = false)
    }

    async fn list_by_role(
        &self,
        role: Role,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, ModelError> {
        let mut users: Vec<User> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u.role == role)
            .map(|(u, _)| u.clone())
            .collect();
        // ids break ties between rows created in the same instant
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signup_then_authenticate() {
        let store = MemoryUserStore::default();
        let id = store
            .insert("Ann", "a@x.com", "longenough1", Role::Student)
            .await
            .unwrap();
        assert_eq!(store.authenticate("a@x.com", "longenough1").await.unwrap(), id);
    }

    #[tokio::test]
    async fn duplicate_email_adds_no_row() {
        let store = MemoryUserStore::default();
        store
            .insert("Ann", "a@x.com", "longenough1", Role::Student)
            .await
            .unwrap();
        let err = store
            .insert("Other", "a@x.com", "different99", Role::Lawyer)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateEmail));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let store = MemoryUserStore::default();
        store
            .insert("Ann", "a@x.com", "longenough1", Role::Student)
            .await
            .unwrap();
        let wrong = store.authenticate("a@x.com", "wrong").await.unwrap_err();
        let unknown = store.authenticate("b@x.com", "longenough1").await.unwrap_err();
        assert!(matches!(wrong, ModelError::InvalidCredentials));
        assert!(matches!(unknown, ModelError::InvalidCredentials));
    }

    #[tokio::test]
    async fn deactivated_account_cannot_log_in() {
        let store = MemoryUserStore::default();
        let id = store
            .insert("Ann", "a@x.com", "longenough1", Role::Student)
            .await
            .unwrap();
        store.deactivate(id).await.unwrap();
        let err = store.authenticate("a@x.com", "longenough1").await.unwrap_err();
        assert!(matches!(err, ModelError::InactiveAccount));
        assert!(!store.get(id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn password_change_replaces_old_credential() {
        let store = MemoryUserStore::default();
        let id = store
            .insert("Ann", "a@x.com", "longenough1", Role::Student)
            .await
            .unwrap();
        store.update_password(id, "evenlonger22").await.unwrap();
        assert!(store.authenticate("a@x.com", "longenough1").await.is_err());
        assert_eq!(store.authenticate("a@x.com", "evenlonger22").await.unwrap(), id);
    }

    #[tokio::test]
    async fn verify_email_sets_flag() {
        let store = MemoryUserStore::default();
        let id = store
            .insert("Ann", "a@x.com", "longenough1", Role::Lawyer)
            .await
            .unwrap();
        store.verify_email(id).await.unwrap();
        assert!(store.get(id).await.unwrap().email_verified);
        assert!(matches!(store.verify_email(999).await, Err(ModelError::NoRecord)));
    }

    #[tokio::test]
    async fn list_by_role_filters_and_pages() {
        let store = MemoryUserStore::default();
        for (i, role) in [Role::Student, Role::Lawyer, Role::Student, Role::Student]
            .into_iter()
            .enumerate()
        {
            store
                .insert("u", &format!("u{i}@x.com"), "longenough1", role)
                .await
                .unwrap();
        }
        let students = store.list_by_role(Role::Student, 10, 0).await.unwrap();
        assert_eq!(students.len(), 3);
        assert!(students.iter().all(|u| u.role == Role::Student));
        assert_eq!(students[0].email, "u3@x.com");

        let page = store.list_by_role(Role::Student, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].email, "u2@x.com");
    }
}
