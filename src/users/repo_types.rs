use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::ModelError;

/// Account category controlling which routes a user may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Lawyer,
    Recruiter,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Lawyer, Role::Recruiter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Lawyer => "lawyer",
            Role::Recruiter => "recruiter",
        }
    }

    /// Landing page after login.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Student => "/student/dashboard",
            Role::Lawyer => "/lawyer/dashboard",
            Role::Recruiter => "/recruiter/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "lawyer" => Ok(Role::Lawyer),
            "recruiter" => Ok(Role::Recruiter),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// User record without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub is_active: bool,
    pub email_verified: bool,
}

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub is_active: bool,
    pub email_verified: bool,
}

impl TryFrom<UserRow> for User {
    type Error = ModelError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = r
            .role
            .parse::<Role>()
            .map_err(|e| ModelError::Database(sqlx::Error::Decode(Box::new(e))))?;
        Ok(Self {
            id: r.id,
            name: r.name,
            email: r.email,
            role,
            created_at: r.created_at,
            updated_at: r.updated_at,
            is_active: r.is_active,
            email_verified: r.email_verified,
        })
    }
}

/// Columns needed to check a login attempt.
#[derive(Debug, FromRow)]
pub(crate) struct CredentialRow {
    pub id: i64,
    pub hashed_password: String,
    pub is_active: bool,
}
