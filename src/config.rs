use std::net::SocketAddr;

use anyhow::{bail, Context};
use serde::Deserialize;

/// One year; longer lifetimes risk overflowing the expiry timestamp.
pub const MAX_LIFETIME_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub lifetime_hours: i64,
    pub cookie_secure: bool,
    pub cleanup_interval_secs: u64,
}

impl SessionConfig {
    pub fn lifetime(&self) -> time::Duration {
        time::Duration::hours(self.lifetime_hours)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.cookie_name.trim().is_empty() {
            bail!("SESSION_COOKIE_NAME must not be empty");
        }
        if !(1..=MAX_LIFETIME_HOURS).contains(&self.lifetime_hours) {
            bail!(
                "SESSION_LIFETIME_HOURS must be between 1 and {MAX_LIFETIME_HOURS}, got {}",
                self.lifetime_hours
            );
        }
        if self.cleanup_interval_secs == 0 {
            bail!("SESSION_CLEANUP_INTERVAL_SECS must be at least 1");
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "lawbook_session".into(),
            lifetime_hours: 12,
            cookie_secure: true,
            cleanup_interval_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub session: SessionConfig,
    pub cors_origin: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let defaults = SessionConfig::default();
        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            lifetime_hours: env_parse("SESSION_LIFETIME_HOURS")?
                .unwrap_or(defaults.lifetime_hours),
            cookie_secure: env_parse("SESSION_COOKIE_SECURE")?.unwrap_or(defaults.cookie_secure),
            cleanup_interval_secs: env_parse("SESSION_CLEANUP_INTERVAL_SECS")?
                .unwrap_or(defaults.cleanup_interval_secs),
        };
        let config = Self {
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS")?.unwrap_or(10),
            session,
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "https://lawbookv2.vercel.app".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT")?.unwrap_or(4000),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        self.session.validate()?;
        self.addr()?;
        Ok(())
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// `Ok(None)` when unset; a value that does not parse is an error rather
/// than a silent fallback to the default.
fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(None),
    }
}
