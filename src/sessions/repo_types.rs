use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Per-visitor state carried between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated_user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token: String,
    pub data: SessionData,
    pub expiry: OffsetDateTime,
}

impl SessionRecord {
    pub fn user_id(&self) -> Option<i64> {
        self.data.authenticated_user_id
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expiry <= now
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct SessionRow {
    pub token: String,
    pub data: sqlx::types::Json<SessionData>,
    pub expiry: OffsetDateTime,
}

impl From<SessionRow> for SessionRecord {
    fn from(r: SessionRow) -> Self {
        Self {
            token: r.token,
            data: r.data.0,
            expiry: r.expiry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn empty_data_serializes_to_empty_object() {
        let json = serde_json::to_string(&SessionData::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn missing_keys_deserialize_as_none() {
        let data: SessionData = serde_json::from_str(r#"{"flash":"hi"}"#).unwrap();
        assert_eq!(data.flash.as_deref(), Some("hi"));
        assert_eq!(data.authenticated_user_id, None);
    }

    #[test]
    fn record_expires_once_deadline_passes() {
        let now = OffsetDateTime::now_utc();
        let rec = SessionRecord {
            token: "t".into(),
            data: SessionData::default(),
            expiry: now + Duration::seconds(1),
        };
        assert!(!rec.is_expired_at(now));
        assert!(rec.is_expired_at(now + Duration::seconds(1)));
    }
}
