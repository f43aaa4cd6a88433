use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    CustomToken,
    Anonymous,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

/// Identity used to scope stored appointments. The user id never changes
/// once the session exists; only its credentials are rotated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
    pub source: SessionSource,
    pub ready: bool,
}

impl Session {
    pub fn authenticated(user_id: String, credentials: Credentials, source: SessionSource) -> Self {
        Self {
            user_id,
            credentials: Some(credentials),
            source,
            ready: true,
        }
    }

    pub fn fallback() -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            credentials: None,
            source: SessionSource::Fallback,
            ready: true,
        }
    }

    pub fn id_token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.id_token.as_str())
    }

    pub fn can_write(&self) -> bool {
        self.ready && !self.user_id.trim().is_empty()
    }
}
