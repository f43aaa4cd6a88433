pub mod firebase;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::models::Credentials;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in_secs: i64,
}

impl AuthUser {
    pub fn credentials(&self, now: DateTime<Utc>) -> Credentials {
        Credentials {
            id_token: self.id_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: now + Duration::seconds(self.expires_in_secs),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_custom_token(&self, token: &str) -> anyhow::Result<AuthUser>;
    async fn sign_in_anonymously(&self) -> anyhow::Result<AuthUser>;
    /// Exchanges a refresh token for a new ID token.
    async fn refresh(&self, refresh_token: &str) -> anyhow::Result<AuthUser>;
}
