use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::{AuthProvider, AuthUser};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

pub struct FirebaseAuth {
    api_key: String,
    identity_url: String,
    secure_token_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
    #[serde(default)]
    local_id: Option<String>,
}

// securetoken answers in snake_case.
#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

fn parse_expires_in(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
}

impl FirebaseAuth {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoints(
            api_key,
            IDENTITY_TOOLKIT_URL.to_string(),
            SECURE_TOKEN_URL.to_string(),
        )
    }

    pub fn with_endpoints(api_key: String, identity_url: String, secure_token_url: String) -> Self {
        Self {
            api_key,
            identity_url: identity_url.trim_end_matches('/').to_string(),
            secure_token_url: secure_token_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn read_json(resp: reqwest::Response, service: &str) -> anyhow::Result<serde_json::Value> {
        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {service} response"))?;

        if !status.is_success() {
            anyhow::bail!("{service} error ({}): {}", status, data["error"]["message"]);
        }
        Ok(data)
    }

    async fn sign_in(&self, endpoint: &str, body: serde_json::Value) -> anyhow::Result<AuthUser> {
        let url = format!("{}/accounts:{endpoint}", self.identity_url);

        let resp = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to call accounts:{endpoint}"))?;

        let data = Self::read_json(resp, "identity toolkit").await?;
        let parsed: SignInResponse =
            serde_json::from_value(data).context("unexpected identity toolkit response")?;
        let uid = match parsed.local_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => uid_from_id_token(&parsed.id_token)?,
        };

        Ok(AuthUser {
            uid,
            expires_in_secs: parse_expires_in(parsed.expires_in.as_deref()),
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
        })
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    async fn sign_in_with_custom_token(&self, token: &str) -> anyhow::Result<AuthUser> {
        self.sign_in(
            "signInWithCustomToken",
            json!({ "token": token, "returnSecureToken": true }),
        )
        .await
    }

    async fn sign_in_anonymously(&self) -> anyhow::Result<AuthUser> {
        self.sign_in("signUp", json!({ "returnSecureToken": true }))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> anyhow::Result<AuthUser> {
        let resp = self
            .client
            .post(format!("{}/token", self.secure_token_url))
            .query(&[("key", &self.api_key)])
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await
            .context("failed to call securetoken")?;

        let data = Self::read_json(resp, "securetoken").await?;
        let parsed: RefreshResponse =
            serde_json::from_value(data).context("unexpected securetoken response")?;
        let uid = match parsed.user_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => uid_from_id_token(&parsed.id_token)?,
        };

        Ok(AuthUser {
            uid,
            expires_in_secs: parse_expires_in(parsed.expires_in.as_deref()),
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
        })
    }
}

/// Reads the uid from an ID token's claims. The signature is not checked;
/// the token came straight from the identity service.
pub fn uid_from_id_token(id_token: &str) -> anyhow::Result<String> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("malformed ID token"))?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .context("ID token payload is not base64url")?;
    let claims: serde_json::Value =
        serde_json::from_slice(&bytes).context("ID token payload is not JSON")?;

    claims["user_id"]
        .as_str()
        .or_else(|| claims["sub"].as_str())
        .filter(|uid| !uid.is_empty())
        .map(|uid| uid.to_string())
        .ok_or_else(|| anyhow::anyhow!("ID token has no user id"))
}
