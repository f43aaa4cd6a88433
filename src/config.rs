use std::env;

use serde::{Deserialize, Serialize};

/// Connection settings for the hosted backend, parsed from `FIREBASE_CONFIG`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub auth_domain: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
}

impl BackendConfig {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "invalid FIREBASE_CONFIG, using empty config");
                Self::default()
            }
        }
    }

    pub fn has_auth(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn has_firestore(&self) -> bool {
        !self.project_id.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub app_id: String,
    pub backend: BackendConfig,
    pub initial_auth_token: Option<String>,
    pub toast_ttl_secs: u64,
    pub visitor_idle_secs: u64,
    pub default_appointment_date: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "docto.db".to_string()),
            app_id: env::var("APP_ID")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "default-app-id".to_string()),
            backend: env::var("FIREBASE_CONFIG")
                .map(|raw| BackendConfig::parse(&raw))
                .unwrap_or_default(),
            initial_auth_token: env::var("INITIAL_AUTH_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            toast_ttl_secs: env::var("TOAST_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            visitor_idle_secs: env::var("VISITOR_IDLE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            default_appointment_date: env::var("DEFAULT_APPOINTMENT_DATE")
                .unwrap_or_else(|_| "October 22, 2025".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_config() {
        let cfg = BackendConfig::parse(r#"{"apiKey":"k","projectId":"clinic","authDomain":"x"}"#);
        assert_eq!(cfg.api_key, "k");
        assert_eq!(cfg.project_id, "clinic");
        assert!(cfg.has_auth());
        assert!(cfg.has_firestore());
    }

    #[test]
    fn test_parse_invalid_backend_config_is_empty() {
        let cfg = BackendConfig::parse("not json");
        assert!(!cfg.has_auth());
        assert!(!cfg.has_firestore());
    }

    #[test]
    fn test_parse_empty_object() {
        let cfg = BackendConfig::parse("{}");
        assert!(cfg.api_key.is_empty());
        assert!(cfg.auth_domain.is_none());
    }
}
