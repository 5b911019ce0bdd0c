//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::types::ApiBase;

/// Where the Google Identity Services SDK is loaded from.
pub const DEFAULT_IDENTITY_SCRIPT_SRC: &str = "https://accounts.google.com/gsi/client";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings shared by the HTTP pipeline and the identity bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL.
    pub api_base: ApiBase,
    /// Timeout applied to every backend request.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// OAuth client identifier for the identity provider.
    pub google_client_id: Option<String>,
    /// SDK script source.
    pub identity_script_src: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: ApiBase::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            google_client_id: None,
            identity_script_src: DEFAULT_IDENTITY_SCRIPT_SRC.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_api_base(mut self, api_base: ApiBase) -> Self {
        self.api_base = api_base;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Blank identifiers are treated as unset.
    pub fn with_google_client_id(mut self, client_id: Option<String>) -> Self {
        self.google_client_id = client_id.filter(|id| !id.trim().is_empty());
        self
    }

    pub fn with_identity_script_src(mut self, src: impl Into<String>) -> Self {
        self.identity_script_src = src.into();
        self
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_development() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base.as_str(), "http://localhost:8000/");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.google_client_id.is_none());
        assert_eq!(config.identity_script_src, DEFAULT_IDENTITY_SCRIPT_SRC);
    }

    #[test]
    fn blank_client_id_is_unset() {
        let config = ClientConfig::default().with_google_client_id(Some("  ".to_string()));
        assert!(config.google_client_id.is_none());
    }

    #[test]
    fn deserializes_partial_config() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"api_base": "https://api.example.com", "request_timeout": 3}"#,
        )
        .unwrap();
        assert_eq!(config.api_base.host(), Some("api.example.com"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }
}
