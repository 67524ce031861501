// Configuration for the HTTP backend client

use crate::http::HttpSupportClient;
use anyhow::Result;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Connection settings for [`HttpSupportClient`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Site root the `/support/...` routes hang off
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Raw `Cookie` header value carrying the authenticated session
    #[serde(default, skip_serializing)]
    pub session_cookie: Option<String>,

    /// Anti-forgery token already known to the embedding page
    #[serde(default, skip_serializing)]
    pub csrf_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_cookie: None,
            csrf_token: None,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Create the HTTP client described by this configuration
    pub fn build_client(&self) -> Result<HttpSupportClient> {
        let mut builder = HttpSupportClient::builder().base_url(&self.base_url);
        if let Some(cookie) = &self.session_cookie {
            builder = builder.session_cookie(cookie);
        }
        if let Some(token) = &self.csrf_token {
            builder = builder.csrf_token(token);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.session_cookie.is_none());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let config = ClientConfig::new("https://ctf.example.com")
            .with_session_cookie("session=abc")
            .with_csrf_token("xyz");

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("ctf.example.com"));
        assert!(!json.contains("session=abc"));
        assert!(!json.contains("xyz"));
    }

    #[test]
    fn test_build_client() {
        let client = ClientConfig::new("https://ctf.example.com/")
            .with_session_cookie("session=abc")
            .build_client()
            .unwrap();
        assert_eq!(client.base_url(), "https://ctf.example.com");
    }

    #[test]
    fn test_build_client_rejects_bad_cookie() {
        let result = ClientConfig::new("https://ctf.example.com")
            .with_session_cookie("bad\ncookie")
            .build_client();
        assert!(result.is_err());
    }
}
