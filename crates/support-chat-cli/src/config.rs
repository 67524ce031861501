use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use support_chat::{ClientConfig, SyncConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub sync: SyncConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub session_cookie: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSection {
    pub base_url: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            base_url: ClientConfig::default().base_url,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed with SUPPORT_ (nested keys use `__`,
    ///    e.g. SUPPORT_SYNC__POLL_INTERVAL_MS)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("SUPPORT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Secrets never live in the TOML files
        cfg.session_cookie = std::env::var("SUPPORT_SESSION_COOKIE").ok();
        cfg.csrf_token = std::env::var("SUPPORT_CSRF_TOKEN").ok();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Connection settings for the HTTP client, secrets included
    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig::new(self.client.base_url.clone());
        if let Some(cookie) = &self.session_cookie {
            client = client.with_session_cookie(cookie.clone());
        }
        if let Some(token) = &self.csrf_token {
            client = client.with_csrf_token(token.clone());
        }
        if let Some(user_agent) = &self.client.user_agent {
            client = client.with_user_agent(user_agent.clone());
        }
        client
    }
}
