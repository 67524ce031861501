//! High-level builder API for widgets and admin consoles over HTTP

use crate::{AdminConsole, ClientConfig, HttpSupportClient, Notifier, SupportWidget, SyncConfig, WidgetEvent};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Builder for an end-user [`SupportWidget`] talking to a real server
///
/// # Example
///
/// ```rust,no_run
/// use support_chat::prelude::*;
/// use std::time::Duration;
///
/// # fn main() -> Result<()> {
/// let (widget, events) = WidgetBuilder::new()
///     .base_url("https://ctf.example.com")
///     .session_cookie("session=abc")
///     .poll_interval(Duration::from_secs(4))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct WidgetBuilder {
    client: ClientConfig,
    sync: SyncConfig,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Default for WidgetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetBuilder {
    pub fn new() -> Self {
        Self {
            client: ClientConfig::default(),
            sync: SyncConfig::default(),
            notifier: None,
        }
    }

    /// Site root the support routes hang off
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client.base_url = base_url.into();
        self
    }

    /// Raw `Cookie` header of the authenticated session
    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.client = self.client.with_session_cookie(cookie);
        self
    }

    /// Anti-forgery token already known to the caller
    pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
        self.client = self.client.with_csrf_token(token);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.sync = self.sync.with_poll_interval(interval);
        self
    }

    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.sync = self.sync.with_probe_interval(interval);
        self
    }

    pub fn target_language(mut self, language: impl Into<String>) -> Self {
        self.sync = self.sync.with_target_language(language);
        self
    }

    /// Deliver notifications somewhere other than the log
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replace the whole client configuration
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client = config;
        self
    }

    /// Replace the whole sync configuration
    pub fn sync_config(mut self, config: SyncConfig) -> Self {
        self.sync = config;
        self
    }

    /// Build the widget and the receiver its events are published on
    ///
    /// # Errors
    ///
    /// Returns an error if the session cookie is not a valid header value or
    /// the HTTP client cannot be created.
    pub fn build(self) -> Result<(SupportWidget<HttpSupportClient>, mpsc::Receiver<WidgetEvent>)> {
        let client = self
            .client
            .build_client()
            .context("Failed to create support client")?;

        let backend = Arc::new(client);
        Ok(match self.notifier {
            Some(notifier) => SupportWidget::with_notifier(backend, self.sync, notifier),
            None => SupportWidget::new(backend, self.sync),
        })
    }
}

/// Builder for an [`AdminConsole`] talking to a real server
pub struct AdminConsoleBuilder {
    client: ClientConfig,
    sync: SyncConfig,
}

impl Default for AdminConsoleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminConsoleBuilder {
    pub fn new() -> Self {
        Self {
            client: ClientConfig::default(),
            sync: SyncConfig::default(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client.base_url = base_url.into();
        self
    }

    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.client = self.client.with_session_cookie(cookie);
        self
    }

    pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
        self.client = self.client.with_csrf_token(token);
        self
    }

    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client = config;
        self
    }

    pub fn sync_config(mut self, config: SyncConfig) -> Self {
        self.sync = config;
        self
    }

    pub fn build(self) -> Result<(AdminConsole<HttpSupportClient>, mpsc::Receiver<WidgetEvent>)> {
        let client = self
            .client
            .build_client()
            .context("Failed to create support client")?;
        Ok(AdminConsole::new(Arc::new(client), self.sync))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_builder_applies_settings() {
        let (widget, _events) = WidgetBuilder::new()
            .base_url("https://ctf.example.com")
            .session_cookie("session=abc")
            .poll_interval(Duration::from_secs(2))
            .target_language("id")
            .build()
            .unwrap();

        assert_eq!(widget.config().poll_interval(), Duration::from_secs(2));
        assert_eq!(widget.config().target_language, "id");
        assert!(!widget.is_open());
    }

    #[test]
    fn test_started_widget_shuts_down() {
        let (widget, _events) = WidgetBuilder::new()
            .base_url("http://localhost:8000")
            .build()
            .unwrap();

        tokio_test::block_on(async {
            widget.start();
            assert!(widget.is_probing());
            widget.shutdown().await;
            assert!(!widget.is_probing());
            assert!(!widget.is_polling());
        });
    }

    #[test]
    fn test_invalid_cookie_is_reported() {
        let result = WidgetBuilder::new().session_cookie("bad\ncookie").build();
        let err = result.err().unwrap();
        assert!(err.to_string().contains("Failed to create support client"));
    }

    #[test]
    fn test_console_builder() {
        let (console, _events) = AdminConsoleBuilder::new()
            .base_url("http://localhost:8000")
            .csrf_token("token")
            .build()
            .unwrap();
        assert_eq!(console.ticket_id(), None);
    }
}
