// HTTP implementation of the support backend (reqwest, form-encoded bodies)

use crate::error::{ClientError, Result};
use crate::nonce::NonceCache;
use crate::traits::{AdminBackend, TranslateBackend, WidgetBackend};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use support_chat_types::{
    AdminTicket, BroadcastTarget, ConversationSnapshot, TicketId, TicketStatus,
};

/// Support backend reached over HTTP
///
/// Session authentication rides on a cookie header; mutating calls carry the
/// session's anti-forgery token as a `nonce` form field.
#[derive(Debug)]
pub struct HttpSupportClient {
    http_client: reqwest::Client,
    base_url: String,
    nonce: NonceCache,
}

impl HttpSupportClient {
    pub fn builder() -> HttpSupportClientBuilder {
        HttpSupportClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http_client.get(self.url(path)).send().await?;
        decode(response).await
    }

    /// POST a form with the anti-forgery token attached.
    ///
    /// A 403 means the token went stale: it is refreshed and the call is
    /// repeated once.
    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send_form(path, fields).await?;
        if response.status() != StatusCode::FORBIDDEN {
            return decode(response).await;
        }

        tracing::warn!(path, "anti-forgery token refused, refreshing");
        self.nonce.invalidate().await;
        let response = self.send_form(path, fields).await?;
        decode(response).await
    }

    async fn send_form(&self, path: &str, fields: &[(&str, String)]) -> Result<reqwest::Response> {
        let nonce = self.nonce().await?;
        let mut form: Vec<(&str, String)> = fields.to_vec();
        form.push(("nonce", nonce));

        let response = self
            .http_client
            .post(self.url(path))
            .form(&form)
            .send()
            .await?;
        Ok(response)
    }

    async fn nonce(&self) -> Result<String> {
        self.nonce
            .get_or_fetch(|| async {
                let response: NonceResponse = self.get_json("/support/nonce").await?;
                Ok::<_, ClientError>(response.nonce)
            })
            .await
    }
}

/// Map a response to the error taxonomy, then decode its JSON body.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Auth);
    }

    if !status.is_success() {
        // Well-formed refusals ({"ok": false, "error": ...}) come with 4xx codes
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            if let Some(reason) = rejection_reason(&value) {
                return Err(ClientError::Rejected(reason));
            }
        }
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let value: Value = serde_json::from_str(&body)?;
    if let Some(reason) = rejection_reason(&value) {
        return Err(ClientError::Rejected(reason));
    }
    Ok(serde_json::from_value(value)?)
}

fn rejection_reason(value: &Value) -> Option<String> {
    match value.get("ok") {
        Some(Value::Bool(false)) => Some(
            value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request rejected")
                .to_string(),
        ),
        _ => None,
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl WidgetBackend for HttpSupportClient {
    async fn fetch_conversation(&self) -> Result<ConversationSnapshot> {
        self.get_json("/support/ticket").await
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        let _: Value = self
            .post_form("/support/message", &[("text", text.to_string())])
            .await?;
        Ok(())
    }

    async fn mark_read(&self) -> Result<()> {
        let _: Value = self.post_form("/support/mark_read", &[]).await?;
        Ok(())
    }

    async fn unread_count(&self) -> Result<u32> {
        let response: UnreadResponse = self.get_json("/support/unread_count").await?;
        Ok(response.unread_count)
    }
}

#[async_trait]
impl TranslateBackend for HttpSupportClient {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let response: TranslateResponse = self
            .post_form(
                "/support/translate",
                &[
                    ("text", text.to_string()),
                    ("target", target_language.to_string()),
                ],
            )
            .await?;

        // An ok response without text means nothing was translated
        Ok(response.translated.unwrap_or_else(|| text.to_string()))
    }
}

#[async_trait]
impl AdminBackend for HttpSupportClient {
    async fn fetch_ticket(&self, ticket_id: TicketId) -> Result<AdminTicket> {
        let envelope: TicketEnvelope = self
            .get_json(&format!("/support/admin/ticket/{}", ticket_id))
            .await?;
        Ok(envelope.ticket)
    }

    async fn reply(&self, ticket_id: TicketId, text: &str) -> Result<()> {
        let _: Value = self
            .post_form(
                "/support/admin/reply",
                &[
                    ("ticket_id", ticket_id.to_string()),
                    ("text", text.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn close_ticket(&self, ticket_id: TicketId) -> Result<()> {
        let _: Value = self
            .post_form("/support/admin/close", &[("ticket_id", ticket_id.to_string())])
            .await?;
        Ok(())
    }

    async fn delete_ticket(&self, ticket_id: TicketId) -> Result<()> {
        let _: Value = self
            .post_form("/support/admin/delete", &[("ticket_id", ticket_id.to_string())])
            .await?;
        Ok(())
    }

    async fn set_status(&self, ticket_id: TicketId, status: TicketStatus) -> Result<TicketStatus> {
        let response: StatusResponse = self
            .post_form(
                &format!("/support/admin/status/{}", ticket_id),
                &[("status", status.as_str().to_string())],
            )
            .await?;
        Ok(response.status)
    }

    async fn broadcast(&self, message: &str, target: &BroadcastTarget) -> Result<String> {
        let mut fields = vec![
            ("message", message.to_string()),
            ("target", target.as_form_value().to_string()),
        ];
        if let Some(team_id) = target.team_id() {
            fields.push(("team_id", team_id.to_string()));
        }

        let response: BroadcastResponse = self.post_form("/support/admin/broadcast", &fields).await?;
        Ok(response.message)
    }
}

// ============================================================================
// WIRE RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct NonceResponse {
    #[serde(default)]
    nonce: String,
}

#[derive(Debug, Deserialize)]
struct UnreadResponse {
    #[serde(default)]
    unread_count: u32,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TicketEnvelope {
    ticket: AdminTicket,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: TicketStatus,
}

#[derive(Debug, Deserialize)]
struct BroadcastResponse {
    #[serde(default)]
    message: String,
}

// ============================================================================
// BUILDER
// ============================================================================

#[derive(Debug, Default)]
pub struct HttpSupportClientBuilder {
    base_url: Option<String>,
    session_cookie: Option<String>,
    csrf_token: Option<String>,
    user_agent: Option<String>,
}

impl HttpSupportClientBuilder {
    /// Site root, e.g. "https://ctf.example.com"
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> anyhow::Result<HttpSupportClient> {
        let base_url = self.base_url.context("Base URL is required")?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = &self.session_cookie {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(cookie).context("Invalid session cookie format")?,
            );
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        let nonce = match self.csrf_token {
            Some(token) => NonceCache::with_preset(token),
            None => NonceCache::new(),
        };

        Ok(HttpSupportClient {
            http_client,
            base_url,
            nonce,
        })
    }
}
