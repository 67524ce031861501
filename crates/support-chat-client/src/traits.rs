use crate::error::Result;
use async_trait::async_trait;
use support_chat_types::{AdminTicket, BroadcastTarget, ConversationSnapshot, TicketId, TicketStatus};

/// Backend calls made by the end-user widget
///
/// All calls act on the conversation of the authenticated session.
#[async_trait]
pub trait WidgetBackend: Send + Sync {
    /// Fetch the authoritative conversation snapshot
    async fn fetch_conversation(&self) -> Result<ConversationSnapshot>;

    /// Post a message, creating the conversation if none exists
    async fn send_message(&self, text: &str) -> Result<()>;

    /// Acknowledge all admin messages up to now
    async fn mark_read(&self) -> Result<()>;

    /// Lightweight unread probe, no message bodies
    async fn unread_count(&self) -> Result<u32>;
}

/// Translation service boundary
///
/// Pure function of its inputs, so callers may cache per (text, target).
#[async_trait]
pub trait TranslateBackend: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Backend calls made by the admin console
#[async_trait]
pub trait AdminBackend: Send + Sync {
    async fn fetch_ticket(&self, ticket_id: TicketId) -> Result<AdminTicket>;

    async fn reply(&self, ticket_id: TicketId, text: &str) -> Result<()>;

    async fn close_ticket(&self, ticket_id: TicketId) -> Result<()>;

    async fn delete_ticket(&self, ticket_id: TicketId) -> Result<()>;

    async fn set_status(&self, ticket_id: TicketId, status: TicketStatus) -> Result<TicketStatus>;

    /// Send one admin message to many users, returns the server's summary line
    async fn broadcast(&self, message: &str, target: &BroadcastTarget) -> Result<String>;
}

/// Convenience trait for backends serving both the widget and the console
pub trait SupportBackend: WidgetBackend + AdminBackend + TranslateBackend {}

impl<T: WidgetBackend + AdminBackend + TranslateBackend> SupportBackend for T {}
