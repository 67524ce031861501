use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned message identifier.
///
/// Only the ordering of identifiers is relied upon; gaps are expected
/// (deleted tickets, other conversations interleaving on the same sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Opaque ticket identifier for a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub i64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TicketId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    /// End-user who owns the ticket
    User,
    /// Support staff
    Admin,
}

impl SenderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderRole::User => "user",
            SenderRole::Admin => "admin",
        }
    }
}

/// A single message of a support conversation, as the server sends it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,

    pub sender_role: SenderRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<i64>,

    #[serde(default)]
    pub text: String,

    /// ISO-8601 timestamp, already converted to the display timezone by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_team: Option<String>,
}

impl Message {
    pub fn new(id: impl Into<MessageId>, sender_role: SenderRole, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ticket_id: None,
            sender_role,
            sender_id: None,
            text: text.into(),
            created: None,
            sender_name: None,
            sender_team: None,
        }
    }

    /// Create a message authored by the end-user
    pub fn user(id: impl Into<MessageId>, text: impl Into<String>) -> Self {
        Self::new(id, SenderRole::User, text)
    }

    /// Create a message authored by support staff
    pub fn admin(id: impl Into<MessageId>, text: impl Into<String>) -> Self {
        Self::new(id, SenderRole::Admin, text)
    }

    pub fn with_created(mut self, created: impl Into<String>) -> Self {
        self.created = Some(created.into());
        self
    }

    pub fn with_sender(mut self, name: impl Into<String>, team: Option<String>) -> Self {
        self.sender_name = Some(name.into());
        self.sender_team = team;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.sender_role == SenderRole::Admin
    }

    /// Parse the creation timestamp.
    ///
    /// Accepts RFC 3339 with an offset, or a naive `YYYY-MM-DDTHH:MM:SS[.f]`
    /// which is taken as already being display-local (offset zero).
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.created.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt);
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()?;
        let utc = FixedOffset::east_opt(0)?;
        naive.and_local_timezone(utc).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_message_wire_format() {
        let json = r#"{
            "id": 7,
            "ticket_id": 3,
            "sender_role": "admin",
            "sender_id": 1,
            "text": "Hello there",
            "created": "2025-03-01T18:30:00+08:00"
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, MessageId(7));
        assert_eq!(msg.ticket_id, Some(TicketId(3)));
        assert!(msg.is_admin());
        assert_eq!(msg.sender_name, None);
    }

    #[test]
    fn test_created_at_with_offset() {
        let msg = Message::user(1, "hi").with_created("2025-03-01T18:30:00+08:00");
        let dt = msg.created_at().unwrap();
        assert_eq!(dt.hour(), 18);
        assert_eq!(dt.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_created_at_naive() {
        let msg = Message::user(1, "hi").with_created("2025-03-01T09:05:00.123456");
        let dt = msg.created_at().unwrap();
        assert_eq!(dt.minute(), 5);
    }

    #[test]
    fn test_created_at_garbage() {
        let msg = Message::user(1, "hi").with_created("yesterday");
        assert!(msg.created_at().is_none());
        assert!(Message::user(2, "hi").created_at().is_none());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let json = r#"{"id": 1, "sender_role": "bot", "text": "x"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }
}
