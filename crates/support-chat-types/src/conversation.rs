use crate::message::{Message, MessageId, TicketId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Pending,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Closed => "closed",
        }
    }

    /// Whether new outbound messages are accepted
    pub fn accepts_messages(&self) -> bool {
        !matches!(self, TicketStatus::Closed)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "pending" => Ok(TicketStatus::Pending),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(format!("unknown ticket status: {}", other)),
        }
    }
}

/// Authoritative snapshot of the viewer's conversation, as returned by the
/// conversation endpoint.
///
/// `ticket_id == None` means no conversation exists yet for this viewer. In
/// that case `messages` is empty and `unread_count` is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    #[serde(default)]
    pub ticket_id: Option<TicketId>,

    #[serde(default)]
    pub status: Option<TicketStatus>,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default, rename = "unread_admin_count")]
    pub unread_count: u32,
}

impl ConversationSnapshot {
    /// Snapshot for a viewer with no conversation yet
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_ticket(ticket_id: impl Into<TicketId>, messages: Vec<Message>) -> Self {
        Self {
            ticket_id: Some(ticket_id.into()),
            status: Some(TicketStatus::Open),
            messages,
            unread_count: 0,
        }
    }

    pub fn with_unread(mut self, count: u32) -> Self {
        self.unread_count = count;
        self
    }

    pub fn exists(&self) -> bool {
        self.ticket_id.is_some()
    }

    pub fn last_message_id(&self) -> Option<MessageId> {
        self.messages.last().map(|m| m.id)
    }
}

/// Ticket owner as shown in the admin console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketUser {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
}

impl TicketUser {
    /// "Name (Team T)" when the user belongs to a team
    pub fn display_name(&self) -> String {
        match &self.team_name {
            Some(team) => format!("{} (Team {})", self.name, team),
            None => self.name.clone(),
        }
    }
}

/// Full ticket as returned by the admin ticket endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminTicket {
    pub id: TicketId,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user: Option<TicketUser>,
    pub status: TicketStatus,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl AdminTicket {
    pub fn owner_label(&self) -> String {
        self.user
            .as_ref()
            .map(|u| u.display_name())
            .unwrap_or_else(|| "Unknown User".to_string())
    }
}

/// Audience of an admin broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastTarget {
    AllUsers,
    OpenTickets,
    Team(i64),
}

impl BroadcastTarget {
    /// Form value of the `target` field
    pub fn as_form_value(&self) -> &'static str {
        match self {
            BroadcastTarget::AllUsers => "all",
            BroadcastTarget::OpenTickets => "open_tickets",
            BroadcastTarget::Team(_) => "specific_team",
        }
    }

    pub fn team_id(&self) -> Option<i64> {
        match self {
            BroadcastTarget::Team(id) => Some(*id),
            _ => None,
        }
    }
}
