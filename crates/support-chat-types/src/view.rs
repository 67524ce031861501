use crate::message::{MessageId, SenderRole};
use serde::{Deserialize, Serialize};

/// State of the per-message translate control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleControl {
    /// "Translate to English"
    Translate,
    /// "Translating..." while a request is in flight
    InProgress,
    /// "Show original"
    ShowOriginal,
    /// Control removed, translation was a no-op
    Hidden,
}

impl ToggleControl {
    pub fn label(&self) -> &'static str {
        match self {
            ToggleControl::Translate => "Translate to English",
            ToggleControl::InProgress => "Translating...",
            ToggleControl::ShowOriginal => "Show original",
            ToggleControl::Hidden => "",
        }
    }
}

/// One row of the rendered message list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub id: MessageId,
    pub role: SenderRole,
    pub author: String,
    pub timestamp: String,
    pub text: String,
    /// Highlighted as arrived since the previous render
    pub is_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translate: Option<ToggleControl>,
}

/// Complete replacement of the displayed message list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedView {
    pub messages: Vec<RenderedMessage>,
}

impl RenderedView {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn get(&self, id: MessageId) -> Option<&RenderedMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: MessageId) -> Option<&mut RenderedMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    pub fn new_ids(&self) -> Vec<MessageId> {
        self.messages.iter().filter(|m| m.is_new).map(|m| m.id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Inline status text under the input row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: StatusKind::Info }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: StatusKind::Success }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: StatusKind::Error }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// A user-facing system notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Notifications with the same tag replace each other
    pub tag: String,
}

impl Notification {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            title: "Support Chat".to_string(),
            body: body.into(),
            tag: "support-chat".to_string(),
        }
    }
}

/// Badge text for an unread count, `None` when the badge is hidden
pub fn badge_label(count: u32) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".to_string()),
    }
}
