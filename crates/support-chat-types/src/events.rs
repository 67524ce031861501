use crate::message::{MessageId, TicketId};
use crate::view::{Notification, RenderedView, StatusLine, ToggleControl};
use serde::{Deserialize, Serialize};

/// Everything a widget or admin console wants a shell to draw.
///
/// Events are emitted in the order the state changed. A `ViewRendered` event
/// always carries the complete list; shells replace what they show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetEvent {
    /// Panel opened or closed
    PanelToggled {
        open: bool,
    },

    /// Message list replaced from an authoritative snapshot
    ViewRendered {
        view: RenderedView,
        #[serde(skip_serializing_if = "Option::is_none")]
        high_water_mark: Option<MessageId>,
    },

    /// No conversation exists yet
    EmptyState {
        text: String,
    },

    /// Unread badge changed
    BadgeChanged {
        count: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },

    /// System notification should be surfaced
    Notification(Notification),

    /// Inline status text changed
    Status(StatusLine),

    /// One message's displayed text or translate control changed
    TranslationChanged {
        message_id: MessageId,
        text: String,
        control: ToggleControl,
    },

    /// Ticket header changed (admin console)
    TicketLoaded {
        ticket_id: TicketId,
        owner: String,
        status: String,
    },

    /// Ticket removed (admin console)
    TicketDeleted {
        ticket_id: TicketId,
    },

    /// Session is not authenticated, support is unavailable
    AuthRequired {
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = WidgetEvent::BadgeChanged { count: 3, label: Some("3".into()) };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"badge_changed\""));

        let event = WidgetEvent::Notification(Notification::new("hi"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"notification\""));
        assert!(json.contains("Support Chat"));
    }
}
