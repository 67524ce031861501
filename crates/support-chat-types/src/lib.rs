pub mod config;
pub mod conversation;
pub mod events;
pub mod message;
pub mod view;

pub use config::SyncConfig;
pub use conversation::{AdminTicket, BroadcastTarget, ConversationSnapshot, TicketStatus, TicketUser};
pub use events::WidgetEvent;
pub use message::{Message, MessageId, SenderRole, TicketId};
pub use view::{
    badge_label, Notification, RenderedMessage, RenderedView, StatusKind, StatusLine, ToggleControl,
};
