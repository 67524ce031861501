//! # Support Chat - polling support widget engine
//!
//! Keeps a support conversation in sync with a server that only speaks plain
//! request/response HTTP:
//! - **Polling sync** of the open conversation with a never-regressing cursor
//! - **Unread badge** and system notifications while the panel is closed
//! - **Translation overlay** with local revert
//! - **Admin console** for replying to, closing and deleting tickets
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use support_chat::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let (widget, mut events) = WidgetBuilder::new()
//!         .base_url("https://ctf.example.com")
//!         .session_cookie("session=...")
//!         .build()?;
//!
//!     widget.start();
//!     widget.open().await;
//!     widget.send("My flag for web-200 is rejected").await?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **support-chat-types**: Messages, snapshots, rendered views and events
//! - **support-chat-client**: Backend traits and the HTTP client
//! - **support-chat-sync**: Cursor, renderer, scheduler, notifications,
//!   translation overlay, and the widget and console built from them

// Re-export all public APIs
pub use support_chat_client as client;
pub use support_chat_sync as sync;
pub use support_chat_types as types;

// Re-export commonly used types
pub use support_chat_client::{ClientConfig, ClientError, HttpSupportClient};
pub use support_chat_sync::{AdminConsole, Notifier, SupportWidget};
pub use support_chat_types::{Message, MessageId, SyncConfig, TicketId, WidgetEvent};

/// High-level builders for widgets and consoles
pub mod builder;

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::{AdminConsoleBuilder, WidgetBuilder};
    pub use crate::types::{
        BroadcastTarget, MessageId, RenderedView, StatusLine, SyncConfig, TicketId, TicketStatus,
        WidgetEvent,
    };
    pub use anyhow::Result;
}
