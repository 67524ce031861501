//! Offline backends for `--demo`

use std::sync::Arc;
use std::time::Duration;
use support_chat::sync::testing::MockBackend;
use support_chat::types::{AdminTicket, Message, TicketId, TicketStatus, TicketUser};
use tokio::task::JoinHandle;

const DEMO_REPLIES: &[&str] = &[
    "Thanks, we are looking into it.",
    "Mohon tunggu sebentar, kami sedang memeriksa.",
    "The challenge has been restarted, please try again.",
];

/// Conversation with one earlier exchange
pub fn widget_backend() -> Arc<MockBackend> {
    let backend = MockBackend::with_conversation(vec![
        Message::user(1, "Is the scoreboard frozen?").with_created("2025-03-01T18:00:00+08:00"),
        Message::admin(2, "Not yet, it freezes one hour before the end.")
            .with_created("2025-03-01T18:02:00+08:00"),
    ]);
    backend.add_translation(
        "Mohon tunggu sebentar, kami sedang memeriksa.",
        "Please wait a moment, we are checking.",
    );
    Arc::new(backend)
}

/// Staff answering every `every` so the badge and polling have something to show
pub fn spawn_admin_replies(backend: Arc<MockBackend>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        for reply in DEMO_REPLIES.iter().cycle() {
            tokio::time::sleep(every).await;
            let id = backend.push_admin_message(reply);
            tracing::debug!(message_id = %id, "Demo admin replied");
        }
    })
}

/// One open ticket from a player writing in Indonesian
pub fn admin_backend() -> Arc<MockBackend> {
    let backend = MockBackend::with_ticket(AdminTicket {
        id: TicketId(1),
        user_id: Some(7),
        user: Some(TicketUser {
            id: 7,
            name: "dimas".to_string(),
            email: Some("dimas@example.com".to_string()),
            team_name: Some("Garuda".to_string()),
        }),
        status: TicketStatus::Open,
        created: Some("2025-03-01T18:00:00+08:00".to_string()),
        updated: None,
        messages: vec![Message::user(1, "saya tidak bisa submit flag untuk soal web")
            .with_sender("dimas", Some("Garuda".to_string()))
            .with_created("2025-03-01T18:00:00+08:00")],
    });
    backend.add_translation(
        "saya tidak bisa submit flag untuk soal web",
        "I cannot submit the flag for the web challenge",
    );
    Arc::new(backend)
}
