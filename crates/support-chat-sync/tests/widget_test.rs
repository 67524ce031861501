use std::sync::{Arc, Mutex};
use std::time::Duration;
use support_chat_client::ClientError;
use support_chat_sync::testing::{self, MockBackend};
use support_chat_sync::widget::{
    DEFAULT_HINT, EMPTY_STATE_TEXT, LOGIN_REQUIRED, MARK_READ_FAILED, SEND_FAILED,
};
use support_chat_sync::{Notifier, SupportWidget};
use support_chat_types::{
    ConversationSnapshot, Message, MessageId, Notification, StatusLine, SyncConfig, ToggleControl,
    WidgetEvent,
};
use tokio::sync::mpsc;

#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn bodies(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|n| n.body.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen.lock().unwrap().push(notification.clone());
    }
}

struct Harness {
    backend: Arc<MockBackend>,
    widget: SupportWidget<MockBackend>,
    events: mpsc::Receiver<WidgetEvent>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(backend: MockBackend) -> Harness {
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::default());
    let (widget, events) =
        SupportWidget::with_notifier(backend.clone(), SyncConfig::default(), notifier.clone());
    Harness {
        backend,
        widget,
        events,
        notifier,
    }
}

fn drain(events: &mut mpsc::Receiver<WidgetEvent>) -> Vec<WidgetEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

fn rendered_views(events: &[WidgetEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, WidgetEvent::ViewRendered { .. }))
        .count()
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

async fn wait_for_calls(backend: &MockBackend, operation: &str, calls: usize) {
    for _ in 0..100 {
        if backend.calls(operation) >= calls {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("{} never reached {} calls", operation, calls);
}

fn existing_conversation() -> MockBackend {
    MockBackend::with_conversation(vec![
        Message::user(1, "my flag is rejected"),
        Message::admin(2, "which challenge?"),
    ])
}

#[tokio::test(start_paused = true)]
async fn test_no_conversation_shows_empty_state_and_never_probes() {
    let mut h = harness(MockBackend::new());

    h.widget.open().await;
    let events = drain(&mut h.events);
    assert!(events.contains(&WidgetEvent::PanelToggled { open: true }));
    assert!(events.contains(&WidgetEvent::EmptyState {
        text: EMPTY_STATE_TEXT.to_string()
    }));
    assert_eq!(h.widget.badge(), 0);
    assert!(h.widget.is_polling());
    assert!(!h.widget.cursor().conversation_exists());

    h.widget.close().await;
    assert!(!h.widget.is_polling());
    h.widget.probe_once().await;
    assert_eq!(h.backend.calls(testing::UNREAD), 0);
    assert_eq!(h.backend.calls(testing::MARK_READ), 0);
    assert!(h.notifier.bodies().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_first_send_creates_conversation() {
    let h = harness(MockBackend::new());
    h.widget.open().await;

    h.widget.send("   ").await.unwrap();
    assert_eq!(h.backend.calls(testing::SEND), 0);

    h.widget.send("  hello support  ").await.unwrap();
    assert_eq!(h.backend.calls(testing::SEND), 1);
    assert!(h.widget.cursor().conversation_exists());
    assert_eq!(h.widget.status().text, DEFAULT_HINT);

    let view = h.widget.view();
    assert_eq!(view.len(), 1);
    assert_eq!(view.messages[0].text, "hello support");
    assert_eq!(view.messages[0].author, "You");
}

#[tokio::test(start_paused = true)]
async fn test_admin_message_while_closed_notifies_once() {
    let mut h = harness(existing_conversation());
    h.widget.load().await.unwrap();
    assert_eq!(h.widget.badge(), 0);
    drain(&mut h.events);

    let reply = h.backend.push_admin_message("try the second flag format");
    h.widget.probe_once().await;
    h.widget.probe_once().await;

    assert_eq!(h.notifier.bodies(), vec!["You have 1 new message from admin".to_string()]);
    assert_eq!(h.widget.badge(), 1);
    let events = drain(&mut h.events);
    assert!(events.contains(&WidgetEvent::BadgeChanged {
        count: 1,
        label: Some("1".to_string())
    }));

    h.widget.open().await;
    assert_eq!(h.widget.badge(), 0);
    assert!(h.widget.view().get(reply).is_some());
    assert_eq!(h.widget.cursor().high_water_mark(), Some(reply));

    // Acknowledged on the server shortly after opening
    assert_eq!(h.backend.calls(testing::MARK_READ), 0);
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    settle().await;
    assert_eq!(h.backend.calls(testing::MARK_READ), 1);
    assert_eq!(h.backend.conversation().unread_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_probe_notifies_on_increases_only() {
    let h = harness(existing_conversation());
    h.widget.load().await.unwrap();

    h.backend.script_unread([0, 2, 2, 5, 5]);
    for _ in 0..5 {
        h.widget.probe_once().await;
    }

    assert_eq!(
        h.notifier.bodies(),
        vec![
            "You have 2 new messages from admin".to_string(),
            "You have 3 new messages from admin".to_string(),
        ]
    );
    assert_eq!(h.widget.badge(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_probe_is_idle_while_open() {
    let h = harness(existing_conversation());
    h.widget.open().await;
    h.widget.probe_once().await;
    assert_eq!(h.backend.calls(testing::UNREAD), 0);
}

#[tokio::test(start_paused = true)]
async fn test_mark_read_wins_over_stale_probe() {
    let h = harness(existing_conversation());
    h.widget.load().await.unwrap();

    let gate = h.backend.hold(testing::UNREAD);
    h.backend.script_unread([3]);
    let widget = h.widget.clone();
    let probe = tokio::spawn(async move { widget.probe_once().await });
    wait_for_calls(&h.backend, testing::UNREAD, 1).await;

    h.widget.mark_read().await.unwrap();
    assert_eq!(h.widget.badge(), 0);

    gate.release();
    probe.await.unwrap();

    assert_eq!(h.widget.badge(), 0);
    assert!(h.notifier.bodies().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_mark_read_wins_over_stale_poll() {
    let h = harness(existing_conversation());
    h.widget.load().await.unwrap();

    let gate = h.backend.hold(testing::FETCH);
    let widget = h.widget.clone();
    let poll = tokio::spawn(async move { widget.poll_once().await });
    wait_for_calls(&h.backend, testing::FETCH, 2).await;

    h.widget.mark_read().await.unwrap();
    let reply = h.backend.push_admin_message("fixed, please retry");

    gate.release();
    poll.await.unwrap();

    // The list still updates; only the stale count is dropped
    assert!(h.widget.view().get(reply).is_some());
    assert_eq!(h.widget.badge(), 0);
    assert!(h.notifier.bodies().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_probe_while_acknowledging_does_not_renotify() {
    let h = harness(existing_conversation());
    h.widget.load().await.unwrap();
    h.backend.push_admin_message("found the issue");
    h.backend.push_admin_message("please retry now");
    h.widget.probe_once().await;
    assert_eq!(
        h.notifier.bodies(),
        vec!["You have 2 new messages from admin".to_string()]
    );

    let gate = h.backend.hold(testing::MARK_READ);
    let widget = h.widget.clone();
    let ack = tokio::spawn(async move { widget.mark_read().await });
    wait_for_calls(&h.backend, testing::MARK_READ, 1).await;
    assert_eq!(h.widget.badge(), 0);

    // The server has not reset its count yet and still answers 2
    h.widget.probe_once().await;
    assert_eq!(h.backend.calls(testing::UNREAD), 2);
    assert_eq!(h.widget.badge(), 0);
    assert_eq!(h.notifier.bodies().len(), 1);

    gate.release();
    ack.await.unwrap().unwrap();
    h.widget.probe_once().await;
    assert_eq!(h.widget.badge(), 0);
    assert_eq!(h.notifier.bodies().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_mark_read_sets_status_and_stays_quiet() {
    let mut h = harness(existing_conversation());
    h.widget.load().await.unwrap();
    h.backend.push_admin_message("found the issue");
    h.widget.probe_once().await;
    assert_eq!(h.notifier.bodies().len(), 1);
    drain(&mut h.events);

    h.backend.fail_next(
        testing::MARK_READ,
        ClientError::Status {
            status: 500,
            body: "oops".to_string(),
        },
    );
    h.widget.mark_read().await.unwrap_err();
    assert_eq!(h.widget.status().text, MARK_READ_FAILED);
    assert!(h.widget.status().is_error());
    assert!(drain(&mut h.events).contains(&WidgetEvent::Status(StatusLine::error(MARK_READ_FAILED))));

    // Still unread on the server: the badge comes back without a second alert
    h.widget.probe_once().await;
    assert_eq!(h.widget.badge(), 1);
    assert_eq!(h.notifier.bodies().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_high_water_mark_tracks_max_id() {
    let h = harness(existing_conversation());
    h.widget.load().await.unwrap();
    assert_eq!(h.widget.cursor().high_water_mark(), Some(MessageId(2)));

    let mut last = MessageId(2);
    for text in ["one", "two", "three"] {
        last = h.backend.push_admin_message(text);
        h.widget.poll_once().await;
        assert_eq!(h.widget.cursor().high_water_mark(), Some(last));
    }
    assert_eq!(last, MessageId(5));
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_behind_cursor_is_dropped() {
    let h = harness(existing_conversation());
    h.widget.load().await.unwrap();
    let before = h.widget.view();

    h.backend.script_fetch(Ok(ConversationSnapshot::with_ticket(
        1,
        vec![Message::user(1, "my flag is rejected")],
    )));
    h.widget.load().await.unwrap();

    assert_eq!(h.widget.view(), before);
    assert_eq!(h.widget.cursor().high_water_mark(), Some(MessageId(2)));
}

#[tokio::test(start_paused = true)]
async fn test_reload_renders_identically() {
    let mut h = harness(existing_conversation());
    h.widget.load().await.unwrap();
    let first = drain(&mut h.events);
    h.widget.load().await.unwrap();
    let second = drain(&mut h.events);

    assert_eq!(rendered_views(&first), 1);
    assert_eq!(first, second);
    assert_eq!(h.widget.view().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_poll_renders_only_on_change_and_highlights_new() {
    let mut h = harness(existing_conversation());
    h.widget.open().await;
    drain(&mut h.events);

    h.widget.poll_once().await;
    assert_eq!(rendered_views(&drain(&mut h.events)), 0);

    let reply = h.backend.push_admin_message("new hint posted");
    h.widget.poll_once().await;
    let events = drain(&mut h.events);
    assert_eq!(rendered_views(&events), 1);
    assert_eq!(h.widget.view().new_ids(), vec![reply]);

    // Panel is open: no notification
    assert!(h.notifier.bodies().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_polling_but_in_flight_fetch_applies() {
    let h = harness(existing_conversation());
    h.widget.open().await;
    assert_eq!(h.backend.calls(testing::FETCH), 1);

    let gate = h.backend.hold(testing::FETCH);
    tokio::time::sleep(Duration::from_millis(4_000)).await;
    wait_for_calls(&h.backend, testing::FETCH, 2).await;

    h.widget.close().await;
    assert!(!h.widget.is_polling());

    let reply = h.backend.push_admin_message("did that work?");
    gate.release();
    settle().await;

    assert!(h.widget.view().get(reply).is_some());
    assert_eq!(
        h.notifier.bodies(),
        vec!["Admin replied to your support ticket".to_string()]
    );
    assert_eq!(h.widget.badge(), 1);

    h.backend.unhold(testing::FETCH);
    tokio::time::sleep(Duration::from_secs(20)).await;
    settle().await;
    assert_eq!(h.backend.calls(testing::FETCH), 2);
}

#[tokio::test(start_paused = true)]
async fn test_polling_ticks_while_open() {
    let h = harness(existing_conversation());
    h.widget.open().await;

    tokio::time::sleep(Duration::from_millis(8_100)).await;
    settle().await;
    assert_eq!(h.backend.calls(testing::FETCH), 3);
}

#[tokio::test(start_paused = true)]
async fn test_polling_starts_before_first_load_answers() {
    let h = harness(existing_conversation());
    let gate = h.backend.hold(testing::FETCH);
    let widget = h.widget.clone();
    let open = tokio::spawn(async move { widget.open().await });
    wait_for_calls(&h.backend, testing::FETCH, 1).await;
    assert!(h.widget.is_polling());

    tokio::time::sleep(Duration::from_millis(4_100)).await;
    settle().await;
    assert_eq!(h.backend.calls(testing::FETCH), 2);

    gate.release();
    gate.release();
    open.await.unwrap();
    assert!(h.widget.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_start_probes_after_initial_delay_then_periodically() {
    let h = harness(existing_conversation());
    h.backend.push_admin_message("are you there?");
    h.widget.start();
    assert!(h.widget.is_probing());

    tokio::time::sleep(Duration::from_millis(1_900)).await;
    settle().await;
    assert_eq!(h.backend.calls(testing::UNREAD), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    settle().await;
    assert_eq!(h.backend.calls(testing::UNREAD), 1);
    assert_eq!(h.notifier.bodies(), vec!["You have 1 new message from admin".to_string()]);

    tokio::time::sleep(Duration::from_millis(13_000)).await;
    settle().await;
    assert_eq!(h.backend.calls(testing::UNREAD), 2);
    assert_eq!(h.notifier.bodies().len(), 1);

    h.widget.shutdown().await;
    assert!(!h.widget.is_probing());
    tokio::time::sleep(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(h.backend.calls(testing::UNREAD), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unauthenticated_session_disables_support() {
    let mut h = harness(existing_conversation());
    h.backend.script_fetch(Err(ClientError::Auth));

    h.widget.open().await;
    let events = drain(&mut h.events);
    assert!(events.contains(&WidgetEvent::AuthRequired {
        text: LOGIN_REQUIRED.to_string()
    }));
    assert_eq!(h.widget.status().text, LOGIN_REQUIRED);
    assert!(h.widget.is_auth_required());
    assert!(!h.widget.is_polling());

    h.widget.close().await;
    h.widget.probe_once().await;
    assert_eq!(h.backend.calls(testing::UNREAD), 0);

    // Not retried
    assert!(h.widget.load().await.unwrap_err().is_auth());
    assert_eq!(h.backend.calls(testing::FETCH), 1);
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_sets_status() {
    let h = harness(existing_conversation());
    h.widget.open().await;

    h.backend
        .fail_next(testing::SEND, ClientError::Rejected("Ticket is closed".to_string()));
    let err = h.widget.send("still there?").await.unwrap_err();
    assert!(err.is_rejected());
    assert_eq!(h.widget.status().text, SEND_FAILED);
    assert!(h.widget.status().is_error());

    h.backend.fail_next(
        testing::SEND,
        ClientError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        },
    );
    h.widget.send("still there?").await.unwrap_err();
    assert_eq!(h.widget.status().text, SEND_FAILED);

    // Control is usable again
    h.widget.send("still there?").await.unwrap();
    assert_eq!(h.widget.status().text, DEFAULT_HINT);
    assert_eq!(h.widget.view().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_leaves_state_unchanged() {
    let h = harness(existing_conversation());
    h.widget.load().await.unwrap();
    let before = h.widget.view();

    h.backend.fail_next(
        testing::FETCH,
        ClientError::Status {
            status: 500,
            body: "oops".to_string(),
        },
    );
    h.widget.poll_once().await;

    assert_eq!(h.widget.view(), before);
    assert_eq!(h.widget.cursor().high_water_mark(), Some(MessageId(2)));
}

fn foreign_conversation() -> MockBackend {
    let backend = MockBackend::with_conversation(vec![
        Message::user(1, "terima kasih"),
        Message::admin(2, "you're welcome"),
    ]);
    backend.add_translation("terima kasih", "thank you");
    backend
}

#[tokio::test(start_paused = true)]
async fn test_translate_revert_translate_calls_once() {
    let h = harness(foreign_conversation());
    h.widget.load().await.unwrap();
    let id = MessageId(1);
    assert_eq!(h.widget.view().get(id).unwrap().translate, Some(ToggleControl::Translate));
    assert_eq!(h.widget.view().get(MessageId(2)).unwrap().translate, None);

    h.widget.toggle_translation(id).await;
    assert_eq!(h.widget.view().get(id).unwrap().text, "thank you");
    assert_eq!(h.widget.view().get(id).unwrap().translate, Some(ToggleControl::ShowOriginal));

    h.widget.toggle_translation(id).await;
    assert_eq!(h.widget.view().get(id).unwrap().text, "terima kasih");

    h.widget.toggle_translation(id).await;
    assert_eq!(h.widget.view().get(id).unwrap().text, "thank you");
    assert_eq!(h.backend.calls(testing::TRANSLATE), 1);

    // Survives a re-render
    h.widget.load().await.unwrap();
    assert_eq!(h.widget.view().get(id).unwrap().text, "thank you");
}

#[tokio::test(start_paused = true)]
async fn test_toggle_during_flight_is_ignored() {
    let h = harness(foreign_conversation());
    h.widget.load().await.unwrap();
    let id = MessageId(1);

    let gate = h.backend.hold(testing::TRANSLATE);
    let widget = h.widget.clone();
    let first = tokio::spawn(async move { widget.toggle_translation(id).await });
    wait_for_calls(&h.backend, testing::TRANSLATE, 1).await;

    assert_eq!(h.widget.view().get(id).unwrap().translate, Some(ToggleControl::InProgress));
    h.widget.toggle_translation(id).await;
    assert_eq!(h.backend.calls(testing::TRANSLATE), 1);

    gate.release();
    first.await.unwrap();
    assert_eq!(h.widget.view().get(id).unwrap().text, "thank you");
    assert_eq!(h.backend.calls(testing::TRANSLATE), 1);
}

#[tokio::test(start_paused = true)]
async fn test_translation_failure_keeps_original() {
    let h = harness(foreign_conversation());
    h.widget.load().await.unwrap();
    let id = MessageId(1);

    h.backend.fail_next(
        testing::TRANSLATE,
        ClientError::Status {
            status: 503,
            body: "unavailable".to_string(),
        },
    );
    h.widget.toggle_translation(id).await;

    let message = h.widget.view().get(id).cloned().unwrap();
    assert_eq!(message.text, "terima kasih");
    assert_eq!(message.translate, Some(ToggleControl::Translate));
    assert!(!h.widget.translation(id).unwrap().in_flight);
}

#[tokio::test(start_paused = true)]
async fn test_untranslatable_text_hides_control() {
    let h = harness(MockBackend::with_conversation(vec![Message::user(1, "ada")]));
    h.widget.load().await.unwrap();

    h.widget.toggle_translation(MessageId(1)).await;
    let message = h.widget.view().get(MessageId(1)).cloned().unwrap();
    assert_eq!(message.translate, Some(ToggleControl::Hidden));
    assert_eq!(message.text, "ada");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_clears_overlay() {
    let h = harness(foreign_conversation());
    h.widget.load().await.unwrap();
    h.widget.toggle_translation(MessageId(1)).await;
    assert!(h.widget.translation(MessageId(1)).is_some());

    h.widget.shutdown().await;
    assert!(h.widget.translation(MessageId(1)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_translation_finishing_after_shutdown_is_dropped() {
    let mut h = harness(foreign_conversation());
    h.widget.load().await.unwrap();
    let id = MessageId(1);

    let gate = h.backend.hold(testing::TRANSLATE);
    let widget = h.widget.clone();
    let toggle = tokio::spawn(async move { widget.toggle_translation(id).await });
    wait_for_calls(&h.backend, testing::TRANSLATE, 1).await;

    h.widget.shutdown().await;
    drain(&mut h.events);
    gate.release();
    toggle.await.unwrap();

    assert!(h.widget.translation(id).is_none());
    let translated = drain(&mut h.events).into_iter().any(|event| {
        matches!(event, WidgetEvent::TranslationChanged { ref text, .. } if text == "thank you")
    });
    assert!(!translated);
}
