use crate::cursor::{FetchSeq, SyncCursor};
use crate::lock;
use crate::notify::{Generation, LogNotifier, NotificationCenter, Notifier, UnreadOutcome, UnreadSource};
use crate::render::{DeltaRenderer, Perspective};
use crate::scheduler::PollScheduler;
use crate::translate::{run_toggle, OverlayHost, TranslationEntry, TranslationOverlay};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use support_chat_client::{ClientError, TranslateBackend, WidgetBackend};
use support_chat_types::{
    badge_label, ConversationSnapshot, MessageId, RenderedView, StatusLine, SyncConfig, WidgetEvent,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_HINT: &str = "Ask your questions, admin will reply here.";
pub const EMPTY_STATE_TEXT: &str = "Start a conversation. Your messages appear here.";
pub const LOGIN_REQUIRED: &str = "Please log in to use support.";
pub const SEND_FAILED: &str = "Failed to send. Try again.";
pub const SEND_FAILED_NETWORK: &str = "Failed to send (network).";
pub const LOAD_FAILED: &str = "Failed to load messages.";
pub const MARK_READ_FAILED: &str = "Failed to mark messages as read.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPurpose {
    /// Explicit load, always re-renders
    Load,
    /// Timer tick, re-renders only when the list changed
    Poll,
}

impl FetchPurpose {
    fn as_str(&self) -> &'static str {
        match self {
            FetchPurpose::Load => "load",
            FetchPurpose::Poll => "poll",
        }
    }
}

struct WidgetState {
    panel_open: bool,
    auth_required: bool,
    sending: bool,
    cursor: SyncCursor,
    view: RenderedView,
    notifications: NotificationCenter,
    overlay: TranslationOverlay,
    status: StatusLine,
}

impl WidgetState {
    fn new(target_language: &str) -> Self {
        Self {
            panel_open: false,
            auth_required: false,
            sending: false,
            cursor: SyncCursor::new(),
            view: RenderedView::default(),
            notifications: NotificationCenter::new(),
            overlay: TranslationOverlay::new(target_language),
            status: StatusLine::info(DEFAULT_HINT),
        }
    }

    /// Apply a fetched snapshot and collect the events it produces
    fn apply_snapshot(
        &mut self,
        renderer: &DeltaRenderer,
        seq: FetchSeq,
        generation: Generation,
        purpose: FetchPurpose,
        snapshot: ConversationSnapshot,
    ) -> Vec<WidgetEvent> {
        if self.cursor.is_stale(seq) {
            tracing::debug!(seq, purpose = purpose.as_str(), "dropping out-of-order response");
            return Vec::new();
        }
        if let Some(last) = snapshot.last_message_id() {
            if self.cursor.would_regress(last) {
                tracing::debug!(seq, last = %last, "dropping response behind the cursor");
                return Vec::new();
            }
        }
        self.cursor.accept(seq, &snapshot);

        let mut events = Vec::new();
        let last = snapshot.last_message_id();

        if last.is_none() {
            if purpose == FetchPurpose::Load {
                self.view = RenderedView::default();
                events.push(WidgetEvent::EmptyState {
                    text: EMPTY_STATE_TEXT.to_string(),
                });
            }
            return events;
        }

        if purpose == FetchPurpose::Poll && last == self.cursor.high_water_mark() {
            return events;
        }

        let highlight = purpose == FetchPurpose::Poll;
        let (high_water_mark, mut view) =
            renderer.render(&snapshot.messages, self.cursor.high_water_mark(), highlight);
        self.cursor.advance(high_water_mark);
        self.overlay.apply_to(&mut view);
        self.view = view.clone();
        tracing::debug!(
            purpose = purpose.as_str(),
            messages = view.len(),
            high_water_mark = ?high_water_mark,
            "conversation rendered"
        );
        events.push(WidgetEvent::ViewRendered { view, high_water_mark });

        if !self.panel_open {
            let source = match purpose {
                FetchPurpose::Load => UnreadSource::Load,
                FetchPurpose::Poll => UnreadSource::Poll,
            };
            let outcome = self.notifications.observe(snapshot.unread_count, source, generation);
            events.extend(unread_events(outcome));
        }

        events
    }
}

fn unread_events(outcome: UnreadOutcome) -> Vec<WidgetEvent> {
    let mut events = Vec::new();
    if let Some(count) = outcome.badge {
        events.push(WidgetEvent::BadgeChanged {
            count,
            label: badge_label(count),
        });
    }
    if let Some(notification) = outcome.notification {
        events.push(WidgetEvent::Notification(notification));
    }
    events
}

struct WidgetInner<B: ?Sized> {
    backend: Arc<B>,
    config: SyncConfig,
    renderer: DeltaRenderer,
    notifier: Arc<dyn Notifier>,
    events: mpsc::Sender<WidgetEvent>,
    state: Mutex<WidgetState>,
    poller: PollScheduler,
    prober: PollScheduler,
    /// Cancels delayed one-off tasks on shutdown
    lifetime: CancellationToken,
}

impl<B: ?Sized> OverlayHost for WidgetInner<B> {
    fn with_overlay<R>(&self, f: impl FnOnce(&mut TranslationOverlay, &mut RenderedView) -> R) -> R {
        let mut state = lock(&self.state);
        let WidgetState { overlay, view, .. } = &mut *state;
        f(overlay, view)
    }
}

impl<B: ?Sized> Drop for WidgetInner<B> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

/// End-user support widget: a closed badge that opens into a conversation.
///
/// While open, the conversation is polled on a fixed interval. While closed,
/// a lighter unread probe keeps the badge current and raises notifications.
/// Everything a shell needs to draw is published on the event receiver
/// returned by [`SupportWidget::new`].
///
/// Handles are cheap to clone. Background timers hold only weak references,
/// so dropping the last handle stops them.
pub struct SupportWidget<B: ?Sized> {
    inner: Arc<WidgetInner<B>>,
}

impl<B: ?Sized> Clone for SupportWidget<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B> SupportWidget<B>
where
    B: WidgetBackend + TranslateBackend + ?Sized + 'static,
{
    /// Create a closed widget and the receiver its events are published on
    pub fn new(backend: Arc<B>, config: SyncConfig) -> (Self, mpsc::Receiver<WidgetEvent>) {
        Self::with_notifier(backend, config, Arc::new(LogNotifier))
    }

    pub fn with_notifier(
        backend: Arc<B>,
        config: SyncConfig,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, mpsc::Receiver<WidgetEvent>) {
        let (tx, rx) = mpsc::channel(config.event_buffer.max(1));
        let inner = WidgetInner {
            backend,
            renderer: DeltaRenderer::new(Perspective::EndUser),
            notifier,
            events: tx,
            state: Mutex::new(WidgetState::new(&config.target_language)),
            poller: PollScheduler::new("poll", config.poll_interval()),
            prober: PollScheduler::new("probe", config.probe_interval()),
            lifetime: CancellationToken::new(),
            config,
        };
        (Self { inner: Arc::new(inner) }, rx)
    }

    fn upgrade(weak: &Weak<WidgetInner<B>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn state(&self) -> MutexGuard<'_, WidgetState> {
        lock(&self.inner.state)
    }

    async fn publish(&self, events: Vec<WidgetEvent>) {
        for event in events {
            if let WidgetEvent::Notification(notification) = &event {
                self.inner.notifier.notify(notification);
            }
            if self.inner.events.send(event).await.is_err() {
                tracing::debug!("event receiver dropped");
            }
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Start the unread probe and schedule the initial probe.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        tracing::info!(
            poll_interval_ms = self.inner.config.poll_interval_ms,
            probe_interval_ms = self.inner.config.probe_interval_ms,
            "support widget started"
        );

        let weak = Arc::downgrade(&self.inner);
        self.inner.prober.start(false, move || {
            let weak = weak.clone();
            async move {
                if let Some(widget) = Self::upgrade(&weak) {
                    widget.probe_once().await;
                }
            }
        });

        let weak = Arc::downgrade(&self.inner);
        let lifetime = self.inner.lifetime.clone();
        let delay = self.inner.config.initial_probe_delay();
        tokio::spawn(async move {
            tokio::select! {
                _ = lifetime.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(widget) = Self::upgrade(&weak) {
                        widget.probe(false).await;
                    }
                }
            }
        });
    }

    /// Open the panel: clear the badge, load the conversation, start polling
    /// and acknowledge the unread messages shortly after.
    pub async fn open(&self) {
        let events = {
            let mut state = self.state();
            if state.panel_open {
                return;
            }
            state.panel_open = true;
            let mut events = vec![WidgetEvent::PanelToggled { open: true }];
            events.extend(unread_events(state.notifications.mark_read()));
            events
        };
        tracing::info!("support panel opened");
        self.publish(events).await;

        // The timer runs from the moment the panel opens, not from when the
        // first load answers
        self.start_polling();

        // Failures are logged and surfaced inside load
        let _ = self.load().await;

        let (still_open, auth_required, exists) = {
            let state = self.state();
            (state.panel_open, state.auth_required, state.cursor.conversation_exists())
        };
        if auth_required {
            self.inner.poller.stop();
        }
        if !still_open || auth_required {
            return;
        }

        if exists {
            self.schedule_mark_read();
        }
    }

    /// Close the panel and stop polling. A fetch already in flight still
    /// completes and is applied.
    pub async fn close(&self) {
        {
            let mut state = self.state();
            if !state.panel_open {
                return;
            }
            state.panel_open = false;
        }
        self.inner.poller.stop();
        tracing::info!("support panel closed");
        self.publish(vec![WidgetEvent::PanelToggled { open: false }]).await;
    }

    /// Stop every timer and drop the translation overlay
    pub async fn shutdown(&self) {
        self.inner.lifetime.cancel();
        self.inner.poller.stop();
        self.inner.prober.stop();

        let was_open = {
            let mut state = self.state();
            state.overlay.clear();
            std::mem::replace(&mut state.panel_open, false)
        };
        tracing::info!("support widget shut down");
        if was_open {
            self.publish(vec![WidgetEvent::PanelToggled { open: false }]).await;
        }
    }

    fn start_polling(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.poller.start(false, move || {
            let weak = weak.clone();
            async move {
                if let Some(widget) = Self::upgrade(&weak) {
                    widget.poll_once().await;
                }
            }
        });
    }

    fn schedule_mark_read(&self) {
        let weak = Arc::downgrade(&self.inner);
        let lifetime = self.inner.lifetime.clone();
        let delay = self.inner.config.mark_read_delay();
        tokio::spawn(async move {
            tokio::select! {
                _ = lifetime.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(widget) = Self::upgrade(&weak) {
                        // Logged inside mark_read
                        let _ = widget.mark_read().await;
                    }
                }
            }
        });
    }

    // ========================================================================
    // SYNC
    // ========================================================================

    /// Fetch and fully re-render the conversation
    pub async fn load(&self) -> Result<(), ClientError> {
        self.fetch(FetchPurpose::Load).await
    }

    /// One poll tick. Failures are logged; the next tick is the retry.
    pub async fn poll_once(&self) {
        if let Err(e) = self.fetch(FetchPurpose::Poll).await {
            tracing::debug!(error = %e, "poll tick failed");
        }
    }

    async fn fetch(&self, purpose: FetchPurpose) -> Result<(), ClientError> {
        let (seq, generation) = {
            let mut state = self.state();
            if state.auth_required {
                return Err(ClientError::Auth);
            }
            (state.cursor.dispatch(), state.notifications.generation())
        };

        let snapshot = match self.inner.backend.fetch_conversation().await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_auth() => {
                self.require_auth().await;
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(purpose = purpose.as_str(), error = %e, "conversation fetch failed");
                if purpose == FetchPurpose::Load {
                    let events = {
                        let mut state = self.state();
                        state.status = StatusLine::error(LOAD_FAILED);
                        vec![WidgetEvent::Status(state.status.clone())]
                    };
                    self.publish(events).await;
                }
                return Err(e);
            }
        };

        let events = {
            let mut state = self.state();
            state.apply_snapshot(&self.inner.renderer, seq, generation, purpose, snapshot)
        };
        self.publish(events).await;
        Ok(())
    }

    async fn require_auth(&self) {
        let events = {
            let mut state = self.state();
            if state.auth_required {
                return;
            }
            state.auth_required = true;
            state.status = StatusLine::error(LOGIN_REQUIRED);
            vec![
                WidgetEvent::AuthRequired {
                    text: LOGIN_REQUIRED.to_string(),
                },
                WidgetEvent::Status(state.status.clone()),
            ]
        };
        self.inner.poller.stop();
        tracing::warn!("session is not authenticated, support disabled");
        self.publish(events).await;
    }

    // ========================================================================
    // UNREAD
    // ========================================================================

    /// One probe tick. Acts only while the panel is closed and a conversation
    /// is known to exist.
    pub async fn probe_once(&self) {
        self.probe(true).await;
    }

    async fn probe(&self, require_conversation: bool) {
        let generation = {
            let state = self.state();
            if state.panel_open || state.auth_required {
                return;
            }
            if require_conversation && !state.cursor.conversation_exists() {
                return;
            }
            state.notifications.generation()
        };

        let reported = match self.inner.backend.unread_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "unread probe failed");
                return;
            }
        };

        let events = {
            let mut state = self.state();
            if state.panel_open {
                tracing::debug!(reported, "panel opened while probing, ignoring count");
                return;
            }
            if reported > 0 {
                state.cursor.mark_exists();
            }
            unread_events(
                state
                    .notifications
                    .observe(reported, UnreadSource::Probe, generation),
            )
        };
        self.publish(events).await;
    }

    /// Reset the unread counter, then acknowledge on the server when a
    /// conversation exists. Probes and polls that resolve before the
    /// acknowledgement lands are discarded.
    pub async fn mark_read(&self) -> Result<(), ClientError> {
        let (events, exists) = {
            let mut state = self.state();
            let exists = state.cursor.conversation_exists();
            let outcome = if exists {
                state.notifications.begin_mark_read()
            } else {
                state.notifications.mark_read()
            };
            (unread_events(outcome), exists)
        };
        self.publish(events).await;

        if !exists {
            return Ok(());
        }

        let result = self.inner.backend.mark_read().await;
        self.state().notifications.finish_mark_read(result.is_ok());

        match result {
            Ok(()) => {
                tracing::debug!("messages marked read");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "mark-read failed");
                let status = StatusLine::error(MARK_READ_FAILED);
                self.state().status = status.clone();
                self.publish(vec![WidgetEvent::Status(status)]).await;
                Err(e)
            }
        }
    }

    // ========================================================================
    // USER ACTIONS
    // ========================================================================

    /// Send a message. Blank input is ignored, as is a send while another is
    /// in flight. The outcome is also reported on the status line.
    pub async fn send(&self, text: &str) -> Result<(), ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        {
            let mut state = self.state();
            if state.sending {
                tracing::debug!("send already in progress");
                return Ok(());
            }
            state.sending = true;
        }

        let result = self.inner.backend.send_message(text).await;

        let events = {
            let mut state = self.state();
            state.sending = false;
            let status = match &result {
                Ok(()) => {
                    state.cursor.mark_exists();
                    StatusLine::info(DEFAULT_HINT)
                }
                Err(e) if e.is_network() => StatusLine::error(SEND_FAILED_NETWORK),
                Err(_) => StatusLine::error(SEND_FAILED),
            };
            state.status = status.clone();
            vec![WidgetEvent::Status(status)]
        };
        self.publish(events).await;

        match result {
            Ok(()) => {
                tracing::info!(chars = text.chars().count(), "message sent");
                if let Err(e) = self.load().await {
                    tracing::debug!(error = %e, "reload after send failed");
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "send failed");
                Err(e)
            }
        }
    }

    /// Translate a message or revert it to the original text
    pub async fn toggle_translation(&self, message_id: MessageId) {
        let events = run_toggle(self.inner.as_ref(), self.inner.backend.as_ref(), message_id).await;
        self.publish(events).await;
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn is_open(&self) -> bool {
        self.state().panel_open
    }

    pub fn badge(&self) -> u32 {
        self.state().notifications.count()
    }

    pub fn view(&self) -> RenderedView {
        self.state().view.clone()
    }

    pub fn cursor(&self) -> SyncCursor {
        self.state().cursor.clone()
    }

    pub fn status(&self) -> StatusLine {
        self.state().status.clone()
    }

    pub fn is_auth_required(&self) -> bool {
        self.state().auth_required
    }

    pub fn is_polling(&self) -> bool {
        self.inner.poller.is_active()
    }

    pub fn is_probing(&self) -> bool {
        self.inner.prober.is_active()
    }

    pub fn translation(&self, message_id: MessageId) -> Option<TranslationEntry> {
        self.state().overlay.entry(message_id).cloned()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }
}
