use crate::lock;
use crate::render::{DeltaRenderer, Perspective};
use crate::translate::{run_toggle, OverlayHost, TranslationEntry, TranslationOverlay};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use support_chat_client::{AdminBackend, ClientError, TranslateBackend};
use support_chat_types::{
    BroadcastTarget, MessageId, RenderedView, StatusLine, SyncConfig, TicketId, TicketStatus,
    WidgetEvent,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const EMPTY_MESSAGE: &str = "Please enter a message.";
pub const REPLY_SENT: &str = "Message sent successfully!";
pub const REPLY_FAILED: &str = "Failed to send message. Please try again.";
pub const CLOSE_FAILED: &str = "Failed to close ticket. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete ticket. Please try again.";
pub const STATUS_FAILED: &str = "Failed to update ticket status.";
pub const BROADCAST_FAILED: &str = "Failed to send broadcast. Please try again.";

struct ConsoleState {
    ticket_id: Option<TicketId>,
    ticket_status: Option<TicketStatus>,
    view: RenderedView,
    overlay: TranslationOverlay,
    status: Option<StatusLine>,
    replying: bool,
}

impl ConsoleState {
    fn new(target_language: &str) -> Self {
        Self {
            ticket_id: None,
            ticket_status: None,
            view: RenderedView::default(),
            overlay: TranslationOverlay::new(target_language),
            status: None,
            replying: false,
        }
    }
}

struct ConsoleInner<B: ?Sized> {
    backend: Arc<B>,
    config: SyncConfig,
    renderer: DeltaRenderer,
    events: mpsc::Sender<WidgetEvent>,
    state: Mutex<ConsoleState>,
    lifetime: CancellationToken,
}

impl<B: ?Sized> OverlayHost for ConsoleInner<B> {
    fn with_overlay<R>(&self, f: impl FnOnce(&mut TranslationOverlay, &mut RenderedView) -> R) -> R {
        let mut state = lock(&self.state);
        let ConsoleState { overlay, view, .. } = &mut *state;
        f(overlay, view)
    }
}

impl<B: ?Sized> Drop for ConsoleInner<B> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

/// Ticket view of the support staff console.
///
/// Shows one ticket at a time with staff labelling, and carries the staff
/// actions: reply, close, delete, status changes and broadcasts. It keeps no
/// unread counter and never polls; the view refreshes after each action.
pub struct AdminConsole<B: ?Sized> {
    inner: Arc<ConsoleInner<B>>,
}

impl<B: ?Sized> Clone for AdminConsole<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B> AdminConsole<B>
where
    B: AdminBackend + TranslateBackend + ?Sized + 'static,
{
    pub fn new(backend: Arc<B>, config: SyncConfig) -> (Self, mpsc::Receiver<WidgetEvent>) {
        let (tx, rx) = mpsc::channel(config.event_buffer.max(1));
        let inner = ConsoleInner {
            backend,
            renderer: DeltaRenderer::new(Perspective::Admin),
            events: tx,
            state: Mutex::new(ConsoleState::new(&config.target_language)),
            lifetime: CancellationToken::new(),
            config,
        };
        (Self { inner: Arc::new(inner) }, rx)
    }

    fn upgrade(weak: &Weak<ConsoleInner<B>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn state(&self) -> MutexGuard<'_, ConsoleState> {
        lock(&self.inner.state)
    }

    async fn publish(&self, events: Vec<WidgetEvent>) {
        for event in events {
            if self.inner.events.send(event).await.is_err() {
                tracing::debug!("event receiver dropped");
            }
        }
    }

    async fn show_status(&self, status: StatusLine) {
        self.state().status = Some(status.clone());
        self.publish(vec![WidgetEvent::Status(status)]).await;
    }

    /// Switch to `ticket_id` and load it
    pub async fn open_ticket(&self, ticket_id: TicketId) -> Result<(), ClientError> {
        {
            let mut state = self.state();
            state.ticket_id = Some(ticket_id);
            state.ticket_status = None;
            state.view = RenderedView::default();
            state.overlay.clear();
        }
        tracing::info!(ticket_id = %ticket_id, "opening ticket");
        self.reload().await
    }

    /// Fetch the current ticket again and re-render it
    pub async fn reload(&self) -> Result<(), ClientError> {
        let Some(ticket_id) = self.ticket_id() else {
            return Ok(());
        };

        let ticket = match self.inner.backend.fetch_ticket(ticket_id).await {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::warn!(ticket_id = %ticket_id, error = %e, "failed to load ticket");
                self.show_status(StatusLine::error(format!("Failed to load ticket #{}", ticket_id)))
                    .await;
                return Err(e);
            }
        };

        let events = {
            let mut state = self.state();
            if state.ticket_id != Some(ticket_id) {
                tracing::debug!(ticket_id = %ticket_id, "ticket switched while loading");
                return Ok(());
            }
            let (high_water_mark, mut view) =
                self.inner.renderer.render(&ticket.messages, None, false);
            state.overlay.apply_to(&mut view);
            state.ticket_status = Some(ticket.status);
            state.view = view.clone();
            vec![
                WidgetEvent::TicketLoaded {
                    ticket_id,
                    owner: ticket.owner_label(),
                    status: ticket.status.to_string(),
                },
                WidgetEvent::ViewRendered { view, high_water_mark },
            ]
        };
        self.publish(events).await;
        Ok(())
    }

    fn schedule_reload(&self) {
        let weak = Arc::downgrade(&self.inner);
        let lifetime = self.inner.lifetime.clone();
        let delay = self.inner.config.admin_reload_delay();
        tokio::spawn(async move {
            tokio::select! {
                _ = lifetime.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(console) = Self::upgrade(&weak) {
                        // Logged and surfaced inside reload
                        let _ = console.reload().await;
                    }
                }
            }
        });
    }

    /// Reply on the current ticket
    pub async fn reply(&self, text: &str) -> Result<(), ClientError> {
        let text = text.trim();
        if text.is_empty() {
            self.show_status(StatusLine::error(EMPTY_MESSAGE)).await;
            return Ok(());
        }

        let ticket_id = {
            let mut state = self.state();
            let current = state.ticket_id;
            match current {
                Some(id) if !state.replying => {
                    state.replying = true;
                    id
                }
                _ => return Ok(()),
            }
        };

        let result = self.inner.backend.reply(ticket_id, text).await;
        self.state().replying = false;

        match result {
            Ok(()) => {
                tracing::info!(ticket_id = %ticket_id, "reply sent");
                self.show_status(StatusLine::success(REPLY_SENT)).await;
                self.schedule_reload();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(ticket_id = %ticket_id, error = %e, "reply failed");
                self.show_status(StatusLine::error(REPLY_FAILED)).await;
                Err(e)
            }
        }
    }

    pub async fn close_ticket(&self) -> Result<(), ClientError> {
        let Some(ticket_id) = self.ticket_id() else {
            return Ok(());
        };

        match self.inner.backend.close_ticket(ticket_id).await {
            Ok(()) => {
                tracing::info!(ticket_id = %ticket_id, "ticket closed");
                self.show_status(StatusLine::success("Ticket closed.")).await;
                // Logged and surfaced inside reload
                let _ = self.reload().await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(ticket_id = %ticket_id, error = %e, "close failed");
                self.show_status(StatusLine::error(CLOSE_FAILED)).await;
                Err(e)
            }
        }
    }

    pub async fn delete_ticket(&self) -> Result<(), ClientError> {
        let Some(ticket_id) = self.ticket_id() else {
            return Ok(());
        };

        if let Err(e) = self.inner.backend.delete_ticket(ticket_id).await {
            tracing::warn!(ticket_id = %ticket_id, error = %e, "delete failed");
            self.show_status(StatusLine::error(DELETE_FAILED)).await;
            return Err(e);
        }

        let status = StatusLine::success("Ticket deleted successfully!");
        {
            let mut state = self.state();
            state.ticket_id = None;
            state.ticket_status = None;
            state.view = RenderedView::default();
            state.overlay.clear();
            state.status = Some(status.clone());
        }
        tracing::info!(ticket_id = %ticket_id, "ticket deleted");
        self.publish(vec![
            WidgetEvent::TicketDeleted { ticket_id },
            WidgetEvent::Status(status),
        ])
        .await;
        Ok(())
    }

    pub async fn set_status(&self, status: TicketStatus) -> Result<(), ClientError> {
        let Some(ticket_id) = self.ticket_id() else {
            return Ok(());
        };

        match self.inner.backend.set_status(ticket_id, status).await {
            Ok(updated) => {
                tracing::info!(ticket_id = %ticket_id, status = %updated, "ticket status updated");
                self.state().ticket_status = Some(updated);
                self.show_status(StatusLine::success(format!("Status updated to {}", updated)))
                    .await;
                // Logged and surfaced inside reload
                let _ = self.reload().await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(ticket_id = %ticket_id, error = %e, "status update failed");
                self.show_status(StatusLine::error(STATUS_FAILED)).await;
                Err(e)
            }
        }
    }

    /// Send an announcement to many users. Independent of the open ticket.
    pub async fn broadcast(&self, message: &str, target: BroadcastTarget) -> Result<(), ClientError> {
        let message = message.trim();
        if message.is_empty() {
            self.show_status(StatusLine::error(EMPTY_MESSAGE)).await;
            return Ok(());
        }

        match self.inner.backend.broadcast(message, &target).await {
            Ok(summary) => {
                tracing::info!(audience = target.as_form_value(), summary = %summary, "broadcast sent");
                let text = if summary.is_empty() {
                    "Broadcast sent.".to_string()
                } else {
                    summary
                };
                self.show_status(StatusLine::success(text)).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(audience = target.as_form_value(), error = %e, "broadcast failed");
                self.show_status(StatusLine::error(BROADCAST_FAILED)).await;
                Err(e)
            }
        }
    }

    /// Translate a message or revert it to the original text
    pub async fn toggle_translation(&self, message_id: MessageId) {
        let events = run_toggle(self.inner.as_ref(), self.inner.backend.as_ref(), message_id).await;
        self.publish(events).await;
    }

    /// Cancel pending reloads and drop the translation overlay
    pub fn shutdown(&self) {
        self.inner.lifetime.cancel();
        self.state().overlay.clear();
    }

    pub fn ticket_id(&self) -> Option<TicketId> {
        self.state().ticket_id
    }

    pub fn ticket_status(&self) -> Option<TicketStatus> {
        self.state().ticket_status
    }

    pub fn view(&self) -> RenderedView {
        self.state().view.clone()
    }

    pub fn status(&self) -> Option<StatusLine> {
        self.state().status.clone()
    }

    pub fn translation(&self, message_id: MessageId) -> Option<TranslationEntry> {
        self.state().overlay.entry(message_id).cloned()
    }
}
