use support_chat_types::Notification;

/// Mark-read generation a producer was dispatched under
pub type Generation = u64;

/// Who reported an unread count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreadSource {
    /// Message poll that found a changed list while the panel was closed
    Poll,
    /// Periodic unread-count probe
    Probe,
    /// Explicit load; updates the badge but never notifies
    Load,
}

impl UnreadSource {
    fn notification(&self, increase: u32) -> Option<Notification> {
        match self {
            UnreadSource::Poll => Some(Notification::new("Admin replied to your support ticket")),
            UnreadSource::Probe => {
                let noun = if increase == 1 { "message" } else { "messages" };
                Some(Notification::new(format!(
                    "You have {} new {} from admin",
                    increase, noun
                )))
            }
            UnreadSource::Load => None,
        }
    }
}

/// What an observation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadOutcome {
    /// New badge value, when it changed
    pub badge: Option<u32>,
    pub notification: Option<Notification>,
}

impl UnreadOutcome {
    pub fn is_empty(&self) -> bool {
        self.badge.is_none() && self.notification.is_none()
    }
}

/// Unread counter and its notification rules.
///
/// A notification fires only when a reported count exceeds the last known
/// one. Mark-read bumps the generation; observations dispatched under an
/// earlier generation are discarded when they resolve. While a server
/// acknowledgement is outstanding every observation is discarded, since the
/// server may not have reset its count yet.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    count: u32,
    last_known: u32,
    generation: Generation,
    acks_pending: u32,
    /// `last_known` before the outstanding acknowledgements began
    known_before_ack: u32,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_known(&self) -> u32 {
        self.last_known
    }

    /// Stamp to record when dispatching a producer
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn ack_pending(&self) -> bool {
        self.acks_pending > 0
    }

    /// Apply a count reported by a producer dispatched under `dispatched_at`
    pub fn observe(
        &mut self,
        reported: u32,
        source: UnreadSource,
        dispatched_at: Generation,
    ) -> UnreadOutcome {
        if self.ack_pending() {
            tracing::debug!(reported, "discarding unread count while mark-read is outstanding");
            return UnreadOutcome::default();
        }
        if dispatched_at < self.generation {
            tracing::debug!(
                reported,
                dispatched_at,
                generation = self.generation,
                "discarding unread count from before mark-read"
            );
            return UnreadOutcome::default();
        }

        let notification = if reported > self.last_known {
            source.notification(reported - self.last_known)
        } else {
            None
        };
        let badge = (reported != self.count).then_some(reported);

        self.count = reported;
        self.last_known = reported;

        UnreadOutcome { badge, notification }
    }

    /// Reset to zero and invalidate every producer already in flight
    pub fn mark_read(&mut self) -> UnreadOutcome {
        self.generation += 1;
        let badge = (self.count != 0).then_some(0);
        self.count = 0;
        self.last_known = 0;
        UnreadOutcome { badge, notification: None }
    }

    /// Reset locally and hold observations until `finish_mark_read`
    pub fn begin_mark_read(&mut self) -> UnreadOutcome {
        self.known_before_ack = if self.ack_pending() {
            self.known_before_ack.max(self.last_known)
        } else {
            self.last_known
        };
        self.acks_pending += 1;
        self.mark_read()
    }

    /// Settle one acknowledgement. Producers dispatched while it was out are
    /// invalidated. When the server refused, the counts it still holds stay
    /// known so they are not announced a second time.
    pub fn finish_mark_read(&mut self, acknowledged: bool) {
        self.acks_pending = self.acks_pending.saturating_sub(1);
        self.generation += 1;
        if !acknowledged {
            self.last_known = self.last_known.max(self.known_before_ack);
        }
    }
}

/// Sink for system notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            tag = %notification.tag,
            "notification"
        );
    }
}
