use support_chat_types::{ConversationSnapshot, MessageId, TicketId};

/// Sequence number stamped on a fetch when it is dispatched
pub type FetchSeq = u64;

/// Where the widget stands in the conversation.
///
/// The high-water mark only moves forward. Every fetch is numbered at dispatch
/// time so responses that resolve out of order can be recognised and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCursor {
    ticket_id: Option<TicketId>,
    conversation_exists: bool,
    last_seen: Option<MessageId>,
    next_seq: FetchSeq,
    last_applied: FetchSeq,
}

impl SyncCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticket_id(&self) -> Option<TicketId> {
        self.ticket_id
    }

    pub fn conversation_exists(&self) -> bool {
        self.conversation_exists
    }

    /// Id of the newest message rendered so far
    pub fn high_water_mark(&self) -> Option<MessageId> {
        self.last_seen
    }

    /// Stamp a new fetch. Sequence numbers start at 1.
    pub fn dispatch(&mut self) -> FetchSeq {
        self.next_seq += 1;
        self.next_seq
    }

    /// A response is stale when a fetch dispatched after it was already applied
    pub fn is_stale(&self, seq: FetchSeq) -> bool {
        seq <= self.last_applied
    }

    /// Record that the response of `seq` is being applied
    pub fn accept(&mut self, seq: FetchSeq, snapshot: &ConversationSnapshot) {
        self.last_applied = self.last_applied.max(seq);
        if snapshot.exists() {
            self.ticket_id = snapshot.ticket_id;
            self.conversation_exists = true;
        }
    }

    /// Whether a snapshot ending at `last` is behind what was already shown
    pub fn would_regress(&self, last: MessageId) -> bool {
        self.last_seen.is_some_and(|seen| last < seen)
    }

    /// Move the high-water mark to `candidate` unless that would go backwards
    pub fn advance(&mut self, candidate: Option<MessageId>) -> Option<MessageId> {
        self.last_seen = match (self.last_seen, candidate) {
            (Some(seen), Some(next)) => Some(seen.max(next)),
            (seen, next) => seen.or(next),
        };
        self.last_seen
    }

    /// A message was accepted by the server, so a conversation now exists
    pub fn mark_exists(&mut self) {
        self.conversation_exists = true;
    }
}
