//! In-memory backend for tests and offline demos.
//!
//! [`MockBackend`] keeps one conversation and one admin ticket in memory.
//! Responses can be scripted per call, failures injected per operation, and
//! individual operations held at a gate to stage races.

use crate::lock;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use support_chat_client::{AdminBackend, ClientError, Result, TranslateBackend, WidgetBackend};
use support_chat_types::{
    AdminTicket, BroadcastTarget, ConversationSnapshot, Message, MessageId, TicketId, TicketStatus,
};
use tokio::sync::Semaphore;

pub const FETCH: &str = "fetch_conversation";
pub const SEND: &str = "send_message";
pub const MARK_READ: &str = "mark_read";
pub const UNREAD: &str = "unread_count";
pub const TRANSLATE: &str = "translate";
pub const FETCH_TICKET: &str = "fetch_ticket";
pub const REPLY: &str = "reply";
pub const CLOSE: &str = "close_ticket";
pub const DELETE: &str = "delete_ticket";
pub const SET_STATUS: &str = "set_status";
pub const BROADCAST: &str = "broadcast";

#[derive(Default)]
struct MockState {
    conversation: ConversationSnapshot,
    ticket: Option<AdminTicket>,
    next_id: i64,
    fetch_script: VecDeque<Result<ConversationSnapshot>>,
    unread_script: VecDeque<Result<u32>>,
    failures: HashMap<&'static str, VecDeque<ClientError>>,
    translations: HashMap<String, String>,
    calls: HashMap<&'static str, usize>,
    gates: HashMap<&'static str, Arc<Semaphore>>,
}

/// A request parked at a gate until released
#[derive(Clone)]
pub struct Gate {
    permits: Arc<Semaphore>,
}

impl Gate {
    /// Let one parked request through
    pub fn release(&self) {
        self.permits.add_permits(1);
    }
}

#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose viewer already has a conversation with `messages`
    pub fn with_conversation(messages: Vec<Message>) -> Self {
        let backend = Self::new();
        {
            let mut state = lock(&backend.state);
            state.next_id = messages.iter().map(|m| m.id.0).max().unwrap_or(0);
            state.conversation = ConversationSnapshot::with_ticket(1, messages);
        }
        backend
    }

    pub fn with_ticket(ticket: AdminTicket) -> Self {
        let backend = Self::new();
        {
            let mut state = lock(&backend.state);
            state.next_id = ticket.messages.iter().map(|m| m.id.0).max().unwrap_or(0);
            state.ticket = Some(ticket);
        }
        backend
    }

    /// Append an admin reply to the conversation and bump the unread count
    pub fn push_admin_message(&self, text: &str) -> MessageId {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = MessageId(state.next_id);
        if state.conversation.ticket_id.is_none() {
            state.conversation.ticket_id = Some(TicketId(1));
            state.conversation.status = Some(TicketStatus::Open);
        }
        state.conversation.messages.push(Message::admin(id, text));
        state.conversation.unread_count += 1;
        id
    }

    pub fn set_unread(&self, count: u32) {
        lock(&self.state).conversation.unread_count = count;
    }

    pub fn conversation(&self) -> ConversationSnapshot {
        lock(&self.state).conversation.clone()
    }

    pub fn ticket(&self) -> Option<AdminTicket> {
        lock(&self.state).ticket.clone()
    }

    /// Queue a one-off fetch response, served before the live conversation
    pub fn script_fetch(&self, response: Result<ConversationSnapshot>) {
        lock(&self.state).fetch_script.push_back(response);
    }

    /// Queue one-off unread probe responses, served in order
    pub fn script_unread(&self, counts: impl IntoIterator<Item = u32>) {
        lock(&self.state).unread_script.extend(counts.into_iter().map(Ok));
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: &'static str, error: ClientError) {
        lock(&self.state)
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    pub fn add_translation(&self, text: &str, translated: &str) {
        lock(&self.state)
            .translations
            .insert(text.to_string(), translated.to_string());
    }

    /// Park every call of `operation` until the returned gate releases it
    pub fn hold(&self, operation: &'static str) -> Gate {
        let permits = Arc::new(Semaphore::new(0));
        lock(&self.state).gates.insert(operation, permits.clone());
        Gate { permits }
    }

    /// Stop parking new calls of `operation`
    pub fn unhold(&self, operation: &'static str) {
        lock(&self.state).gates.remove(operation);
    }

    pub fn calls(&self, operation: &str) -> usize {
        lock(&self.state).calls.get(operation).copied().unwrap_or(0)
    }

    /// Count the call, wait at its gate, then surface any injected failure
    async fn enter(&self, operation: &'static str) -> Result<()> {
        let gate = {
            let mut state = lock(&self.state);
            *state.calls.entry(operation).or_default() += 1;
            state.gates.get(operation).cloned()
        };
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let mut state = lock(&self.state);
        match state.failures.get_mut(operation).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn with_ticket_mut<T>(&self, f: impl FnOnce(&mut AdminTicket) -> Result<T>) -> Result<T> {
        let mut state = lock(&self.state);
        match state.ticket.as_mut() {
            Some(ticket) => f(ticket),
            None => Err(ClientError::Status {
                status: 404,
                body: "Ticket not found".to_string(),
            }),
        }
    }
}

#[async_trait]
impl WidgetBackend for MockBackend {
    async fn fetch_conversation(&self) -> Result<ConversationSnapshot> {
        self.enter(FETCH).await?;
        let mut state = lock(&self.state);
        match state.fetch_script.pop_front() {
            Some(response) => response,
            None => Ok(state.conversation.clone()),
        }
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        self.enter(SEND).await?;
        let mut state = lock(&self.state);
        if state.conversation.status == Some(TicketStatus::Closed) {
            return Err(ClientError::Rejected("Ticket is closed".to_string()));
        }
        state.next_id += 1;
        let id = state.next_id;
        if state.conversation.ticket_id.is_none() {
            state.conversation.ticket_id = Some(TicketId(1));
            state.conversation.status = Some(TicketStatus::Open);
        }
        state.conversation.messages.push(Message::user(id, text));
        Ok(())
    }

    async fn mark_read(&self) -> Result<()> {
        self.enter(MARK_READ).await?;
        lock(&self.state).conversation.unread_count = 0;
        Ok(())
    }

    async fn unread_count(&self) -> Result<u32> {
        self.enter(UNREAD).await?;
        let mut state = lock(&self.state);
        match state.unread_script.pop_front() {
            Some(response) => response,
            None => Ok(state.conversation.unread_count),
        }
    }
}

#[async_trait]
impl TranslateBackend for MockBackend {
    async fn translate(&self, text: &str, _target_language: &str) -> Result<String> {
        self.enter(TRANSLATE).await?;
        let state = lock(&self.state);
        Ok(state
            .translations
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string()))
    }
}

#[async_trait]
impl AdminBackend for MockBackend {
    async fn fetch_ticket(&self, ticket_id: TicketId) -> Result<AdminTicket> {
        self.enter(FETCH_TICKET).await?;
        self.with_ticket_mut(|ticket| {
            if ticket.id == ticket_id {
                Ok(ticket.clone())
            } else {
                Err(ClientError::Status {
                    status: 404,
                    body: "Ticket not found".to_string(),
                })
            }
        })
    }

    async fn reply(&self, _ticket_id: TicketId, text: &str) -> Result<()> {
        self.enter(REPLY).await?;
        let id = {
            let mut state = lock(&self.state);
            state.next_id += 1;
            state.next_id
        };
        self.with_ticket_mut(|ticket| {
            if !ticket.status.accepts_messages() {
                return Err(ClientError::Rejected("Ticket is closed".to_string()));
            }
            ticket.messages.push(Message::admin(id, text));
            Ok(())
        })
    }

    async fn close_ticket(&self, _ticket_id: TicketId) -> Result<()> {
        self.enter(CLOSE).await?;
        self.with_ticket_mut(|ticket| {
            ticket.status = TicketStatus::Closed;
            Ok(())
        })
    }

    async fn delete_ticket(&self, _ticket_id: TicketId) -> Result<()> {
        self.enter(DELETE).await?;
        lock(&self.state).ticket = None;
        Ok(())
    }

    async fn set_status(&self, _ticket_id: TicketId, status: TicketStatus) -> Result<TicketStatus> {
        self.enter(SET_STATUS).await?;
        self.with_ticket_mut(|ticket| {
            ticket.status = status;
            Ok(status)
        })
    }

    async fn broadcast(&self, _message: &str, target: &BroadcastTarget) -> Result<String> {
        self.enter(BROADCAST).await?;
        Ok(match target {
            BroadcastTarget::AllUsers => "Broadcast sent to all users".to_string(),
            BroadcastTarget::OpenTickets => "Broadcast sent to users with open tickets".to_string(),
            BroadcastTarget::Team(id) => format!("Broadcast sent to members of team {}", id),
        })
    }
}
