use crate::language::needs_translation;
use support_chat_types::{Message, MessageId, RenderedMessage, RenderedView, ToggleControl};

/// Whose eyes the message list is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    /// The ticket owner, in the floating widget
    EndUser,
    /// Support staff, in the ticket view of the admin console
    Admin,
}

/// Turns an authoritative message list into a complete [`RenderedView`].
///
/// Rendering is a full replacement: nothing from a previous render is carried
/// over, so calling it twice with the same input yields the same view.
#[derive(Debug, Clone, Copy)]
pub struct DeltaRenderer {
    perspective: Perspective,
}

impl DeltaRenderer {
    pub fn new(perspective: Perspective) -> Self {
        Self { perspective }
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    /// Render `messages` and return the new high-water mark alongside the view.
    ///
    /// With `highlight_new`, messages above `previous` are flagged as new. A
    /// first render (`previous == None`) never highlights anything. The mark
    /// is the larger of `previous` and the last message id.
    pub fn render(
        &self,
        messages: &[Message],
        previous: Option<MessageId>,
        highlight_new: bool,
    ) -> (Option<MessageId>, RenderedView) {
        let rendered = messages
            .iter()
            .map(|msg| RenderedMessage {
                id: msg.id,
                role: msg.sender_role,
                author: self.author_label(msg),
                timestamp: self.timestamp(msg),
                text: msg.text.clone(),
                is_new: highlight_new && previous.is_some_and(|prev| msg.id > prev),
                translate: needs_translation(&msg.text).then_some(ToggleControl::Translate),
            })
            .collect();

        let last = messages.last().map(|m| m.id);
        let high_water_mark = match (previous, last) {
            (Some(prev), Some(last)) => Some(prev.max(last)),
            (prev, last) => prev.or(last),
        };

        (high_water_mark, RenderedView { messages: rendered })
    }

    fn author_label(&self, msg: &Message) -> String {
        match (self.perspective, msg.is_admin()) {
            (_, true) => "Admin".to_string(),
            (Perspective::EndUser, false) => "You".to_string(),
            (Perspective::Admin, false) => match (&msg.sender_name, &msg.sender_team) {
                (Some(name), Some(team)) => format!("{} (Team {})", name, team),
                (Some(name), None) => name.clone(),
                (None, _) => "User".to_string(),
            },
        }
    }

    fn timestamp(&self, msg: &Message) -> String {
        let raw = msg.created.as_deref().map(str::trim).unwrap_or_default();
        let pattern = match self.perspective {
            Perspective::EndUser => "%d/%m %H:%M",
            Perspective::Admin => "%m/%d %H:%M",
        };

        if raw.is_empty() {
            return match self.perspective {
                Perspective::EndUser => String::new(),
                Perspective::Admin => "N/A".to_string(),
            };
        }

        match msg.created_at() {
            Some(dt) => dt.format(pattern).to_string(),
            None => raw.to_string(),
        }
    }
}
