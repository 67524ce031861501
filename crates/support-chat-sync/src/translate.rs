use std::collections::HashMap;
use support_chat_client::TranslateBackend;
use support_chat_types::{MessageId, RenderedView, ToggleControl, WidgetEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Original,
    Translated,
}

/// Per-message translation state, kept beside the rendered view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    pub original_text: String,
    pub translated_text: Option<String>,
    pub display: DisplayState,
    pub in_flight: bool,
    /// Translation turned out identical to the original
    pub hidden: bool,
}

impl TranslationEntry {
    fn new(original_text: &str) -> Self {
        Self {
            original_text: original_text.to_string(),
            translated_text: None,
            display: DisplayState::Original,
            in_flight: false,
            hidden: false,
        }
    }

    pub fn control(&self) -> ToggleControl {
        if self.hidden {
            ToggleControl::Hidden
        } else if self.in_flight {
            ToggleControl::InProgress
        } else {
            match self.display {
                DisplayState::Original => ToggleControl::Translate,
                DisplayState::Translated => ToggleControl::ShowOriginal,
            }
        }
    }

    pub fn displayed_text(&self) -> &str {
        match (self.display, &self.translated_text) {
            (DisplayState::Translated, Some(text)) => text,
            _ => &self.original_text,
        }
    }

    fn apply(&mut self, translated: Option<String>) {
        self.in_flight = false;
        match translated {
            Some(text) if text.trim() == self.original_text.trim() => {
                self.hidden = true;
                self.display = DisplayState::Original;
            }
            Some(text) => {
                self.translated_text = Some(text);
                self.display = DisplayState::Translated;
            }
            None => self.display = DisplayState::Original,
        }
    }

    fn update(&self, message_id: MessageId) -> TranslationUpdate {
        TranslationUpdate {
            message_id,
            text: self.displayed_text().to_string(),
            control: self.control(),
        }
    }
}

/// Displayed text and control of one message after a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUpdate {
    pub message_id: MessageId,
    pub text: String,
    pub control: ToggleControl,
}

impl From<TranslationUpdate> for WidgetEvent {
    fn from(update: TranslationUpdate) -> Self {
        WidgetEvent::TranslationChanged {
            message_id: update.message_id,
            text: update.text,
            control: update.control,
        }
    }
}

/// Result of a toggle request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleStep {
    /// Request in flight, control hidden, or unknown message
    Ignored,
    /// Resolved locally without a request
    Done(TranslationUpdate),
    /// A request must be made; the entry is already marked in flight
    Fetch {
        text: String,
        target_language: String,
        pending: TranslationUpdate,
    },
}

/// Client-side translation overlay on top of rendered messages.
///
/// Entries survive re-renders and are re-applied to each fresh view. The
/// original text is captured once, so reverting never needs the network.
#[derive(Debug, Clone)]
pub struct TranslationOverlay {
    target_language: String,
    entries: HashMap<MessageId, TranslationEntry>,
    cache: HashMap<(String, String), String>,
}

impl TranslationOverlay {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
            entries: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn entry(&self, message_id: MessageId) -> Option<&TranslationEntry> {
        self.entries.get(&message_id)
    }

    /// Flip the display of `message_id`, whose current text is `text`.
    pub fn begin_toggle(&mut self, message_id: MessageId, text: &str) -> ToggleStep {
        let entry = self
            .entries
            .entry(message_id)
            .or_insert_with(|| TranslationEntry::new(text));

        if entry.hidden || entry.in_flight {
            return ToggleStep::Ignored;
        }

        match entry.display {
            DisplayState::Translated => {
                entry.display = DisplayState::Original;
                ToggleStep::Done(entry.update(message_id))
            }
            DisplayState::Original if entry.translated_text.is_some() => {
                entry.display = DisplayState::Translated;
                ToggleStep::Done(entry.update(message_id))
            }
            DisplayState::Original => {
                let key = (entry.original_text.clone(), self.target_language.clone());
                if let Some(cached) = self.cache.get(&key).cloned() {
                    tracing::debug!(message_id = %message_id, "translation served from cache");
                    entry.apply(Some(cached));
                    return ToggleStep::Done(entry.update(message_id));
                }

                entry.in_flight = true;
                ToggleStep::Fetch {
                    text: entry.original_text.clone(),
                    target_language: self.target_language.clone(),
                    pending: entry.update(message_id),
                }
            }
        }
    }

    /// Settle an in-flight request. `None` means it failed.
    ///
    /// Returns `None` when the entry was dropped while the request was out,
    /// e.g. by `clear`; the late result is discarded.
    pub fn complete(
        &mut self,
        message_id: MessageId,
        translated: Option<String>,
    ) -> Option<TranslationUpdate> {
        let Some(entry) = self.entries.get_mut(&message_id) else {
            tracing::debug!(message_id = %message_id, "translation finished after overlay was cleared");
            return None;
        };
        if let Some(text) = &translated {
            self.cache.insert(
                (entry.original_text.clone(), self.target_language.clone()),
                text.clone(),
            );
        }
        entry.apply(translated);
        Some(entry.update(message_id))
    }

    /// Re-apply overlay state to a freshly rendered view
    pub fn apply_to(&self, view: &mut RenderedView) {
        for (id, entry) in &self.entries {
            if let Some(message) = view.get_mut(*id) {
                if message.translate.is_none() {
                    continue;
                }
                message.text = entry.displayed_text().to_string();
                message.translate = Some(entry.control());
            }
        }
    }

    /// Drop all entries and cached translations
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cache.clear();
    }
}

/// Something holding an overlay next to the view it decorates
pub(crate) trait OverlayHost {
    fn with_overlay<R>(&self, f: impl FnOnce(&mut TranslationOverlay, &mut RenderedView) -> R) -> R;
}

/// Run one translate/revert toggle against `host`, returning the events to
/// publish in order.
pub(crate) async fn run_toggle<H, T>(host: &H, backend: &T, message_id: MessageId) -> Vec<WidgetEvent>
where
    H: OverlayHost + ?Sized,
    T: TranslateBackend + ?Sized,
{
    let step = host.with_overlay(|overlay, view| {
        let text = match view.get(message_id) {
            Some(message) if message.translate.is_some() => message.text.clone(),
            _ => return ToggleStep::Ignored,
        };
        let step = overlay.begin_toggle(message_id, &text);
        overlay.apply_to(view);
        step
    });

    let (text, target_language, pending) = match step {
        ToggleStep::Ignored => return Vec::new(),
        ToggleStep::Done(update) => return vec![update.into()],
        ToggleStep::Fetch { text, target_language, pending } => (text, target_language, pending),
    };

    let translated = match backend.translate(&text, &target_language).await {
        Ok(translated) => Some(translated),
        Err(e) => {
            tracing::warn!(message_id = %message_id, error = %e, "translation failed");
            None
        }
    };

    let update = host.with_overlay(|overlay, view| {
        let update = overlay.complete(message_id, translated);
        overlay.apply_to(view);
        update
    });

    let mut events: Vec<WidgetEvent> = vec![pending.into()];
    events.extend(update.map(WidgetEvent::from));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_text(step: ToggleStep) -> String {
        match step {
            ToggleStep::Fetch { text, pending, .. } => {
                assert_eq!(pending.control, ToggleControl::InProgress);
                text
            }
            other => panic!("expected fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_translate_revert_translate_fetches_once() {
        let mut overlay = TranslationOverlay::new("en");
        let id = MessageId(1);

        assert_eq!(fetch_text(overlay.begin_toggle(id, "terima kasih")), "terima kasih");
        let update = overlay.complete(id, Some("thank you".to_string())).unwrap();
        assert_eq!(update.text, "thank you");
        assert_eq!(update.control, ToggleControl::ShowOriginal);

        match overlay.begin_toggle(id, "thank you") {
            ToggleStep::Done(update) => {
                assert_eq!(update.text, "terima kasih");
                assert_eq!(update.control, ToggleControl::Translate);
            }
            other => panic!("expected local revert, got {:?}", other),
        }

        match overlay.begin_toggle(id, "terima kasih") {
            ToggleStep::Done(update) => assert_eq!(update.text, "thank you"),
            other => panic!("expected cached translation, got {:?}", other),
        }
    }

    #[test]
    fn test_second_toggle_in_flight_is_ignored() {
        let mut overlay = TranslationOverlay::new("en");
        let id = MessageId(2);
        fetch_text(overlay.begin_toggle(id, "saya"));
        assert_eq!(overlay.begin_toggle(id, "saya"), ToggleStep::Ignored);
    }

    #[test]
    fn test_identical_translation_hides_control() {
        let mut overlay = TranslationOverlay::new("en");
        let id = MessageId(3);
        fetch_text(overlay.begin_toggle(id, "ok dia"));
        let update = overlay.complete(id, Some(" ok dia ".to_string())).unwrap();
        assert_eq!(update.control, ToggleControl::Hidden);
        assert_eq!(update.text, "ok dia");
        assert_eq!(overlay.begin_toggle(id, "ok dia"), ToggleStep::Ignored);
    }

    #[test]
    fn test_failure_restores_original() {
        let mut overlay = TranslationOverlay::new("en");
        let id = MessageId(4);
        fetch_text(overlay.begin_toggle(id, "tolong"));
        let update = overlay.complete(id, None).unwrap();
        assert_eq!(update.text, "tolong");
        assert_eq!(update.control, ToggleControl::Translate);

        // Control is usable again
        fetch_text(overlay.begin_toggle(id, "tolong"));
    }

    #[test]
    fn test_same_text_in_another_message_uses_cache() {
        let mut overlay = TranslationOverlay::new("en");
        fetch_text(overlay.begin_toggle(MessageId(1), "selamat pagi"));
        overlay.complete(MessageId(1), Some("good morning".to_string()));

        match overlay.begin_toggle(MessageId(7), "selamat pagi") {
            ToggleStep::Done(update) => assert_eq!(update.text, "good morning"),
            other => panic!("expected cache hit, got {:?}", other),
        }
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut overlay = TranslationOverlay::new("en");
        fetch_text(overlay.begin_toggle(MessageId(1), "selamat pagi"));
        overlay.complete(MessageId(1), Some("good morning".to_string()));
        overlay.clear();

        assert!(overlay.entry(MessageId(1)).is_none());
        fetch_text(overlay.begin_toggle(MessageId(1), "selamat pagi"));
    }

    #[test]
    fn test_completion_after_clear_is_discarded() {
        let mut overlay = TranslationOverlay::new("en");
        let id = MessageId(5);
        fetch_text(overlay.begin_toggle(id, "apa kabar"));
        overlay.clear();

        assert_eq!(overlay.complete(id, Some("how are you".to_string())), None);
        assert!(overlay.entry(id).is_none());

        // Nothing was cached either, so the next toggle fetches again
        fetch_text(overlay.begin_toggle(id, "apa kabar"));
    }
}
