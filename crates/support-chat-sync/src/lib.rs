//! Sync engine of the support chat widget.
//!
//! A [`SupportWidget`] keeps an end-user's view of their support conversation
//! current by polling while the panel is open and probing the unread count
//! while it is closed. An [`AdminConsole`] drives the staff side of a single
//! ticket. Both publish [`WidgetEvent`]s for a shell to draw.
//!
//! The pieces are usable on their own:
//!
//! - [`SyncCursor`]: high-water mark and fetch ordering
//! - [`DeltaRenderer`]: snapshot to view, with new-message highlighting
//! - [`NotificationCenter`]: unread counter and notification rules
//! - [`TranslationOverlay`]: per-message translate and revert
//! - [`PollScheduler`]: fixed-interval timer with cancellation
//!
//! [`WidgetEvent`]: support_chat_types::WidgetEvent

pub mod admin;
pub mod cursor;
pub mod language;
pub mod notify;
pub mod render;
pub mod scheduler;
pub mod testing;
pub mod translate;
pub mod widget;

pub use admin::AdminConsole;
pub use cursor::{FetchSeq, SyncCursor};
pub use language::needs_translation;
pub use notify::{Generation, LogNotifier, NotificationCenter, Notifier, UnreadOutcome, UnreadSource};
pub use render::{DeltaRenderer, Perspective};
pub use scheduler::{PollScheduler, SchedulerState};
pub use translate::{DisplayState, ToggleStep, TranslationEntry, TranslationOverlay, TranslationUpdate};
pub use widget::SupportWidget;

use std::sync::{Mutex, MutexGuard};

/// Lock a state mutex. A panic while holding it leaves plain data behind, so
/// poisoning is ignored.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
