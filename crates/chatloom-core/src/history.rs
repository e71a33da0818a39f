//! Sent-message history
//!
//! Cursor navigation over previously sent messages, with the in-progress
//! input stashed when first leaving the end and restored when navigating
//! back past the newest entry. Messages identical to the most recent entry
//! are not recorded again.

use crate::bus::{ChatEvent, EventBus, EventKind, Key};
use std::cell::RefCell;
use std::rc::Rc;

/// Bounded history of sent messages with a navigation cursor
#[derive(Debug)]
pub struct SentHistory {
    entries: Vec<String>,
    /// Cursor position; `entries.len()` means "at the live input"
    cursor: usize,
    /// In-progress input stashed while navigating
    buffer: String,
    max_entries: usize,
}

impl SentHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            buffer: String::new(),
            max_entries,
        }
    }

    /// Record a sent message
    ///
    /// A message equal to the most recent entry is skipped, so duplicates
    /// sent back-to-back occupy one history slot.
    pub fn add(&mut self, message: &str) {
        if self.entries.last().is_some_and(|last| last == message) {
            self.cursor = self.entries.len();
            return;
        }
        self.entries.push(message.to_string());
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len();
    }

    /// Move the cursor to the live input end
    pub fn reset(&mut self) {
        self.cursor = self.entries.len();
        self.buffer.clear();
    }

    /// Move the cursor relative to its position: -1 is the previous
    /// message, 1 the next
    ///
    /// Returns the input box's new value when the cursor moved, `None`
    /// otherwise. `current` is the input box's present content, stashed
    /// when first leaving the end.
    pub fn navigate(&mut self, delta: i32, current: &str) -> Option<String> {
        let end = self.entries.len();
        let target = (self.cursor as i64 + delta as i64).clamp(0, end as i64) as usize;
        if target == self.cursor {
            return None;
        }
        if target == end {
            self.cursor = end;
            return Some(self.buffer.clone());
        }
        if self.cursor == end {
            self.buffer = current.to_string();
        }
        self.cursor = target;
        Some(self.entries[target].clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wire history reactions to host lifecycle events
    ///
    /// Opening the chat screen resets the cursor to the live input. Up and
    /// down keys move the cursor, rewrite the event's input, and consume
    /// the key; a key at a cursor boundary is left for other listeners.
    pub fn register(bus: &mut EventBus, history: &Rc<RefCell<SentHistory>>) {
        let open_history = Rc::clone(history);
        bus.register(EventKind::ScreenOpened, "history-reset", move |_| {
            open_history.borrow_mut().reset();
        });

        let key_history = Rc::clone(history);
        bus.register(EventKind::KeyPressed, "history-navigate", move |event| {
            let ChatEvent::KeyPressed {
                key,
                input,
                outcome,
            } = event
            else {
                return;
            };
            let delta = match key {
                Key::Up => -1,
                Key::Down => 1,
                _ => return,
            };
            if let Some(next) = key_history.borrow_mut().navigate(delta, input) {
                *input = next;
                outcome.cancel();
            }
        });
    }
}
