//! Chat tabs
//!
//! Each tab keeps its backing message list and the wrapped lines currently
//! displayed. Layout runs through the event bus so independent features can
//! shrink the available width or filter lines without the tab knowing about
//! them. Widths are unicode display widths in host layout units.
//!
//! Listeners must not touch tab state while a tab drives a dispatch
//! (adding a message, refreshing); they mark the tab dirty or set a pending
//! jump instead, and the host refreshes after `post` returns.

use crate::bus::{ChatEvent, EventBus, EventKind, Key, LineHit, MessageId, Outcome};
use crate::config::ChatSettings;
use std::cell::RefCell;
use std::rc::Rc;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use uuid::Uuid;

/// One stored chat message
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: MessageId,
    pub content: String,
    pub sender: Option<Uuid>,
}

/// One wrapped line of a displayed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub message: MessageId,
    pub wrapped_index: usize,
    pub text: String,
}

pub use crate::bus::ScrollSpeed;

/// A chat tab: bounded message list plus displayed wrapped lines
pub struct ChatTab {
    pub name: String,
    messages: Vec<ChatMessage>,
    displayed: Vec<DisplayLine>,
    /// Lines scrolled up from the bottom
    scroll: usize,
    dirty: bool,
    pending_jump: Option<MessageId>,
    next_id: u64,
    max_messages: usize,
    wrap_width: usize,
    lines_per_page: usize,
}

impl ChatTab {
    pub fn new(name: impl Into<String>, settings: &ChatSettings) -> Self {
        Self {
            name: name.into(),
            messages: Vec::new(),
            displayed: Vec::new(),
            scroll: 0,
            dirty: false,
            pending_jump: None,
            next_id: 0,
            max_messages: settings.max_messages,
            wrap_width: settings.wrap_width,
            lines_per_page: settings.lines_per_page,
        }
    }

    /// Add an incoming message
    ///
    /// Posts `MessageReceived` so features can attribute a sender, stores
    /// the message, then lays it out through `DisplayLineQueued`.
    pub fn add_message(&mut self, bus: &EventBus, content: &str) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;

        let mut event = ChatEvent::MessageReceived {
            content: content.to_string(),
            sender: None,
        };
        bus.post(&mut event);
        let sender = match &event {
            ChatEvent::MessageReceived { sender, .. } => *sender,
            _ => None,
        };

        let message = ChatMessage {
            id,
            content: content.to_string(),
            sender,
        };
        layout_message(bus, &message, self.wrap_width, &mut self.displayed);
        self.messages.push(message);

        while self.messages.len() > self.max_messages {
            let trimmed = self.messages.remove(0);
            self.displayed.retain(|line| line.message != trimmed.id);
        }
        id
    }

    /// Rebuild all displayed lines through the bus so filters re-apply
    ///
    /// Resets the scroll to the bottom, then applies a pending jump.
    pub fn refresh(&mut self, bus: &EventBus) {
        let mut displayed = Vec::new();
        for message in &self.messages {
            layout_message(bus, message, self.wrap_width, &mut displayed);
        }
        self.displayed = displayed;
        self.scroll = 0;
        self.dirty = false;
        if let Some(id) = self.pending_jump.take() {
            self.jump_to(id);
        }
    }

    /// Scroll so `id`'s first line sits at the vertical center of the page
    pub fn jump_to(&mut self, id: MessageId) {
        let Some(index) = self.displayed.iter().position(|line| line.message == id) else {
            return;
        };
        let center_offset = self.lines_per_page / 2 + 1;
        self.scroll = self
            .displayed
            .len()
            .saturating_sub(index + center_offset)
            .min(self.max_scroll());
    }

    /// Scroll by a line delta, clamped to the displayed content
    pub fn scroll(&mut self, delta: i64) {
        let next = self.scroll as i64 + delta;
        self.scroll = next.clamp(0, self.max_scroll() as i64) as usize;
    }

    /// Scroll by wheel notches at the given speed
    pub fn scroll_by(&mut self, notches: i64, speed: ScrollSpeed) {
        self.scroll(notches * speed.lines());
    }

    /// Scroll by whole pages, keeping one line of overlap
    pub fn scroll_page(&mut self, pages: i64) {
        self.scroll(pages * self.lines_per_page.saturating_sub(1) as i64);
    }

    pub fn reset_scroll(&mut self) {
        self.scroll = 0;
    }

    fn max_scroll(&self) -> usize {
        self.displayed.len().saturating_sub(self.lines_per_page)
    }

    /// The currently visible window of displayed lines
    pub fn visible_page(&self) -> &[DisplayLine] {
        let len = self.displayed.len();
        let page = self.lines_per_page.min(len);
        let bottom = len - self.scroll.min(len - page);
        &self.displayed[bottom - page..bottom]
    }

    /// Resolve a row of the visible page (0 = top) to a line hit
    pub fn hit_at_visible(&self, row: usize) -> Option<LineHit> {
        self.visible_page().get(row).map(|line| LineHit {
            message: line.message,
            wrapped_index: line.wrapped_index,
        })
    }

    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn displayed(&self) -> &[DisplayLine] {
        &self.displayed
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Ask the host to refresh this tab after the current dispatch
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Center this message on the next refresh
    pub fn set_pending_jump(&mut self, id: MessageId) {
        self.pending_jump = Some(id);
    }
}

/// Lay out one message, appending its wrapped lines unless a listener
/// cancels it
fn layout_message(
    bus: &EventBus,
    message: &ChatMessage,
    wrap_width: usize,
    out: &mut Vec<DisplayLine>,
) {
    let mut event = ChatEvent::DisplayLineQueued {
        message: message.id,
        content: message.content.clone(),
        max_width: wrap_width,
        outcome: Outcome::default(),
    };
    bus.post(&mut event);
    if let ChatEvent::DisplayLineQueued {
        max_width, outcome, ..
    } = &event
    {
        if outcome.cancelled {
            return;
        }
        for (wrapped_index, text) in wrap_line(&message.content, *max_width)
            .into_iter()
            .enumerate()
        {
            out.push(DisplayLine {
                message: message.id,
                wrapped_index,
                text,
            });
        }
    }
}

/// All the tabs plus the selected index
///
/// Holds at least one tab at all times, so `selected` never fails.
pub struct TabList {
    tabs: Vec<ChatTab>,
    selected: usize,
}

impl TabList {
    /// Build a tab list with its initial (selected) tab
    pub fn new(initial: ChatTab) -> Self {
        Self {
            tabs: vec![initial],
            selected: 0,
        }
    }

    pub fn push(&mut self, tab: ChatTab) {
        self.tabs.push(tab);
    }

    /// Select a tab by index; out-of-range indices are ignored
    pub fn select(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.selected = index;
        }
    }

    pub fn selected(&self) -> &ChatTab {
        &self.tabs[self.selected]
    }

    pub fn selected_mut(&mut self) -> &mut ChatTab {
        &mut self.tabs[self.selected]
    }

    pub fn tabs(&self) -> &[ChatTab] {
        &self.tabs
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Wire tab reactions to host lifecycle events
    ///
    /// Closing the chat screen resets the selected tab's scroll. Page keys
    /// and the scroll wheel move the selected tab and consume the input so
    /// the host skips its default handling.
    pub fn register(bus: &mut EventBus, tabs: &Rc<RefCell<TabList>>) {
        let close_tabs = Rc::clone(tabs);
        bus.register(EventKind::ScreenClosed, "tabs-reset-scroll", move |_| {
            close_tabs.borrow_mut().selected_mut().reset_scroll();
        });

        let key_tabs = Rc::clone(tabs);
        bus.register(EventKind::KeyPressed, "tabs-page-keys", move |event| {
            let ChatEvent::KeyPressed { key, outcome, .. } = event else {
                return;
            };
            let pages = match key {
                Key::PageUp => 1,
                Key::PageDown => -1,
                _ => return,
            };
            key_tabs.borrow_mut().selected_mut().scroll_page(pages);
            outcome.cancel();
        });

        let wheel_tabs = Rc::clone(tabs);
        bus.register(EventKind::MouseScrolled, "tabs-wheel", move |event| {
            let ChatEvent::MouseScrolled {
                delta,
                speed,
                outcome,
            } = event
            else {
                return;
            };
            let lines = (delta.clamp(-1.0, 1.0) * speed.lines() as f64) as i64;
            wheel_tabs.borrow_mut().selected_mut().scroll(lines);
            outcome.cancel();
        });
    }
}

/// Wrap a line at word boundaries to fit within `max_width` display columns
///
/// Words wider than `max_width` are force-broken by character. A zero width
/// disables wrapping.
pub fn wrap_line(line: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 || UnicodeWidthStr::width(line) <= max_width {
        return vec![line.to_string()];
    }

    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in line.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);

        if !current.is_empty() && current_width + 1 + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }
        if !current.is_empty() {
            result.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
        } else {
            // Force-break an oversized word by character
            for c in word.chars() {
                let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
                if current_width + char_width > max_width && !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(c);
                current_width += char_width;
            }
        }
    }

    if !current.is_empty() {
        result.push(current);
    }
    result
}
