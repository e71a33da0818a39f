//! Chat events
//!
//! The closed set of host-lifecycle occurrences features can react to.
//! Mutable side channels (sender attribution, width shrinking, cancellation,
//! background color) are explicit fields so each event's contract stays
//! auditable.

use serde::Serialize;
use uuid::Uuid;

/// Host timer tick (one per frame/game tick)
pub type Tick = u64;

/// Identifies one message within its tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageId(pub u64);

/// Mutable outcome shared by all listeners of one dispatch
///
/// Setting `cancelled` asks the host to skip its default handling of the
/// occurrence. It never stops dispatch to remaining listeners.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Outcome {
    pub cancelled: bool,
}

impl Outcome {
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keys the chat overlay may consume; everything else stays host-handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Key {
    Up,
    Down,
    PageUp,
    PageDown,
}

/// Scroll wheel speed, chosen by the host from held modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScrollSpeed {
    Fine,
    Normal,
    Large,
}

impl ScrollSpeed {
    /// Lines per wheel notch
    pub fn lines(self) -> i64 {
        match self {
            ScrollSpeed::Fine => 1,
            ScrollSpeed::Normal => 7,
            ScrollSpeed::Large => 21,
        }
    }
}

/// The display line under the cursor, resolved by the host's layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineHit {
    pub message: MessageId,
    pub wrapped_index: usize,
}

/// One host-lifecycle occurrence
#[derive(Debug, Clone, Serialize)]
pub enum ChatEvent {
    /// Chat screen opened
    ScreenOpened,
    /// Chat screen closed
    ScreenClosed,
    /// The input box content changed
    InputEdited { text: String, outcome: Outcome },
    /// A key went down while the chat screen was focused; listeners may
    /// rewrite `input` and cancel to consume the key
    KeyPressed {
        key: Key,
        input: String,
        outcome: Outcome,
    },
    /// The scroll wheel moved over the chat screen
    MouseScrolled {
        delta: f64,
        speed: ScrollSpeed,
        outcome: Outcome,
    },
    /// Mouse click forwarded by the chat screen
    MouseClicked {
        button: MouseButton,
        hit: Option<LineHit>,
        now: Tick,
        outcome: Outcome,
    },
    /// The translate-speak toggle flipped
    TranslateToggled { enabled: bool },
    /// A new incoming message; listeners may attribute a sender
    MessageReceived {
        content: String,
        sender: Option<Uuid>,
    },
    /// A message is about to be laid out; listeners may shrink the width
    /// or cancel (filter out) the line
    DisplayLineQueued {
        message: MessageId,
        content: String,
        max_width: usize,
        outcome: Outcome,
    },
    /// A visible line is about to be drawn; listeners may set a background
    LineAppearance {
        message: MessageId,
        wrapped_index: usize,
        now: Tick,
        background: Option<u32>,
    },
    /// Host timer tick
    Tick { now: Tick },
    /// Host minute timer
    Minute { minute: u64 },
}

/// Stable discriminant used to key the listener registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    ScreenOpened,
    ScreenClosed,
    InputEdited,
    KeyPressed,
    MouseScrolled,
    MouseClicked,
    TranslateToggled,
    MessageReceived,
    DisplayLineQueued,
    LineAppearance,
    Tick,
    Minute,
}

impl ChatEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChatEvent::ScreenOpened => EventKind::ScreenOpened,
            ChatEvent::ScreenClosed => EventKind::ScreenClosed,
            ChatEvent::InputEdited { .. } => EventKind::InputEdited,
            ChatEvent::KeyPressed { .. } => EventKind::KeyPressed,
            ChatEvent::MouseScrolled { .. } => EventKind::MouseScrolled,
            ChatEvent::MouseClicked { .. } => EventKind::MouseClicked,
            ChatEvent::TranslateToggled { .. } => EventKind::TranslateToggled,
            ChatEvent::MessageReceived { .. } => EventKind::MessageReceived,
            ChatEvent::DisplayLineQueued { .. } => EventKind::DisplayLineQueued,
            ChatEvent::LineAppearance { .. } => EventKind::LineAppearance,
            ChatEvent::Tick { .. } => EventKind::Tick,
            ChatEvent::Minute { .. } => EventKind::Minute,
        }
    }
}
