//! Find-in-chat
//!
//! While find is enabled the input box becomes a live filter over the
//! selected tab, and clicking a result jumps to that message with a short
//! highlight. Everything is wired through the bus; the tab only sees
//! cancelled display lines and a dirty flag.

use crate::bus::{ChatEvent, EventBus, EventKind, MessageId, MouseButton, Tick};
use crate::tabs::TabList;
use std::cell::RefCell;
use std::rc::Rc;

/// Find highlight color (ARGB)
pub const FIND_COLOR: u32 = 0xFFFF_FF55;

/// How long the jumped-to message stays highlighted, in ticks
const HIGHLIGHT_TICKS: Tick = 60;

/// Background highlight runs after ordinary appearance listeners
const HIGHLIGHT_PRIORITY: i32 = 10;

#[derive(Debug, Default)]
struct FindState {
    enabled: bool,
    filter: String,
    jumped_to: Option<JumpedTo>,
}

#[derive(Debug)]
struct JumpedTo {
    message: MessageId,
    wrapped_index: usize,
    deadline: Tick,
}

/// The find-in-chat feature
#[derive(Default)]
pub struct FindText {
    state: Rc<RefCell<FindState>>,
}

impl FindText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    /// Toggle find mode (bound to the host's find button)
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.enabled = enabled;
        if !enabled {
            state.filter.clear();
        }
    }

    /// Register all find listeners on the bus
    pub fn register(&self, bus: &mut EventBus, tabs: Rc<RefCell<TabList>>) {
        let state = Rc::clone(&self.state);
        bus.register(EventKind::ScreenClosed, "find-screen-close", move |_| {
            state.borrow_mut().enabled = false;
        });

        let state = Rc::clone(&self.state);
        bus.register(EventKind::TranslateToggled, "find-translate-toggle", move |_| {
            let mut state = state.borrow_mut();
            if state.enabled {
                state.enabled = false;
            }
        });

        let state = Rc::clone(&self.state);
        let filter_tabs = Rc::clone(&tabs);
        bus.register(EventKind::InputEdited, "find-filter-edit", move |event| {
            let ChatEvent::InputEdited { text, outcome } = event else {
                return;
            };
            let mut state = state.borrow_mut();
            if !state.enabled {
                return;
            }
            state.filter = text.clone();
            filter_tabs.borrow_mut().selected_mut().mark_dirty();
            outcome.cancel();
        });

        let state = Rc::clone(&self.state);
        bus.register(EventKind::DisplayLineQueued, "find-filter-line", move |event| {
            let ChatEvent::DisplayLineQueued {
                content, outcome, ..
            } = event
            else {
                return;
            };
            let state = state.borrow();
            if !state.enabled {
                return;
            }
            if !content
                .to_lowercase()
                .contains(&state.filter.to_lowercase())
            {
                outcome.cancel();
            }
        });

        let state = Rc::clone(&self.state);
        bus.register(EventKind::MouseClicked, "find-jump-click", move |event| {
            let ChatEvent::MouseClicked {
                button, hit, now, ..
            } = event
            else {
                return;
            };
            if *button != MouseButton::Left {
                return;
            }
            let mut state = state.borrow_mut();
            if !state.enabled {
                return;
            }
            let Some(hit) = hit else {
                return;
            };
            state.jumped_to = Some(JumpedTo {
                message: hit.message,
                wrapped_index: hit.wrapped_index,
                deadline: *now + HIGHLIGHT_TICKS,
            });
            state.enabled = false;
            state.filter.clear();
            let mut tabs = tabs.borrow_mut();
            let tab = tabs.selected_mut();
            tab.set_pending_jump(hit.message);
            tab.mark_dirty();
        });

        let state = Rc::clone(&self.state);
        bus.register_at(
            EventKind::LineAppearance,
            HIGHLIGHT_PRIORITY,
            "find-highlight",
            move |event| {
                let ChatEvent::LineAppearance {
                    message,
                    wrapped_index,
                    now,
                    background,
                } = event
                else {
                    return;
                };
                let state = state.borrow();
                let Some(jumped) = &state.jumped_to else {
                    return;
                };
                if jumped.message == *message
                    && jumped.wrapped_index == *wrapped_index
                    && *now <= jumped.deadline
                {
                    *background = Some(darker(FIND_COLOR));
                }
            },
        );
    }
}

/// Darken an ARGB color by the standard 0.7 factor, preserving alpha
fn darker(argb: u32) -> u32 {
    let scale = |channel: u32| ((channel & 0xFF) as f32 * 0.7) as u32;
    (argb & 0xFF00_0000)
        | (scale(argb >> 16) << 16)
        | (scale(argb >> 8) << 8)
        | scale(argb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Outcome;
    use crate::config::ChatSettings;
    use crate::tabs::ChatTab;

    fn setup() -> (EventBus, Rc<RefCell<TabList>>, FindText) {
        let mut bus = EventBus::new();
        let tabs = Rc::new(RefCell::new(TabList::new(ChatTab::new(
            "All",
            &ChatSettings {
                max_messages: 100,
                wrap_width: 80,
                lines_per_page: 4,
            },
        ))));
        let find = FindText::new();
        find.register(&mut bus, Rc::clone(&tabs));
        (bus, tabs, find)
    }

    fn edit_input(bus: &EventBus, text: &str) -> bool {
        let mut event = ChatEvent::InputEdited {
            text: text.to_string(),
            outcome: Outcome::default(),
        };
        bus.post(&mut event);
        match event {
            ChatEvent::InputEdited { outcome, .. } => outcome.cancelled,
            _ => false,
        }
    }

    #[test]
    fn test_filter_hides_non_matching_lines() {
        let (bus, tabs, find) = setup();
        {
            let mut tabs = tabs.borrow_mut();
            let tab = tabs.selected_mut();
            tab.add_message(&bus, "Alex: hello there");
            tab.add_message(&bus, "Sam: totally unrelated");
        }

        find.set_enabled(true);
        assert!(edit_input(&bus, "HELLO"));
        assert!(tabs.borrow().selected().is_dirty());

        tabs.borrow_mut().selected_mut().refresh(&bus);
        let tabs = tabs.borrow();
        let displayed = tabs.selected().displayed();
        assert_eq!(displayed.len(), 1);
        assert!(displayed[0].text.contains("hello"));
    }

    #[test]
    fn test_empty_filter_keeps_every_line() {
        let (bus, tabs, find) = setup();
        find.set_enabled(true);

        let mut event = ChatEvent::DisplayLineQueued {
            message: MessageId(0),
            content: "Alex: hello there".to_string(),
            max_width: 80,
            outcome: Outcome::default(),
        };
        bus.post(&mut event);
        match event {
            ChatEvent::DisplayLineQueued { outcome, .. } => assert!(!outcome.cancelled),
            _ => unreachable!(),
        }

        // Full layout agrees: nothing is filtered out
        {
            let mut tabs = tabs.borrow_mut();
            let tab = tabs.selected_mut();
            tab.add_message(&bus, "Alex: hello there");
            tab.add_message(&bus, "Sam: totally unrelated");
        }
        assert_eq!(tabs.borrow().selected().displayed().len(), 2);
    }

    #[test]
    fn test_edits_pass_through_when_disabled() {
        let (bus, tabs, _find) = setup();
        assert!(!edit_input(&bus, "hello"));
        assert!(!tabs.borrow().selected().is_dirty());
    }

    #[test]
    fn test_click_jumps_and_highlights_until_deadline() {
        let (bus, tabs, find) = setup();
        {
            let mut tabs = tabs.borrow_mut();
            let tab = tabs.selected_mut();
            for i in 0..10 {
                tab.add_message(&bus, &format!("message {i}"));
            }
        }

        find.set_enabled(true);
        let hit = tabs.borrow().selected().hit_at_visible(0);
        let mut click = ChatEvent::MouseClicked {
            button: MouseButton::Left,
            hit,
            now: 100,
            outcome: Outcome::default(),
        };
        bus.post(&mut click);

        assert!(!find.enabled());
        assert!(tabs.borrow().selected().is_dirty());
        tabs.borrow_mut().selected_mut().refresh(&bus);

        let hit = hit.unwrap();
        // Clicked message is visible after the jump
        assert!(tabs
            .borrow()
            .selected()
            .visible_page()
            .iter()
            .any(|line| line.message == hit.message));

        // Highlighted within the deadline
        let mut appearance = ChatEvent::LineAppearance {
            message: hit.message,
            wrapped_index: hit.wrapped_index,
            now: 130,
            background: None,
        };
        bus.post(&mut appearance);
        match appearance {
            ChatEvent::LineAppearance { background, .. } => {
                assert_eq!(background, Some(darker(FIND_COLOR)));
            }
            _ => unreachable!(),
        }

        // Not highlighted after the deadline
        let mut appearance = ChatEvent::LineAppearance {
            message: hit.message,
            wrapped_index: hit.wrapped_index,
            now: 200,
            background: None,
        };
        bus.post(&mut appearance);
        match appearance {
            ChatEvent::LineAppearance { background, .. } => assert_eq!(background, None),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_right_click_is_ignored() {
        let (bus, tabs, find) = setup();
        tabs.borrow_mut().selected_mut().add_message(&bus, "hello");

        find.set_enabled(true);
        let hit = tabs.borrow().selected().hit_at_visible(0);
        let mut click = ChatEvent::MouseClicked {
            button: MouseButton::Right,
            hit,
            now: 0,
            outcome: Outcome::default(),
        };
        bus.post(&mut click);
        assert!(find.enabled());
    }

    #[test]
    fn test_screen_close_disables_find() {
        let (bus, _tabs, find) = setup();
        find.set_enabled(true);
        bus.post(&mut ChatEvent::ScreenClosed);
        assert!(!find.enabled());
    }

    #[test]
    fn test_translate_toggle_disables_find() {
        let (bus, _tabs, find) = setup();
        find.set_enabled(true);
        bus.post(&mut ChatEvent::TranslateToggled { enabled: true });
        assert!(!find.enabled());
    }

    #[test]
    fn test_darker_matches_awt_factor() {
        // 0xFFFFFF55 darkened: 255 -> 178, 85 -> 59, alpha preserved
        assert_eq!(darker(FIND_COLOR), 0xFFB2_B23B);
    }
}
