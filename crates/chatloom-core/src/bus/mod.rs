//! Event bus
//!
//! Priority-ordered synchronous multicast dispatch. Feature modules register
//! listeners during a single-threaded startup phase; once the host starts
//! posting events the registry is read-only, so there is no lock. Lower
//! priority values run first; ties run in registration order.
//!
//! A panicking listener is caught at the dispatch boundary, logged, and
//! skipped - one feature's defect must not disable another feature's
//! reaction to the same event.

mod events;

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub use events::{
    ChatEvent, EventKind, Key, LineHit, MessageId, MouseButton, Outcome, ScrollSpeed, Tick,
};

/// Priority used by listeners that don't care about ordering
pub const DEFAULT_PRIORITY: i32 = 0;

type Handler = Box<dyn Fn(&mut ChatEvent)>;

struct Registration {
    priority: i32,
    /// Static listener identity, used only for diagnostics
    tag: &'static str,
    handler: Handler,
}

/// Registry of typed listeners, invoked in priority order on `post`
#[derive(Default)]
pub struct EventBus {
    registry: HashMap<EventKind, Vec<Registration>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener at [`DEFAULT_PRIORITY`]
    pub fn register<F>(&mut self, kind: EventKind, tag: &'static str, handler: F)
    where
        F: Fn(&mut ChatEvent) + 'static,
    {
        self.register_at(kind, DEFAULT_PRIORITY, tag, handler);
    }

    /// Register a listener at an explicit priority
    ///
    /// Lower values run first. Equal priorities run in registration order.
    pub fn register_at<F>(&mut self, kind: EventKind, priority: i32, tag: &'static str, handler: F)
    where
        F: Fn(&mut ChatEvent) + 'static,
    {
        let registrations = self.registry.entry(kind).or_default();
        // Insert after the last equal priority to keep ties stable
        let pos = registrations.partition_point(|r| r.priority <= priority);
        registrations.insert(
            pos,
            Registration {
                priority,
                tag,
                handler: Box::new(handler),
            },
        );
    }

    /// Dispatch an event to every listener registered for its kind
    ///
    /// Mutations to the event are visible to later listeners and to the
    /// caller. A listener cancelling the event's outcome does not stop
    /// dispatch; a panicking listener is logged and skipped. Posting a kind
    /// with no listeners is a no-op.
    pub fn post(&self, event: &mut ChatEvent) {
        let Some(registrations) = self.registry.get(&event.kind()) else {
            return;
        };
        for registration in registrations {
            let result = catch_unwind(AssertUnwindSafe(|| (registration.handler)(event)));
            if let Err(panic) = result {
                tracing::error!(
                    kind = ?event.kind(),
                    listener = registration.tag,
                    priority = registration.priority,
                    panic = panic_message(panic.as_ref()),
                    "chat event listener panicked, continuing dispatch"
                );
            }
        }
    }

    /// Number of listeners registered for a kind
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry.get(&kind).map_or(0, Vec::len)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn log_handler(
        log: &Rc<RefCell<Vec<&'static str>>>,
        entry: &'static str,
    ) -> impl Fn(&mut ChatEvent) + 'static {
        let log = Rc::clone(log);
        move |_| log.borrow_mut().push(entry)
    }

    #[test]
    fn test_priority_order_with_stable_ties() {
        // A (priority 5), B (priority 1), C (priority 5), registered in
        // that order: B runs first, then A and C in registration order.
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.register_at(EventKind::Tick, 5, "a", log_handler(&log, "A"));
        bus.register_at(EventKind::Tick, 1, "b", log_handler(&log, "B"));
        bus.register_at(EventKind::Tick, 5, "c", log_handler(&log, "C"));

        bus.post(&mut ChatEvent::Tick { now: 0 });
        assert_eq!(*log.borrow(), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_post_without_listeners_is_noop() {
        let bus = EventBus::new();
        bus.post(&mut ChatEvent::Tick { now: 0 });
        assert_eq!(bus.listener_count(EventKind::Tick), 0);
    }

    #[test]
    fn test_cancel_is_visible_but_does_not_stop_dispatch() {
        let observed = Rc::new(RefCell::new(None));
        let mut bus = EventBus::new();
        bus.register_at(EventKind::InputEdited, 0, "canceller", |event| {
            if let ChatEvent::InputEdited { outcome, .. } = event {
                outcome.cancel();
            }
        });
        let seen = Rc::clone(&observed);
        bus.register_at(EventKind::InputEdited, 1, "observer", move |event| {
            if let ChatEvent::InputEdited { outcome, .. } = event {
                *seen.borrow_mut() = Some(outcome.cancelled);
            }
        });

        let mut event = ChatEvent::InputEdited {
            text: "hi".to_string(),
            outcome: Outcome::default(),
        };
        bus.post(&mut event);

        // The later listener ran and saw the earlier listener's write
        assert_eq!(*observed.borrow(), Some(true));
        // The caller sees it too
        match event {
            ChatEvent::InputEdited { outcome, .. } => assert!(outcome.cancelled),
            _ => panic!("variant changed during dispatch"),
        }
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let counter = Rc::new(RefCell::new(0u32));
        let mut bus = EventBus::new();
        bus.register(EventKind::Tick, "faulty", |_| panic!("listener fault"));
        let count = Rc::clone(&counter);
        bus.register(EventKind::Tick, "counter", move |_| {
            *count.borrow_mut() += 1;
        });

        bus.post(&mut ChatEvent::Tick { now: 1 });
        bus.post(&mut ChatEvent::Tick { now: 2 });
        assert_eq!(*counter.borrow(), 2);
    }

    #[test]
    fn test_panicking_listener_does_not_affect_other_kinds() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.register(EventKind::Tick, "faulty", |_| panic!("listener fault"));
        bus.register(EventKind::ScreenClosed, "closer", log_handler(&log, "closed"));

        bus.post(&mut ChatEvent::Tick { now: 1 });
        bus.post(&mut ChatEvent::ScreenClosed);
        assert_eq!(*log.borrow(), vec!["closed"]);
    }

    #[test]
    fn test_caller_observes_event_mutation() {
        let mut bus = EventBus::new();
        let uuid = uuid::Uuid::new_v4();
        bus.register(EventKind::MessageReceived, "attributor", move |event| {
            if let ChatEvent::MessageReceived { sender, .. } = event {
                *sender = Some(uuid);
            }
        });

        let mut event = ChatEvent::MessageReceived {
            content: "hello".to_string(),
            sender: None,
        };
        bus.post(&mut event);
        match event {
            ChatEvent::MessageReceived { sender, .. } => assert_eq!(sender, Some(uuid)),
            _ => panic!("variant changed during dispatch"),
        }
    }

    #[test]
    fn test_listeners_only_run_for_their_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.register(EventKind::Tick, "tick", log_handler(&log, "tick"));
        bus.register(EventKind::Minute, "minute", log_handler(&log, "minute"));

        bus.post(&mut ChatEvent::Minute { minute: 1 });
        assert_eq!(*log.borrow(), vec!["minute"]);
    }
}
