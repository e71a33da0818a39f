//! chatloom-core - event-driven chat overlay toolkit
//!
//! Augments a host chat UI with tabs, find-in-chat, sent-message history,
//! and player-head attribution. Feature modules never call each other:
//! each one registers listeners on the [`EventBus`] during a
//! single-threaded startup phase, and the host posts [`ChatEvent`]s at its
//! lifecycle points (screen open/close, input edits, clicks, line layout,
//! line rendering, timers).
//!
//! The host owns rendering, widgets, and the network; where a feature needs
//! them it goes through a narrow seam ([`outgoing::OutboundChat`],
//! [`heads::PlayerLookup`]) or an event field the host fills in.

pub mod bus;
pub mod config;
pub mod find;
pub mod heads;
pub mod history;
pub mod outgoing;
pub mod tabs;

pub use bus::{
    ChatEvent, EventBus, EventKind, Key, LineHit, MessageId, MouseButton, Outcome, ScrollSpeed,
    Tick,
};
