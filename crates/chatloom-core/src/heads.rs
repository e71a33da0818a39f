//! Player heads
//!
//! Attributes incoming messages to players by scanning the content for
//! known names, and caches name lookups so the host roster is only hit for
//! unseen names. Cached entries idle for ten minutes are evicted on the
//! host's minute timer. The head skin itself is drawn by the host; this
//! module only reserves layout room and serves cached head data.

use crate::bus::{ChatEvent, EventBus, EventKind};
use crate::config::HeadSettings;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Head sprite width in host layout units
pub const HEAD_WIDTH: usize = 8;
pub const HEAD_RIGHT_PADDING: usize = 2;
pub const HEAD_WIDTH_PADDED: usize = HEAD_WIDTH + HEAD_RIGHT_PADDING;

/// Idle time before a cached name lookup is evicted
const CACHE_EXPIRATION: Duration = Duration::from_secs(10 * 60);

/// Splits message content into candidate names: formatting codes (a `§`
/// plus the following char) and non-word characters are separators
static NAME_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(§.)|\W").expect("name split regex is valid"));

/// One roster entry, as the host resolves it
#[derive(Debug, Clone)]
pub struct PlayerProfile {
    pub uuid: Uuid,
    /// Skin texture identifier, opaque to this module
    pub skin: String,
    pub hat: bool,
}

/// Host-owned player roster
pub trait PlayerLookup {
    fn player_info(&self, name: &str) -> Option<PlayerProfile>;
}

/// Cached head render data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadData {
    pub skin: String,
    pub hat: bool,
}

struct TimedUuid {
    uuid: Uuid,
    last_used: Instant,
}

struct HeadState {
    settings: HeadSettings,
    name_uuids: HashMap<String, TimedUuid>,
    heads: HashMap<Uuid, HeadData>,
    lookup: Box<dyn PlayerLookup>,
}

impl HeadState {
    /// Resolve a candidate name through the cache, refreshing its idle timer
    fn cached(&mut self, name: &str, now: Instant) -> Option<Uuid> {
        let entry = self.name_uuids.get_mut(name)?;
        entry.last_used = now;
        Some(entry.uuid)
    }

    fn insert(&mut self, name: &str, profile: &PlayerProfile, now: Instant) {
        self.name_uuids.insert(
            name.to_string(),
            TimedUuid {
                uuid: profile.uuid,
                last_used: now,
            },
        );
        self.heads.insert(
            profile.uuid,
            HeadData {
                skin: profile.skin.clone(),
                hat: profile.hat,
            },
        );
    }

    /// Drop name entries idle past expiration, along with their heads
    fn evict(&mut self, now: Instant) {
        let mut expired = Vec::new();
        self.name_uuids.retain(|_, entry| {
            let keep = now.duration_since(entry.last_used) <= CACHE_EXPIRATION;
            if !keep {
                expired.push(entry.uuid);
            }
            keep
        });
        for uuid in expired {
            self.heads.remove(&uuid);
        }
    }

    fn attribute(&mut self, content: &str, now: Instant) -> Option<Uuid> {
        for word in NAME_SPLIT.split(content) {
            if word.is_empty() {
                continue;
            }
            if let Some(uuid) = self.cached(word, now) {
                return Some(uuid);
            }
            if let Some(profile) = self.lookup.player_info(word) {
                let uuid = profile.uuid;
                self.insert(word, &profile, now);
                return Some(uuid);
            }
        }
        None
    }
}

/// The player-head attribution feature
pub struct PlayerHeads {
    state: Rc<RefCell<HeadState>>,
}

impl PlayerHeads {
    pub fn new(settings: HeadSettings, lookup: Box<dyn PlayerLookup>) -> Self {
        Self {
            state: Rc::new(RefCell::new(HeadState {
                settings,
                name_uuids: HashMap::new(),
                heads: HashMap::new(),
                lookup,
            })),
        }
    }

    /// Cached head data for the host's renderer
    pub fn head_for(&self, uuid: Uuid) -> Option<HeadData> {
        self.state.borrow().heads.get(&uuid).cloned()
    }

    /// Whether the host should draw the head on wrapped continuation lines
    pub fn show_on_wrapped(&self) -> bool {
        self.state.borrow().settings.show_on_wrapped
    }

    /// Register all head listeners on the bus
    pub fn register(&self, bus: &mut EventBus) {
        let state = Rc::clone(&self.state);
        bus.register(EventKind::Minute, "heads-evict", move |event| {
            let ChatEvent::Minute { minute } = event else {
                return;
            };
            if *minute % 10 == 0 {
                state.borrow_mut().evict(Instant::now());
            }
        });

        let state = Rc::clone(&self.state);
        bus.register(EventKind::MessageReceived, "heads-attribute", move |event| {
            let ChatEvent::MessageReceived { content, sender } = event else {
                return;
            };
            let mut state = state.borrow_mut();
            if !state.settings.enabled {
                return;
            }
            if let Some(uuid) = state.attribute(content, Instant::now()) {
                *sender = Some(uuid);
            }
        });

        let state = Rc::clone(&self.state);
        bus.register(EventKind::DisplayLineQueued, "heads-reserve-width", move |event| {
            let ChatEvent::DisplayLineQueued { max_width, .. } = event else {
                return;
            };
            if state.borrow().settings.enabled {
                *max_width = max_width.saturating_sub(HEAD_WIDTH_PADDED);
            }
        });
    }
}
