//! chatloom - line-oriented demo host
//!
//! Drives the chatloom core through the same event surface a game client
//! would: stdin lines become incoming messages, input edits, clicks, and
//! timer ticks. Exists to exercise every event path end to end; rendering
//! here is plain text.

use anyhow::Result;
use chatloom_core::config::Config;
use chatloom_core::find::FindText;
use chatloom_core::heads::{PlayerHeads, PlayerLookup, PlayerProfile};
use chatloom_core::history::SentHistory;
use chatloom_core::outgoing::{self, OutboundChat};
use chatloom_core::tabs::{ChatTab, ScrollSpeed, TabList};
use chatloom_core::{ChatEvent, EventBus, Key, MouseButton, Outcome, Tick};
use clap::Parser;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use std::rc::Rc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "chatloom", about = "Demo host for the chatloom chat overlay toolkit")]
struct Args {
    /// Path to the config file (defaults to ~/.chatloom/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log posted events
    #[arg(short, long)]
    verbose: bool,
}

/// Fixed roster standing in for the host's player list
struct Roster {
    players: HashMap<String, PlayerProfile>,
}

impl Roster {
    fn demo() -> Self {
        let mut players = HashMap::new();
        for name in ["Alex", "Sam", "Robin"] {
            players.insert(
                name.to_string(),
                PlayerProfile {
                    uuid: Uuid::new_v4(),
                    skin: format!("skin/{name}"),
                    hat: true,
                },
            );
        }
        Self { players }
    }
}

impl PlayerLookup for Roster {
    fn player_info(&self, name: &str) -> Option<PlayerProfile> {
        self.players.get(name).cloned()
    }
}

/// Transport that prints instead of hitting the wire
struct StdoutChat;

impl OutboundChat for StdoutChat {
    fn send_chat(&mut self, message: &str) {
        println!("-> chat: {message}");
    }

    fn send_command(&mut self, command: &str) {
        println!("-> command: /{command}");
    }
}

struct Host {
    bus: EventBus,
    tabs: Rc<RefCell<TabList>>,
    history: Rc<RefCell<SentHistory>>,
    find: FindText,
    heads: PlayerHeads,
    out: StdoutChat,
    /// The edit box stand-in
    input: String,
    translate_enabled: bool,
    now: Tick,
}

impl Host {
    fn new(config: &Config) -> Self {
        let mut bus = EventBus::new();

        let tabs = Rc::new(RefCell::new(TabList::new(ChatTab::new("All", &config.chat))));
        TabList::register(&mut bus, &tabs);

        let history = Rc::new(RefCell::new(SentHistory::new(100)));
        SentHistory::register(&mut bus, &history);

        let find = FindText::new();
        find.register(&mut bus, Rc::clone(&tabs));

        let heads = PlayerHeads::new(config.player_heads.clone(), Box::new(Roster::demo()));
        heads.register(&mut bus);

        // Registration phase over; the bus is read-only from here on
        Self {
            bus,
            tabs,
            history,
            find,
            heads,
            out: StdoutChat,
            input: String::new(),
            translate_enabled: config.translate.enabled,
            now: 0,
        }
    }

    fn post(&self, event: &mut ChatEvent) {
        self.bus.post(event);
        match serde_json::to_string(event) {
            Ok(json) => tracing::debug!(event = %json, "posted"),
            Err(error) => tracing::debug!(%error, "posted (unserializable event)"),
        }
    }

    fn run(&mut self) -> Result<()> {
        println!("chatloom demo. @Name: text = incoming message, :help for commands.");
        self.post(&mut ChatEvent::ScreenOpened);

        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == ":quit" || line == ":q" {
                break;
            }
            self.handle_line(line);
            self.flush();
            self.render();
        }
        self.post(&mut ChatEvent::ScreenClosed);
        Ok(())
    }

    fn handle_line(&mut self, line: &str) {
        if let Some(content) = line.strip_prefix('@') {
            self.tabs
                .borrow_mut()
                .selected_mut()
                .add_message(&self.bus, content);
            return;
        }
        if let Some(command) = line.strip_prefix(':') {
            self.handle_command(command);
            return;
        }

        // Everything else goes through the input box
        let mut event = ChatEvent::InputEdited {
            text: line.to_string(),
            outcome: Outcome::default(),
        };
        self.post(&mut event);
        let cancelled = match &event {
            ChatEvent::InputEdited { outcome, .. } => outcome.cancelled,
            _ => false,
        };
        if cancelled {
            // A feature (find) consumed the edit
            self.input = line.to_string();
            return;
        }
        self.input = line.to_string();
        self.submit();
    }

    fn handle_command(&mut self, command: &str) {
        let mut parts = command.split_whitespace();
        match parts.next().unwrap_or_default() {
            "help" => print_help(),
            "open" => self.post(&mut ChatEvent::ScreenOpened),
            "close" => self.post(&mut ChatEvent::ScreenClosed),
            "find" => {
                let enabled = !self.find.enabled();
                self.find.set_enabled(enabled);
                if !enabled {
                    self.tabs.borrow_mut().selected_mut().mark_dirty();
                }
                println!("find {}", if enabled { "on" } else { "off" });
            }
            "translate" => {
                self.translate_enabled = !self.translate_enabled;
                let enabled = self.translate_enabled;
                self.post(&mut ChatEvent::TranslateToggled { enabled });
                println!("translate speak {}", if enabled { "on" } else { "off" });
            }
            "up" | "down" => {
                let key = if command.starts_with("up") { Key::Up } else { Key::Down };
                self.press_key(key);
                println!("input> {}", self.input);
            }
            "send" => self.submit(),
            "click" => {
                let row = parts.next().and_then(|n| n.parse().ok()).unwrap_or(0);
                let hit = self.tabs.borrow().selected().hit_at_visible(row);
                let now = self.now;
                self.post(&mut ChatEvent::MouseClicked {
                    button: MouseButton::Left,
                    hit,
                    now,
                    outcome: Outcome::default(),
                });
            }
            "scroll" => {
                let notches: i64 = parts.next().and_then(|n| n.parse().ok()).unwrap_or(1);
                let speed = match parts.next() {
                    Some("fine") => ScrollSpeed::Fine,
                    Some("large") => ScrollSpeed::Large,
                    _ => ScrollSpeed::Normal,
                };
                // One event per wheel notch, like a real wheel
                let delta = if notches < 0 { -1.0 } else { 1.0 };
                for _ in 0..notches.unsigned_abs() {
                    self.post(&mut ChatEvent::MouseScrolled {
                        delta,
                        speed,
                        outcome: Outcome::default(),
                    });
                }
            }
            "page" => {
                let key = if parts.next() == Some("down") {
                    Key::PageDown
                } else {
                    Key::PageUp
                };
                self.press_key(key);
            }
            "tab" => {
                if let Some(index) = parts.next().and_then(|n| n.parse().ok()) {
                    self.tabs.borrow_mut().select(index);
                }
            }
            "tick" => {
                let ticks: u64 = parts.next().and_then(|n| n.parse().ok()).unwrap_or(1);
                self.now += ticks;
                let now = self.now;
                self.post(&mut ChatEvent::Tick { now });
            }
            "minute" => {
                let minute = parts.next().and_then(|n| n.parse().ok()).unwrap_or(0);
                self.post(&mut ChatEvent::Minute { minute });
            }
            other => println!("unknown command :{other} (try :help)"),
        }
    }

    /// Forward a key press through the bus, adopting a rewritten input
    /// when a listener consumed the key
    fn press_key(&mut self, key: Key) {
        let mut event = ChatEvent::KeyPressed {
            key,
            input: self.input.clone(),
            outcome: Outcome::default(),
        };
        self.post(&mut event);
        if let ChatEvent::KeyPressed { input, outcome, .. } = event {
            if outcome.cancelled {
                self.input = input;
            }
        }
    }

    /// Submit the current input as outgoing chat
    fn submit(&mut self) {
        let input = std::mem::take(&mut self.input);
        outgoing::handle_input(&input, &mut self.history.borrow_mut(), &mut self.out);
    }

    /// Refresh the selected tab if a listener marked it dirty
    fn flush(&mut self) {
        let dirty = self.tabs.borrow().selected().is_dirty();
        if dirty {
            self.tabs.borrow_mut().selected_mut().refresh(&self.bus);
        }
    }

    /// Print the visible page, driving the per-line appearance event
    fn render(&self) {
        let tabs = self.tabs.borrow();
        let tab = tabs.selected();
        println!("--- {} ---", tab.name);
        for line in tab.visible_page() {
            let mut event = ChatEvent::LineAppearance {
                message: line.message,
                wrapped_index: line.wrapped_index,
                now: self.now,
                background: None,
            };
            self.post(&mut event);
            let highlighted = matches!(
                event,
                ChatEvent::LineAppearance {
                    background: Some(_),
                    ..
                }
            );

            let show_head = line.wrapped_index == 0 || self.heads.show_on_wrapped();
            let head = tab
                .message(line.message)
                .and_then(|message| message.sender)
                .and_then(|sender| self.heads.head_for(sender))
                .filter(|_| show_head);
            let marker = if head.is_some() { "()" } else { "  " };
            let tail = if highlighted { "  <<" } else { "" };
            println!("{marker} {}{tail}", line.text);
        }
    }
}

fn print_help() {
    println!(
        "\
@Name: text      incoming message
text             edit the input box (submits unless find consumes it)
:find            toggle find-in-chat
:click N         click row N of the visible page
:up / :down      navigate sent history
:send            submit the current input
:scroll N [fine|large]   scroll by N wheel notches
:page up|down    scroll by a page
:tab N           select tab N
:tick N          advance the game clock
:minute N        fire the minute timer
:translate       toggle translate speak
:open / :close   chat screen lifecycle
:quit            exit"
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config = Config::load(args.config.as_deref())?;
    Host::new(&config).run()
}
