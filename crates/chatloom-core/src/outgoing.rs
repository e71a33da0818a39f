//! Outgoing input
//!
//! Normalizes submitted input, records it in sent history, and routes it to
//! the host transport: a leading `/` sends a single command, anything else
//! is split into chunks the wire accepts.

use crate::history::SentHistory;

/// Longest message the chat wire accepts, in chars
pub const MAX_CHAT_MESSAGE_LEN: usize = 256;

/// Host-owned chat transport
pub trait OutboundChat {
    fn send_chat(&mut self, message: &str);
    /// `command` is passed without its leading slash
    fn send_command(&mut self, command: &str);
}

/// Trim and collapse internal whitespace runs to single spaces
pub fn normalize_message(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a message into wire-sized chunks on char boundaries
pub fn split_message(message: &str) -> Vec<String> {
    if message.chars().count() <= MAX_CHAT_MESSAGE_LEN {
        return vec![message.to_string()];
    }
    message
        .chars()
        .collect::<Vec<_>>()
        .chunks(MAX_CHAT_MESSAGE_LEN)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Handle submitted chat input
///
/// Empty input (after normalization) is dropped. Commands are recorded in
/// history with their slash and sent without it; chat text is split into
/// chunks, each recorded and sent separately.
pub fn handle_input(input: &str, history: &mut SentHistory, out: &mut dyn OutboundChat) {
    let normalized = normalize_message(input);
    if normalized.is_empty() {
        return;
    }
    if normalized.starts_with('/') {
        if let Some(command) = split_message(&normalized).into_iter().next() {
            history.add(&command);
            out.send_command(&command[1..]);
        }
        return;
    }
    for chunk in split_message(&normalized) {
        history.add(&chunk);
        out.send_chat(&chunk);
    }
}
