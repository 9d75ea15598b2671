//! Local send validation and display-name helpers.

use crate::error::SendRejection;
use crate::types::ChannelState;

/// Validate a local send intent and return the text that should go on the wire.
///
/// The text is trimmed. Whitespace-only input is rejected before the channel
/// state is considered, so an empty send never depends on connectivity.
pub fn prepare_outgoing_text(text: &str, state: ChannelState) -> Result<&str, SendRejection> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SendRejection::EmptyText);
    }
    if !state.is_open() {
        return Err(SendRejection::NotOpen(state));
    }
    Ok(trimmed)
}

/// Best-effort display name: the first character uppercased, the rest as-is.
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
