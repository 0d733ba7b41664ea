//! Context blocks appended to conversation prompts.

use super::event::{HistoryMessage, MessageEvent};

/// Stand-in for the assistant's own earlier replies in history.
pub const AI_PLACEHOLDER: &str = "[AI GENERATED CONTENT]";

/// Channel, server and interlocutor, appended to the system prompt.
pub fn metadata_header(event: &MessageEvent) -> String {
    let mut header = String::from("# Begin Context: Discord Metadata");
    header.push_str(&format!(
        "\nChannel: {}\nServer: {}",
        event.channel.name, event.guild.name
    ));
    if event.author.is_bot {
        header.push_str("\nYou are communicating with another bot.");
    } else {
        header.push_str(&format!("\nYou are communicating with {}", event.author.name));
    }
    header.push_str("\n# End Context: Discord Metadata");
    header
}

/// Recent channel messages, appended to the user turn.
///
/// Messages written by `self_id` are replaced by [`AI_PLACEHOLDER`] so the
/// model does not re-read its own output as fact.
pub fn history_block(messages: &[HistoryMessage], self_id: u64) -> String {
    let mut block = String::from("# Begin Context: Channel Message History\n");
    for msg in messages {
        let content = if msg.author.id == self_id {
            AI_PLACEHOLDER
        } else {
            msg.content.as_str()
        };
        block.push_str(&format!("{}: {content}\n", msg.author.name));
    }
    block.push_str("# End Context: Channel Message History\n");
    block
}
