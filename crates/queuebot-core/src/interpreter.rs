//! Chat command interpreter.
//!
//! Turns one inbound chat line into at most one state mutation and at most
//! one reply. Only whole-message commands are recognised: the raw text must
//! start with `!`, and the trimmed, lower-cased line must equal a built-in
//! command word or a custom trigger exactly.

use crate::config::CommandsConfig;
use crate::state::{Changes, JoinOutcome, LeaveOutcome, QueueState};

/// One inbound chat message.
#[derive(Debug, Clone, Copy)]
pub struct ChatLine<'a> {
    /// Sender display name, case preserved.
    pub sender: &'a str,
    /// Raw message text.
    pub text: &'a str,
    /// Moderator or broadcaster.
    pub elevated: bool,
    /// Sent by the bot itself.
    pub self_message: bool,
}

/// What the engine should do after interpreting a line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatOutcome {
    /// Text to send back to the channel.
    pub reply: Option<String>,
    /// Documents to persist. Any change also triggers a broadcast.
    pub changes: Changes,
}

impl ChatOutcome {
    fn reply(text: String) -> Self {
        Self {
            reply: Some(text),
            changes: Changes::NONE,
        }
    }

    fn changed(text: Option<String>, changes: Changes) -> Self {
        Self {
            reply: text,
            changes,
        }
    }
}

/// Built-in chat commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Join,
    Leave,
    List,
    Advance,
    Stats,
}

impl Builtin {
    fn parse(words: &CommandsConfig, normalized: &str) -> Option<Self> {
        [
            (words.join.as_str(), Self::Join),
            (words.leave.as_str(), Self::Leave),
            (words.list.as_str(), Self::List),
            (words.advance.as_str(), Self::Advance),
            (words.stats.as_str(), Self::Stats),
        ]
        .into_iter()
        .find_map(|(word, cmd)| (word == normalized).then_some(cmd))
    }
}

/// Interpret `line` against `state`.
pub fn interpret(state: &mut QueueState, words: &CommandsConfig, line: &ChatLine<'_>) -> ChatOutcome {
    if line.self_message || !line.text.starts_with('!') {
        return ChatOutcome::default();
    }
    let normalized = line.text.trim().to_lowercase();
    let user = line.sender;

    match Builtin::parse(words, &normalized) {
        Some(Builtin::Join) => match state.join(user) {
            JoinOutcome::Joined { position } => ChatOutcome::changed(
                Some(format!(
                    "@{user} joined the queue ✅ You are at position {position}."
                )),
                Changes::QUEUE,
            ),
            JoinOutcome::AlreadyPlaying => {
                ChatOutcome::reply(format!("@{user} you are already playing."))
            }
            JoinOutcome::AlreadyQueued { position } => ChatOutcome::reply(format!(
                "@{user} you are already in the queue at position {position}."
            )),
        },
        Some(Builtin::Leave) => match state.leave(user) {
            LeaveOutcome::Left => ChatOutcome::changed(
                Some(format!("@{user} you left the queue. ❌")),
                Changes::QUEUE,
            ),
            LeaveOutcome::Playing => ChatOutcome::reply(format!(
                "@{user} you are already playing and can no longer leave this round."
            )),
            LeaveOutcome::NotQueued => {
                ChatOutcome::reply(format!("@{user} you are not in the queue."))
            }
        },
        Some(Builtin::List) => ChatOutcome::reply(format_queue(state)),
        Some(Builtin::Advance) if line.elevated => {
            state.advance();
            ChatOutcome::changed(None, Changes::QUEUE)
        }
        Some(Builtin::Stats) => ChatOutcome {
            reply: format_stats(state, user),
            changes: Changes::NONE,
        },
        // A non-elevated advance falls through to the custom triggers.
        Some(Builtin::Advance) | None => ChatOutcome {
            reply: state
                .find_command(&normalized)
                .map(|cmd| cmd.response.clone()),
            changes: Changes::NONE,
        },
    }
}

fn format_queue(state: &QueueState) -> String {
    if state.queue_len() == 0 {
        return String::from("📋 The queue is empty.");
    }
    let list = state
        .queue()
        .enumerate()
        .map(|(i, name)| format!("{}. {name}", i.saturating_add(1)))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("📋 Queue: {list}")
}

fn format_stats(state: &QueueState, user: &str) -> Option<String> {
    let record = state.stats_for(user)?;
    // Two-decimal display rounds halves away from zero.
    let average = (record.average()? * 100.0).round() / 100.0;
    Some(format!(
        "📊 {user} | W/L {}-{} | Legs {}-{} | Avg {average:.2}",
        record.wins, record.losses, record.legs_for, record.legs_against
    ))
}
