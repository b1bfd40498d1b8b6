//! Snapshot assembly.

use queuebot_types::{
    AnnouncementView, ChannelSettings, ChatStatus, CommandView, SettingsView, Snapshot,
};

use crate::scheduler;
use crate::state::QueueState;

/// Build the full client snapshot at `now_ms`.
pub fn build(
    state: &QueueState,
    settings: &ChannelSettings,
    status: ChatStatus,
    now_ms: i64,
) -> Snapshot {
    Snapshot {
        current: state.current().map(str::to_owned),
        next: state.next().map(str::to_owned),
        queue: state.queue().map(str::to_owned).collect(),
        loop_messages: state
            .announcements()
            .iter()
            .map(|a| AnnouncementView {
                id: a.id.clone(),
                message: a.message.clone(),
                interval_minutes: a.interval_minutes,
                enabled: a.enabled,
                next_send_in_seconds: scheduler::seconds_until_due(a, now_ms),
            })
            .collect(),
        custom_commands: state
            .commands()
            .iter()
            .map(|c| CommandView {
                id: c.id.clone(),
                name: c.name.clone(),
                response: c.response.clone(),
            })
            .collect(),
        settings: SettingsView {
            channel: settings.channel.clone(),
            setup_completed: settings.setup_completed,
            bot_connected: status.is_connected(),
            bot_status: status,
        },
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_state() {
        let mut state = QueueState::new();
        state.join("a");
        state.join("b");
        state.join("c");
        state.advance();
        let _ = state.add_announcement("hi", 2.0, 1_000);
        let _ = state.add_command("!x", "y");
        let settings = ChannelSettings {
            channel: String::from("chan"),
            setup_completed: true,
            ..ChannelSettings::default()
        };

        let snap = build(&state, &settings, ChatStatus::Connected, 31_000);
        assert_eq!(snap.current.as_deref(), Some("a"));
        assert_eq!(snap.next.as_deref(), Some("b"));
        assert_eq!(snap.queue, vec!["b".to_owned(), "c".to_owned()]);
        assert_eq!(snap.loop_messages[0].next_send_in_seconds, 90);
        assert_eq!(snap.custom_commands[0].name, "!x");
        assert!(snap.settings.bot_connected);
        assert_eq!(snap.settings.channel, "chan");
    }

    #[test]
    fn connecting_is_not_connected() {
        let snap = build(
            &QueueState::new(),
            &ChannelSettings::default(),
            ChatStatus::Connecting,
            0,
        );
        assert!(!snap.settings.bot_connected);
        assert_eq!(snap.settings.bot_status, ChatStatus::Connecting);
        assert!(snap.next.is_none());
    }
}
