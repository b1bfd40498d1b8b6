//! Scheduled announcement timing.
//!
//! An announcement is due when it is enabled and at least one interval has
//! elapsed since `last_sent_at`. A record without `last_sent_at` counts as
//! never sent for dispatch (due at once) but as just sent for the
//! countdown shown to clients.

use queuebot_types::ScheduledAnnouncement;

/// Whether `announcement` should be sent at `now_ms`.
#[allow(clippy::cast_precision_loss)]
pub fn is_due(announcement: &ScheduledAnnouncement, now_ms: i64) -> bool {
    if !announcement.enabled {
        return false;
    }
    let last = announcement.last_sent_at.unwrap_or(0);
    let elapsed = now_ms.saturating_sub(last) as f64;
    elapsed >= announcement.interval_ms()
}

/// Collect the messages of every due announcement and stamp each one as
/// sent at `now_ms`. Returned in list order.
pub fn take_due(announcements: &mut [ScheduledAnnouncement], now_ms: i64) -> Vec<String> {
    announcements
        .iter_mut()
        .filter(|a| is_due(a, now_ms))
        .map(|a| {
            a.last_sent_at = Some(now_ms);
            a.message.clone()
        })
        .collect()
}

/// Whole seconds until `announcement` is next due, rounded up and never
/// negative.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn seconds_until_due(announcement: &ScheduledAnnouncement, now_ms: i64) -> u64 {
    let last = announcement.last_sent_at.unwrap_or(now_ms);
    let due_at = last as f64 + announcement.interval_ms();
    let remaining = ((due_at - now_ms as f64) / 1000.0).ceil();
    if remaining.is_finite() && remaining > 0.0 {
        remaining as u64
    } else {
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use queuebot_types::AnnouncementId;

    use super::*;
    use crate::state::QueueState;

    fn announcement(interval_minutes: f64, enabled: bool, last: Option<i64>) -> ScheduledAnnouncement {
        ScheduledAnnouncement {
            id: AnnouncementId::from("a"),
            message: String::from("hello chat"),
            interval_minutes,
            enabled,
            last_sent_at: last,
        }
    }

    #[test]
    fn fires_after_interval_when_enabled() {
        let now = 1_000_000;
        assert!(is_due(&announcement(1.0, true, Some(now - 61_000)), now));
        assert!(!is_due(&announcement(1.0, false, Some(now - 61_000)), now));
        assert!(!is_due(&announcement(1.0, true, Some(now - 59_000)), now));
        assert!(is_due(&announcement(1.0, true, Some(now - 60_000)), now));
    }

    #[test]
    fn missing_timestamp_is_due_immediately() {
        assert!(is_due(&announcement(10.0, true, None), 1_700_000_000_000));
    }

    #[test]
    fn take_due_stamps_only_fired() {
        let now = 5_000_000;
        let mut list = vec![
            announcement(1.0, true, Some(now - 120_000)),
            announcement(1.0, true, Some(now - 1_000)),
            announcement(1.0, false, None),
        ];
        let sent = take_due(&mut list, now);
        assert_eq!(sent, vec![String::from("hello chat")]);
        assert_eq!(list[0].last_sent_at, Some(now));
        assert_eq!(list[1].last_sent_at, Some(now - 1_000));
        assert_eq!(list[2].last_sent_at, None);
        assert!(take_due(&mut list, now).is_empty());
    }

    #[test]
    fn countdown_rounds_up_and_clamps() {
        let now = 10_000_000;
        assert_eq!(seconds_until_due(&announcement(1.0, true, Some(now)), now), 60);
        assert_eq!(
            seconds_until_due(&announcement(1.0, true, Some(now - 500)), now),
            60
        );
        assert_eq!(
            seconds_until_due(&announcement(1.0, true, Some(now - 90_000)), now),
            0
        );
        assert_eq!(seconds_until_due(&announcement(0.5, true, None), now), 30);
    }

    #[test]
    fn toggle_rearms_from_second_toggle() {
        let mut state = QueueState::new();
        let id = state.add_announcement("hello chat", 1.0, 0).unwrap();
        assert!(is_due(&state.announcements()[0], 60_000));

        state.toggle_announcement(id.as_str(), false, 30_000).unwrap();
        assert!(!is_due(&state.announcements()[0], 100_000));

        state.toggle_announcement(id.as_str(), true, 90_000).unwrap();
        let armed = &state.announcements()[0];
        assert_eq!(armed.last_sent_at, Some(90_000));
        assert!(!is_due(armed, 100_000));
        assert!(!is_due(armed, 149_999));
        assert!(is_due(armed, 150_000));
        assert_eq!(seconds_until_due(armed, 90_000), 60);
    }
}
