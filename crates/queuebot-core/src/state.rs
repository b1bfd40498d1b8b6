//! The authoritative in-memory state model.
//!
//! [`QueueState`] owns the waiting list, the player on turn, the stats
//! table, the scheduled announcements and the custom commands. It performs
//! no I/O: every mutation returns a [`Changes`] set (or a [`Rejected`]
//! reason) and the engine decides what to persist and broadcast.
//!
//! Queue identity is case-insensitive while display is case-preserving:
//! `alice` and `Alice` are the same entry, and the entry keeps whichever
//! spelling joined first. Stats are keyed by the exact name.

use std::collections::VecDeque;

use queuebot_types::{
    AnnouncementId, CommandId, CustomCommand, QueueDocument, ScheduledAnnouncement, StatsDocument,
    StatsRecord,
};

/// Which persisted documents a mutation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Changes {
    /// Queue or current player changed.
    pub queue: bool,
    /// Stats table changed.
    pub stats: bool,
    /// Announcement list changed.
    pub announcements: bool,
    /// Custom command list changed.
    pub commands: bool,
    /// Channel settings changed.
    pub settings: bool,
}

impl Changes {
    /// No documents touched.
    pub const NONE: Self = Self {
        queue: false,
        stats: false,
        announcements: false,
        commands: false,
        settings: false,
    };

    /// Only the queue document.
    pub const QUEUE: Self = Self {
        queue: true,
        ..Self::NONE
    };

    /// Only the announcement list.
    pub const ANNOUNCEMENTS: Self = Self {
        announcements: true,
        ..Self::NONE
    };

    /// Only the custom command list.
    pub const COMMANDS: Self = Self {
        commands: true,
        ..Self::NONE
    };

    /// Only the channel settings.
    pub const SETTINGS: Self = Self {
        settings: true,
        ..Self::NONE
    };

    /// Whether any document was touched.
    pub const fn any(self) -> bool {
        self.queue || self.stats || self.announcements || self.commands || self.settings
    }

    /// Union of two change sets.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            queue: self.queue || other.queue,
            stats: self.stats || other.stats,
            announcements: self.announcements || other.announcements,
            commands: self.commands || other.commands,
            settings: self.settings || other.settings,
        }
    }
}

/// Why a requested mutation was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    /// Nobody is on turn.
    #[error("no current player")]
    NoCurrentPlayer,
    /// Announcement text is empty after trimming.
    #[error("announcement message is empty")]
    EmptyMessage,
    /// Interval is not a finite positive number.
    #[error("interval must be a positive number of minutes")]
    InvalidInterval,
    /// Trigger does not start with `!`.
    #[error("command name must start with '!'")]
    InvalidTrigger,
    /// Response is empty after trimming.
    #[error("command response is empty")]
    EmptyResponse,
    /// Another command already owns the trigger.
    #[error("command name already in use")]
    DuplicateTrigger,
    /// Nothing with the given id exists.
    #[error("unknown id")]
    UnknownId,
    /// The result would push a stats total past the largest finite value.
    #[error("stats total out of range")]
    StatsOverflow,
    /// Nothing with the given name exists.
    #[error("name not in queue")]
    UnknownName,
    /// Channel name is empty after trimming.
    #[error("channel missing")]
    EmptyChannel,
}

/// Result of a join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Appended to the tail at the given 1-based position.
    Joined {
        /// 1-based queue position.
        position: usize,
    },
    /// The sender is the current player.
    AlreadyPlaying,
    /// The sender is already queued.
    AlreadyQueued {
        /// 1-based queue position.
        position: usize,
    },
}

/// Result of a leave attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Removed from the queue.
    Left,
    /// The sender is the current player and cannot leave.
    Playing,
    /// The sender was not queued.
    NotQueued,
}

/// Queue, current player, stats, announcements and custom commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueState {
    queue: VecDeque<String>,
    current: Option<String>,
    stats: StatsDocument,
    announcements: Vec<ScheduledAnnouncement>,
    commands: Vec<CustomCommand>,
}

impl QueueState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild state from loaded documents.
    ///
    /// Case-insensitive duplicates in the stored queue, and a stored entry
    /// matching the current player, are dropped.
    pub fn from_documents(
        queue: QueueDocument,
        stats: StatsDocument,
        announcements: Vec<ScheduledAnnouncement>,
        commands: Vec<CustomCommand>,
    ) -> Self {
        let mut state = Self {
            queue: VecDeque::with_capacity(queue.queue.len()),
            current: queue.current,
            stats,
            announcements,
            commands,
        };
        for name in queue.queue {
            if !state.is_current(&name) && state.position_of(&name).is_none() {
                state.queue.push_back(name);
            }
        }
        state
    }

    // -----------------------------------------------------------------------
    // Queue
    // -----------------------------------------------------------------------

    /// Queued names in order.
    pub fn queue(&self) -> impl ExactSizeIterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    /// Number of queued names.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The player on turn.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The queue head.
    pub fn next(&self) -> Option<&str> {
        self.queue.front().map(String::as_str)
    }

    /// 1-based position of `name`, compared case-insensitively.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        let needle = name.to_lowercase();
        self.queue
            .iter()
            .position(|entry| entry.to_lowercase() == needle)
            .map(|index| index.saturating_add(1))
    }

    /// Whether `name` is the current player, compared case-insensitively.
    pub fn is_current(&self, name: &str) -> bool {
        self.current
            .as_deref()
            .is_some_and(|current| current.to_lowercase() == name.to_lowercase())
    }

    /// Append `name` to the queue unless it is playing or already queued.
    pub fn join(&mut self, name: &str) -> JoinOutcome {
        if self.is_current(name) {
            return JoinOutcome::AlreadyPlaying;
        }
        if let Some(position) = self.position_of(name) {
            return JoinOutcome::AlreadyQueued { position };
        }
        self.queue.push_back(name.to_owned());
        JoinOutcome::Joined {
            position: self.queue.len(),
        }
    }

    /// Remove `name` from the queue. The current player cannot leave.
    pub fn leave(&mut self, name: &str) -> LeaveOutcome {
        if self.is_current(name) {
            return LeaveOutcome::Playing;
        }
        match self.position_of(name) {
            Some(position) => {
                self.queue.remove(position.saturating_sub(1));
                LeaveOutcome::Left
            }
            None => LeaveOutcome::NotQueued,
        }
    }

    /// Move the queue head onto the current turn.
    ///
    /// With an empty queue the current player becomes absent. Returns the
    /// new current player.
    pub fn advance(&mut self) -> Option<&str> {
        self.current = self.queue.pop_front();
        self.current.as_deref()
    }

    /// Empty the queue and clear the current player.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.current = None;
    }

    /// Remove the first entry exactly equal to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected::UnknownName`] when no entry matches.
    pub fn remove_exact(&mut self, name: &str) -> Result<Changes, Rejected> {
        let index = self
            .queue
            .iter()
            .position(|entry| entry == name)
            .ok_or(Rejected::UnknownName)?;
        self.queue.remove(index);
        Ok(Changes::QUEUE)
    }

    /// Snapshot of the queue document for persistence.
    pub fn queue_document(&self) -> QueueDocument {
        QueueDocument {
            queue: self.queue.iter().cloned().collect(),
            current: self.current.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    /// Fold a game result into the current player's record and end their
    /// turn. Returns the player the result was recorded for.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected::NoCurrentPlayer`] when nobody is on turn and
    /// [`Rejected::StatsOverflow`] when a total would stop being finite.
    /// Neither touches the current player.
    pub fn record_result(
        &mut self,
        legs_for: f64,
        legs_against: f64,
        average: f64,
    ) -> Result<String, Rejected> {
        let player = self.current.as_deref().ok_or(Rejected::NoCurrentPlayer)?;
        let mut record = self.stats.get(player).cloned().unwrap_or_default();
        record.record(legs_for, legs_against, average);
        if !(record.legs_for.is_finite()
            && record.legs_against.is_finite()
            && record.avg_sum.is_finite())
        {
            return Err(Rejected::StatsOverflow);
        }
        let player = self.current.take().ok_or(Rejected::NoCurrentPlayer)?;
        self.stats.insert(player.clone(), record);
        Ok(player)
    }

    /// Stats for the exact name.
    pub fn stats_for(&self, name: &str) -> Option<&StatsRecord> {
        self.stats.get(name)
    }

    /// The full stats table.
    pub const fn stats(&self) -> &StatsDocument {
        &self.stats
    }

    // -----------------------------------------------------------------------
    // Announcements
    // -----------------------------------------------------------------------

    /// All announcements in creation order.
    pub fn announcements(&self) -> &[ScheduledAnnouncement] {
        &self.announcements
    }

    /// Mutable access for the dispatcher, which stamps send times.
    pub fn announcements_mut(&mut self) -> &mut [ScheduledAnnouncement] {
        &mut self.announcements
    }

    /// Create an enabled announcement armed from `now_ms`.
    ///
    /// # Errors
    ///
    /// Rejects an empty message or a non-positive interval.
    pub fn add_announcement(
        &mut self,
        message: &str,
        interval_minutes: f64,
        now_ms: i64,
    ) -> Result<AnnouncementId, Rejected> {
        let message = validate_announcement(message, interval_minutes)?;
        let id = AnnouncementId::new();
        self.announcements.push(ScheduledAnnouncement {
            id: id.clone(),
            message,
            interval_minutes,
            enabled: true,
            last_sent_at: Some(now_ms),
        });
        Ok(id)
    }

    /// Replace the text and interval of an announcement. The schedule is
    /// not re-armed.
    ///
    /// # Errors
    ///
    /// Same validation as [`add_announcement`](Self::add_announcement),
    /// plus [`Rejected::UnknownId`].
    pub fn update_announcement(
        &mut self,
        id: &str,
        message: &str,
        interval_minutes: f64,
    ) -> Result<(), Rejected> {
        let message = validate_announcement(message, interval_minutes)?;
        let target = self.announcement_mut(id)?;
        target.message = message;
        target.interval_minutes = interval_minutes;
        Ok(())
    }

    /// Enable or disable an announcement and re-arm it from `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected::UnknownId`].
    pub fn toggle_announcement(
        &mut self,
        id: &str,
        enabled: bool,
        now_ms: i64,
    ) -> Result<(), Rejected> {
        let target = self.announcement_mut(id)?;
        target.enabled = enabled;
        target.last_sent_at = Some(now_ms);
        Ok(())
    }

    /// Delete an announcement.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected::UnknownId`].
    pub fn delete_announcement(&mut self, id: &str) -> Result<(), Rejected> {
        let before = self.announcements.len();
        self.announcements.retain(|a| a.id != *id);
        if self.announcements.len() == before {
            return Err(Rejected::UnknownId);
        }
        Ok(())
    }

    fn announcement_mut(&mut self, id: &str) -> Result<&mut ScheduledAnnouncement, Rejected> {
        self.announcements
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or(Rejected::UnknownId)
    }

    // -----------------------------------------------------------------------
    // Custom commands
    // -----------------------------------------------------------------------

    /// All custom commands in creation order.
    pub fn commands(&self) -> &[CustomCommand] {
        &self.commands
    }

    /// The command whose trigger equals `trigger` exactly.
    pub fn find_command(&self, trigger: &str) -> Option<&CustomCommand> {
        self.commands.iter().find(|c| c.name == trigger)
    }

    /// Create a custom command.
    ///
    /// # Errors
    ///
    /// Rejects a trigger without `!`, an empty response or a trigger that
    /// is already in use.
    pub fn add_command(&mut self, name: &str, response: &str) -> Result<CommandId, Rejected> {
        let (name, response) = validate_command(name, response)?;
        if self.find_command(&name).is_some() {
            return Err(Rejected::DuplicateTrigger);
        }
        let id = CommandId::new();
        self.commands.push(CustomCommand {
            id: id.clone(),
            name,
            response,
        });
        Ok(id)
    }

    /// Replace the trigger and response of a custom command.
    ///
    /// # Errors
    ///
    /// Same validation as [`add_command`](Self::add_command); the trigger
    /// may only collide with the command being edited.
    pub fn update_command(&mut self, id: &str, name: &str, response: &str) -> Result<(), Rejected> {
        let (name, response) = validate_command(name, response)?;
        if self
            .commands
            .iter()
            .any(|c| c.name == name && c.id != *id)
        {
            return Err(Rejected::DuplicateTrigger);
        }
        let target = self
            .commands
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or(Rejected::UnknownId)?;
        target.name = name;
        target.response = response;
        Ok(())
    }

    /// Delete a custom command.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected::UnknownId`].
    pub fn delete_command(&mut self, id: &str) -> Result<(), Rejected> {
        let before = self.commands.len();
        self.commands.retain(|c| c.id != *id);
        if self.commands.len() == before {
            return Err(Rejected::UnknownId);
        }
        Ok(())
    }
}

fn validate_announcement(message: &str, interval_minutes: f64) -> Result<String, Rejected> {
    let message = message.trim();
    if message.is_empty() {
        return Err(Rejected::EmptyMessage);
    }
    if !interval_minutes.is_finite() || interval_minutes <= 0.0 {
        return Err(Rejected::InvalidInterval);
    }
    Ok(message.to_owned())
}

fn validate_command(name: &str, response: &str) -> Result<(String, String), Rejected> {
    let name = name.trim().to_lowercase();
    if !name.starts_with('!') {
        return Err(Rejected::InvalidTrigger);
    }
    let response = response.trim();
    if response.is_empty() {
        return Err(Rejected::EmptyResponse);
    }
    Ok((name, response.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn join_is_case_insensitive_and_case_preserving() {
        let mut state = QueueState::new();
        assert_eq!(state.join("Alice"), JoinOutcome::Joined { position: 1 });
        assert_eq!(state.join("alice"), JoinOutcome::AlreadyQueued { position: 1 });
        assert_eq!(state.queue().collect::<Vec<_>>(), vec!["Alice"]);
    }

    #[test]
    fn n_unique_joins_get_sequential_positions() {
        let mut state = QueueState::new();
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            assert_eq!(
                state.join(name),
                JoinOutcome::Joined {
                    position: i.saturating_add(1)
                }
            );
        }
        assert_eq!(state.queue_len(), 4);
        assert_eq!(state.position_of("C"), Some(3));
    }

    #[test]
    fn current_player_cannot_join_or_leave() {
        let mut state = QueueState::new();
        state.join("Bob");
        assert_eq!(state.advance(), Some("Bob"));
        assert_eq!(state.join("BOB"), JoinOutcome::AlreadyPlaying);
        assert_eq!(state.leave("bob"), LeaveOutcome::Playing);
    }

    #[test]
    fn leave_removes_entry() {
        let mut state = QueueState::new();
        state.join("a");
        state.join("b");
        assert_eq!(state.leave("A"), LeaveOutcome::Left);
        assert_eq!(state.leave("a"), LeaveOutcome::NotQueued);
        assert_eq!(state.next(), Some("b"));
    }

    #[test]
    fn advance_on_empty_queue_clears_current() {
        let mut state = QueueState::new();
        state.join("a");
        state.advance();
        assert_eq!(state.current(), Some("a"));
        assert_eq!(state.advance(), None);
        assert!(state.current().is_none());
    }

    #[test]
    fn remove_is_exact_match() {
        let mut state = QueueState::new();
        state.join("Alice");
        assert_eq!(state.remove_exact("alice"), Err(Rejected::UnknownName));
        assert_eq!(state.remove_exact("Alice"), Ok(Changes::QUEUE));
        assert_eq!(state.queue_len(), 0);
    }

    #[test]
    fn record_result_requires_current() {
        let mut state = QueueState::new();
        assert_eq!(
            state.record_result(3.0, 1.0, 50.0),
            Err(Rejected::NoCurrentPlayer)
        );
        assert!(state.stats().is_empty());
    }

    #[test]
    fn record_result_rejects_non_finite_totals() {
        let mut state = QueueState::new();
        state.join("Bob");
        state.advance();
        assert_eq!(state.record_result(1e308, 0.0, 1e308), Ok("Bob".to_owned()));
        state.join("Bob");
        state.advance();
        assert_eq!(
            state.record_result(1e308, 0.0, 1e308),
            Err(Rejected::StatsOverflow)
        );
        assert_eq!(state.current(), Some("Bob"));
        let record = state.stats_for("Bob").unwrap();
        assert_eq!(record.games, 1);
        assert!(record.legs_for.is_finite());
        assert!(record.avg_sum.is_finite());

        let json = serde_json::to_string(state.stats()).unwrap();
        let reloaded: StatsDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded["Bob"].games, 1);
    }

    #[test]
    fn record_result_updates_stats_and_clears_current() {
        let mut state = QueueState::new();
        state.join("Bob");
        state.advance();
        assert_eq!(state.record_result(3.0, 1.0, 55.5), Ok("Bob".to_owned()));
        assert!(state.current().is_none());
        let record = state.stats_for("Bob").unwrap();
        assert_eq!(record.games, 1);
        assert_eq!(record.wins, 1);
        assert_eq!(record.losses, 0);
        assert!((record.legs_for - 3.0).abs() < f64::EPSILON);
        assert!((record.legs_against - 1.0).abs() < f64::EPSILON);
        assert!((record.avg_sum - 55.5).abs() < f64::EPSILON);
        assert!(state.stats_for("bob").is_none());
    }

    #[test]
    fn announcement_validation() {
        let mut state = QueueState::new();
        assert_eq!(
            state.add_announcement("   ", 5.0, 0),
            Err(Rejected::EmptyMessage)
        );
        assert_eq!(
            state.add_announcement("hi", 0.0, 0),
            Err(Rejected::InvalidInterval)
        );
        assert_eq!(
            state.add_announcement("hi", f64::NAN, 0),
            Err(Rejected::InvalidInterval)
        );
        let id = state.add_announcement("  hi  ", 0.5, 42);
        assert!(id.is_ok());
        let added = &state.announcements()[0];
        assert_eq!(added.message, "hi");
        assert!(added.enabled);
        assert_eq!(added.last_sent_at, Some(42));
    }

    #[test]
    fn toggle_rearms_and_update_does_not() {
        let mut state = QueueState::new();
        let id = state.add_announcement("hi", 1.0, 1_000).unwrap();
        assert_eq!(state.update_announcement(id.as_str(), "hello", 2.0), Ok(()));
        assert_eq!(state.announcements()[0].last_sent_at, Some(1_000));
        assert_eq!(state.toggle_announcement(id.as_str(), false, 5_000), Ok(()));
        assert_eq!(state.announcements()[0].last_sent_at, Some(5_000));
        assert!(!state.announcements()[0].enabled);
        assert_eq!(
            state.toggle_announcement("missing", true, 0),
            Err(Rejected::UnknownId)
        );
        assert_eq!(state.delete_announcement(id.as_str()), Ok(()));
        assert_eq!(
            state.delete_announcement(id.as_str()),
            Err(Rejected::UnknownId)
        );
    }

    #[test]
    fn duplicate_command_rejected() {
        let mut state = QueueState::new();
        assert!(state.add_command(" !Discord ", "join us").is_ok());
        assert_eq!(
            state.add_command("!discord", "other"),
            Err(Rejected::DuplicateTrigger)
        );
        assert_eq!(state.commands().len(), 1);
        assert_eq!(state.commands()[0].name, "!discord");
    }

    #[test]
    fn command_validation() {
        let mut state = QueueState::new();
        assert_eq!(
            state.add_command("discord", "x"),
            Err(Rejected::InvalidTrigger)
        );
        assert_eq!(state.add_command("!x", "  "), Err(Rejected::EmptyResponse));
    }

    #[test]
    fn update_command_may_keep_own_name() {
        let mut state = QueueState::new();
        let first = state.add_command("!a", "one").unwrap();
        let _second = state.add_command("!b", "two");
        assert_eq!(state.update_command(first.as_str(), "!a", "uno"), Ok(()));
        assert_eq!(
            state.update_command(first.as_str(), "!b", "x"),
            Err(Rejected::DuplicateTrigger)
        );
        assert_eq!(
            state.update_command("missing", "!c", "x"),
            Err(Rejected::UnknownId)
        );
        assert_eq!(state.find_command("!a").map(|c| c.response.as_str()), Some("uno"));
    }

    #[test]
    fn from_documents_drops_duplicates() {
        let state = QueueState::from_documents(
            QueueDocument {
                queue: vec!["A".into(), "a".into(), "Cur".into(), "b".into()],
                current: Some("cur".into()),
            },
            StatsDocument::new(),
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(state.queue().collect::<Vec<_>>(), vec!["A", "b"]);
        assert_eq!(state.queue_document().current.as_deref(), Some("cur"));
    }

    #[test]
    fn changes_merge() {
        let merged = Changes::QUEUE.merge(Changes::SETTINGS);
        assert!(merged.queue && merged.settings && !merged.stats);
        assert!(!Changes::NONE.any());
        assert!(merged.any());
    }
}
