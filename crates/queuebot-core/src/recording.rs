//! A chat transport that performs no I/O and records every call.
//!
//! Compiled for this crate's unit tests and for dependents that enable the
//! `test-util` feature.

use std::sync::{Arc, Mutex};

use crate::chat::{ChatCredentials, ChatError, ChatEventSender, ChatTransport};

/// Everything a [`RecordingTransport`] was asked to do.
#[derive(Debug, Clone, Default)]
pub struct TransportLog {
    /// Channels passed to `connect`, in order.
    pub connects: Vec<String>,
    /// `(channel, text)` pairs passed to `say`.
    pub sent: Vec<(String, String)>,
    /// Number of `disconnect` calls.
    pub disconnects: usize,
    /// Event handle from the most recent `connect`.
    pub events: Option<ChatEventSender>,
}

/// A transport that performs no I/O and records every call.
///
/// Clones share one log, so a test can keep a handle after moving the
/// transport into a [`ChatSession`].
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    log: Arc<Mutex<TransportLog>>,
    fail_connect: bool,
}

impl RecordingTransport {
    /// Create a transport with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport whose `connect` always fails.
    pub fn failing() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    /// Copy of the log so far.
    pub fn log(&self) -> TransportLog {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Texts sent so far, without channels.
    pub fn sent_texts(&self) -> Vec<String> {
        self.log().sent.into_iter().map(|(_, text)| text).collect()
    }

    fn with_log(&self, f: impl FnOnce(&mut TransportLog)) {
        if let Ok(mut log) = self.log.lock() {
            f(&mut log);
        }
    }
}

impl ChatTransport for RecordingTransport {
    fn connect(
        &mut self,
        _credentials: &ChatCredentials,
        channel: &str,
        events: ChatEventSender,
    ) -> Result<(), ChatError> {
        if self.fail_connect {
            return Err(ChatError::Connect(String::from("refused")));
        }
        self.with_log(|log| {
            log.connects.push(channel.to_owned());
            log.events = Some(events);
        });
        Ok(())
    }

    fn say(&mut self, channel: &str, text: &str) -> Result<(), ChatError> {
        self.with_log(|log| log.sent.push((channel.to_owned(), text.to_owned())));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.with_log(|log| log.disconnects = log.disconnects.saturating_add(1));
    }
}
