//! Twitch IRC chat transport for queuebot.
//!
//! Implements [`ChatTransport`](queuebot_core::chat::ChatTransport) over a
//! plain TCP IRC connection to Twitch chat:
//!
//! ```text
//! PASS oauth:<token>
//! NICK <bot>
//! CAP REQ :twitch.tv/tags twitch.tv/commands
//! JOIN #<channel>
//! ```
//!
//! `001` marks the session connected, `PING` is answered with `PONG`,
//! tagged `PRIVMSG` lines become message events, and EOF, I/O errors,
//! rejected logins or `RECONNECT` end the session.
//!
//! # Modules
//!
//! - [`client`] -- [`TwitchTransport`] and PRIVMSG classification
//! - [`message`] -- IRC line parser with IRCv3 tags
//! - [`error`] -- Connection error types

pub mod client;
pub mod error;
pub mod message;

pub use client::TwitchTransport;
pub use error::TwitchError;
pub use message::IrcMessage;
