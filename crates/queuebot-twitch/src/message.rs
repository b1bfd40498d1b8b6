//! IRC line parsing with IRCv3 message tags.
//!
//! Twitch chat speaks plain IRC plus the `twitch.tv/tags` capability, which
//! prefixes lines with `@key=value;key=value` tags. Only what the transport
//! needs is modelled: tags, the prefix nick, the command and its params.

use std::collections::BTreeMap;

/// Error returned for lines that are not IRC messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line is empty (after stripping CR/LF).
    #[error("empty line")]
    Empty,
    /// Tags or prefix were present but no command followed.
    #[error("missing command in {0:?}")]
    MissingCommand(String),
}

/// One parsed IRC line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrcMessage {
    /// Unescaped tag values. Tags without a value map to an empty string.
    pub tags: BTreeMap<String, String>,
    /// Prefix without the leading `:`.
    pub prefix: Option<String>,
    /// Command or numeric, upper-cased as sent.
    pub command: String,
    /// Middle params followed by the trailing param, if any.
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse one line. A trailing CR/LF is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for empty lines or lines without a command.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        if rest.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut message = Self::default();

        if let Some(tagged) = rest.strip_prefix('@') {
            let (tags, tail) = tagged.split_once(' ').unwrap_or((tagged, ""));
            message.tags = parse_tags(tags);
            rest = tail.trim_start_matches(' ');
        }

        if let Some(prefixed) = rest.strip_prefix(':') {
            let (prefix, tail) = prefixed.split_once(' ').unwrap_or((prefixed, ""));
            message.prefix = Some(prefix.to_owned());
            rest = tail.trim_start_matches(' ');
        }

        let (command, mut params) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(ParseError::MissingCommand(line.to_owned()));
        }
        message.command = command.to_owned();

        loop {
            params = params.trim_start_matches(' ');
            if params.is_empty() {
                break;
            }
            if let Some(trailing) = params.strip_prefix(':') {
                message.params.push(trailing.to_owned());
                break;
            }
            let (param, tail) = params.split_once(' ').unwrap_or((params, ""));
            message.params.push(param.to_owned());
            params = tail;
        }

        Ok(message)
    }

    /// Tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Nick part of a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        prefix.split(['!', '@']).next().filter(|nick| !nick.is_empty())
    }

    /// Param by position.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The last param, which carries the text of PRIVMSG and NOTICE.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

/// Parse the tag section (without the leading `@`).
fn parse_tags(section: &str) -> BTreeMap<String, String> {
    section
        .split(';')
        .filter(|tag| !tag.is_empty())
        .map(|tag| {
            let (key, value) = tag.split_once('=').unwrap_or((tag, ""));
            (key.to_owned(), unescape_tag_value(value))
        })
        .collect()
}

/// Unescape an IRCv3 tag value.
pub fn unescape_tag_value(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => unescaped.push(';'),
            Some('s') => unescaped.push(' '),
            Some('\\') => unescaped.push('\\'),
            Some('r') => unescaped.push('\r'),
            Some('n') => unescaped.push('\n'),
            Some(other) => unescaped.push(other),
            None => break,
        }
    }
    unescaped
}
