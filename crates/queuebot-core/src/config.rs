//! Configuration loading and typed config structures for queuebot.
//!
//! Process configuration lives in `queuebot-config.yaml` (optional). It
//! covers things that only change on restart: bot identity, data
//! directory, listen host, scheduler period, chat command words and
//! logging. The channel, listen port and setup flag are runtime settings
//! and live in the `config.json` document instead.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable that overrides the YAML config path.
pub const CONFIG_PATH_ENV: &str = "QUEUEBOT_CONFIG";

/// Default YAML config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "queuebot-config.yaml";

/// Environment variable holding the bot OAuth token.
pub const TOKEN_ENV: &str = "QUEUEBOT_BOT_TOKEN";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// No bot token in the environment and none in the token file.
    #[error("bot token missing: set {TOKEN_ENV} or create {path}")]
    MissingToken {
        /// Token file that was tried.
        path: String,
    },

    /// An environment override held an unusable value.
    #[error("invalid value for {var}: {message}")]
    InvalidEnv {
        /// The offending variable.
        var: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level process configuration.
///
/// Mirrors the structure of `queuebot-config.yaml`. Every field has a
/// default so an empty (or missing) file is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Chat bot identity and chat server.
    #[serde(default)]
    pub bot: BotConfig,

    /// Where documents are stored.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP/WebSocket listener.
    #[serde(default)]
    pub server: HttpConfig,

    /// Announcement dispatcher timing.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Built-in chat command words.
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `QUEUEBOT_DATA_DIR` overrides `storage.data_dir`
    /// - `QUEUEBOT_PORT` overrides `server.port`
    /// - `QUEUEBOT_BOT_USERNAME` overrides `bot.username`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from the path in `QUEUEBOT_CONFIG` (or the default file name),
    /// falling back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file).
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        if path.exists() {
            Self::from_file(&path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides()?;
            Ok(config)
        }
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.commands.normalize();
        Ok(config)
    }

    /// Override file values with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `QUEUEBOT_PORT` is not a port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("QUEUEBOT_DATA_DIR") {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("QUEUEBOT_BOT_USERNAME") {
            self.bot.username = val;
        }
        if let Ok(val) = std::env::var("QUEUEBOT_PORT") {
            let port = val.trim().parse::<u16>().map_err(|e| ConfigError::InvalidEnv {
                var: "QUEUEBOT_PORT",
                message: e.to_string(),
            })?;
            self.server.port = Some(port);
        }
        Ok(())
    }
}

/// Chat bot identity and chat server address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotConfig {
    /// Login name of the bot account.
    #[serde(default = "default_bot_username")]
    pub username: String,

    /// File holding the OAuth token, used when `QUEUEBOT_BOT_TOKEN` is unset.
    #[serde(default = "default_token_file")]
    pub token_file: String,

    /// Chat (IRC) server host.
    #[serde(default = "default_irc_host")]
    pub irc_host: String,

    /// Chat (IRC) server port.
    #[serde(default = "default_irc_port")]
    pub irc_port: u16,
}

impl BotConfig {
    /// Resolve the bot token: `QUEUEBOT_BOT_TOKEN` first, then the token
    /// file. Surrounding whitespace is stripped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] if neither source yields a
    /// non-empty token.
    pub fn load_token(&self) -> Result<String, ConfigError> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_owned());
            }
        }
        let token = std::fs::read_to_string(&self.token_file).unwrap_or_default();
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingToken {
                path: self.token_file.clone(),
            });
        }
        Ok(token.to_owned())
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            username: default_bot_username(),
            token_file: default_token_file(),
            irc_host: default_irc_host(),
            irc_port: default_irc_port(),
        }
    }
}

/// Document storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the JSON documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// HTTP/WebSocket listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port override. When unset the port from `config.json` is used.
    #[serde(default)]
    pub port: Option<u16>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
        }
    }
}

/// Announcement dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between due-checks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

/// Words for the built-in chat commands.
///
/// Each word is a whole-message trigger including the leading `!`.
/// Words are lower-cased on load because matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandsConfig {
    /// Join the queue.
    #[serde(default = "default_join_word")]
    pub join: String,
    /// Leave the queue.
    #[serde(default = "default_leave_word")]
    pub leave: String,
    /// Print the queue.
    #[serde(default = "default_list_word")]
    pub list: String,
    /// Move the queue head onto the current turn (elevated only).
    #[serde(default = "default_advance_word")]
    pub advance: String,
    /// Print the sender's stats.
    #[serde(default = "default_stats_word")]
    pub stats: String,
}

impl CommandsConfig {
    /// Trim and lower-case every word.
    pub fn normalize(&mut self) {
        for word in [
            &mut self.join,
            &mut self.leave,
            &mut self.list,
            &mut self.advance,
            &mut self.stats,
        ] {
            *word = word.trim().to_lowercase();
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            join: default_join_word(),
            leave: default_leave_word(),
            list: default_list_word(),
            advance: default_advance_word(),
            stats: default_stats_word(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_bot_username() -> String {
    String::from("queuebot")
}

fn default_token_file() -> String {
    String::from("bot-token.txt")
}

fn default_irc_host() -> String {
    String::from("irc.chat.twitch.tv")
}

const fn default_irc_port() -> u16 {
    6667
}

fn default_data_dir() -> String {
    String::from(".")
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_tick_interval_secs() -> u64 {
    5
}

fn default_join_word() -> String {
    String::from("!join")
}

fn default_leave_word() -> String {
    String::from("!leave")
}

fn default_list_word() -> String {
    String::from("!queue")
}

fn default_advance_word() -> String {
    String::from("!next")
}

fn default_stats_word() -> String {
    String::from("!stats")
}

fn default_log_level() -> String {
    String::from("info")
}
