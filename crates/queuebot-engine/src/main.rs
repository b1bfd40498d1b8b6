//! Queue bot binary.
//!
//! Wires the engine loop, the Twitch chat transport and the
//! display/operator hub together and runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load `queuebot-config.yaml` (or defaults) and apply env overrides
//! 2. Initialize structured logging (tracing)
//! 3. Resolve the bot token (fatal if missing)
//! 4. Open the data directory and load every document
//! 5. Start the hub on the configured port
//! 6. Run the engine loop until shutdown
//! 7. Log the result

mod error;
mod observer_sink;

use std::sync::Arc;
use std::time::Duration;

use queuebot_core::chat::{ChatCredentials, ChatSession};
use queuebot_core::config::{AppConfig, LogFormat, LoggingConfig};
use queuebot_core::engine::{Engine, EngineEvent};
use queuebot_core::runner;
use queuebot_observer::server::ServerConfig;
use queuebot_observer::startup::spawn_observer;
use queuebot_observer::state::AppState;
use queuebot_store::JsonFileStore;
use queuebot_twitch::TwitchTransport;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer_sink::ObserverSink;

/// Capacity of the engine's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    run(config).await?;
    Ok(())
}

/// Build every subsystem and run the engine loop.
async fn run(config: AppConfig) -> Result<(), EngineError> {
    info!(
        data_dir = %config.storage.data_dir,
        bot = %config.bot.username,
        irc = %format!("{}:{}", config.bot.irc_host, config.bot.irc_port),
        tick_interval_secs = config.scheduler.tick_interval_secs,
        "queuebot starting"
    );

    let token = config.bot.load_token()?;
    let store = JsonFileStore::open(config.storage.data_dir.as_str())?;

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let app_state = Arc::new(AppState::with_control(tx.clone()));

    let transport = TwitchTransport::new(&config.bot.irc_host, config.bot.irc_port);
    let credentials = ChatCredentials {
        username: config.bot.username.clone(),
        token,
    };
    let chat = ChatSession::new(Box::new(transport), credentials, tx.clone());
    let sink = ObserverSink::new(Arc::clone(&app_state));
    let engine = Engine::load(Box::new(store), chat, Box::new(sink), config.commands.clone())?;

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port.unwrap_or(engine.settings().port),
    };
    let (addr, _hub) = spawn_observer(&server_config, Arc::clone(&app_state)).await?;
    info!(%addr, "Hub started");
    if !engine.settings().is_ready() {
        info!(
            url = %format!("http://localhost:{}/setup/save", addr.port()),
            "Setup not completed, POST a channel to finish"
        );
    }

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                if tx.send(EngineEvent::Shutdown).await.is_err() {
                    warn!("Engine already stopped");
                }
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    let tick_period = Duration::from_secs(config.scheduler.tick_interval_secs);
    let result = runner::run_engine(engine, rx, tick_period).await;
    runner::log_run_end(&result);

    info!(end_reason = ?result.end_reason, "queuebot shutdown complete");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}
