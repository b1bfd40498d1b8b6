//! Engine loop runner.
//!
//! [`run_engine`] is the single task that owns the [`Engine`]. It waits on
//! two sources at once:
//!
//! - **Events**: chat events, operator requests and refreshes from the
//!   shared mpsc channel, handled in arrival order
//! - **Ticks**: the announcement dispatcher period
//!
//! Both are handled on this task only, so the state model never needs a
//! lock.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

use crate::engine::{Engine, EngineEvent};

/// Why the engine loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// A [`EngineEvent::Shutdown`] was received.
    Shutdown,
    /// Every event sender was dropped.
    ChannelClosed,
}

/// Result of an engine run.
#[derive(Debug)]
pub struct RunResult {
    /// The engine, returned for a final inspection.
    pub engine: Engine,
    /// Why the loop stopped.
    pub end_reason: RunEndReason,
    /// Events handled, ticks excluded.
    pub events_handled: u64,
    /// Dispatcher ticks run.
    pub ticks: u64,
}

/// Shortest accepted dispatcher period.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(100);

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Start `engine` and drive it until shutdown or until every sender of
/// `events` is dropped.
///
/// The first dispatcher tick fires one full `tick_period` after start.
/// Periods below [`MIN_TICK_PERIOD`] are raised to it.
pub async fn run_engine(
    mut engine: Engine,
    mut events: mpsc::Receiver<EngineEvent>,
    tick_period: Duration,
) -> RunResult {
    let tick_period = tick_period.max(MIN_TICK_PERIOD);
    let first_tick = Instant::now()
        .checked_add(tick_period)
        .unwrap_or_else(Instant::now);
    let mut ticker = tokio::time::interval_at(first_tick, tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut events_handled: u64 = 0;
    let mut ticks: u64 = 0;

    info!(
        tick_period_ms = tick_period.as_millis(),
        "Engine starting"
    );
    engine.start(now_ms());

    let end_reason = loop {
        tokio::select! {
            maybe_event = events.recv() => {
                let Some(event) = maybe_event else {
                    break RunEndReason::ChannelClosed;
                };
                events_handled = events_handled.saturating_add(1);
                if !engine.handle(event, now_ms()) {
                    break RunEndReason::Shutdown;
                }
            }
            _ = ticker.tick() => {
                ticks = ticks.saturating_add(1);
                engine.on_tick(now_ms());
            }
        }
    };

    RunResult {
        engine,
        end_reason,
        events_handled,
        ticks,
    }
}

/// Log the end of a run.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        events_handled = result.events_handled,
        ticks = result.ticks,
        queued = result.engine.state().queue_len(),
        "Engine stopped"
    );
}
