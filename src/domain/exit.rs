//! Exit rule evaluation for an open position.
//!
//! Precedence is fixed: stop-loss, then take-profit, then the time limit,
//! then the optional exit signal. When a single day's range breaches both
//! the stop and the take level, the trade closes as a stop-loss at the stop
//! level — the conservative assumption, chosen deliberately because daily
//! candles cannot show which level was touched first.

use serde::{Deserialize, Serialize};

use super::candle::Candle;
use super::condition::ConditionConfig;
use super::position::{ExitReason, Position};
use super::signal;

/// Exit rule set. Every field is optional; an empty config never fires
/// before end-of-data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExitConfig {
    #[serde(default)]
    pub stop_loss_pct: Option<f64>,
    #[serde(default)]
    pub take_profit_pct: Option<f64>,
    #[serde(default)]
    pub max_holding_days: Option<usize>,
    #[serde(default)]
    pub exit_signal: Option<ConditionConfig>,
}

/// A positive exit verdict. `fill_price` is `None` for time and signal
/// exits, where the caller fills at the current close.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitDecision {
    pub reason: ExitReason,
    pub fill_price: Option<f64>,
}

/// Evaluate the exit rules for `position` on the last candle of `window`.
///
/// `window` is the candle prefix up to and including the current day;
/// `current_index` is the index of that day in the full series. Returns
/// `None` to remain in position.
pub fn evaluate_exit(
    position: &Position,
    window: &[Candle],
    current_index: usize,
    config: &ExitConfig,
) -> Option<ExitDecision> {
    let current = window.last()?;

    let stop_level = config
        .stop_loss_pct
        .map(|pct| position.entry_price * (1.0 - pct.abs() / 100.0));
    let take_level = config
        .take_profit_pct
        .map(|pct| position.entry_price * (1.0 + pct.abs() / 100.0));

    // Cleaned candles always carry an intrabar range; for close-only days it
    // collapses to the close, which is exactly the fallback behaviour.
    let hit_stop = stop_level.is_some_and(|level| current.low <= level);
    let hit_take = take_level.is_some_and(|level| current.high >= level);

    if hit_stop {
        // Covers the both-hit day as well: stop beats take.
        return Some(ExitDecision {
            reason: ExitReason::StopLoss,
            fill_price: stop_level,
        });
    }
    if hit_take {
        return Some(ExitDecision {
            reason: ExitReason::TakeProfit,
            fill_price: take_level,
        });
    }

    if let Some(max_days) = config.max_holding_days
        && max_days > 0
        && current_index - position.entry_index >= max_days
    {
        return Some(ExitDecision {
            reason: ExitReason::TimeExit,
            fill_price: None,
        });
    }

    if let Some(exit_signal) = &config.exit_signal
        && signal::evaluate(window, exit_signal).triggered
    {
        return Some(ExitDecision {
            reason: ExitReason::SignalExit,
            fill_price: None,
        });
    }

    None
}
