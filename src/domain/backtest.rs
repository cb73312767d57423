//! Walk-forward backtest simulator and its request/response surface.
//!
//! The walk replays one entry condition and one exit rule set day by day
//! over a cleaned candle series. At most one position is open at any
//! simulated index; index 0 is warm-up only and never an entry day. Every
//! opened position yields exactly one trade — anything still open at the
//! end is force-closed at the final close with reason `end_of_data`.

use serde::{Deserialize, Serialize};

use super::candle::{Candle, clean_series};
use super::condition::ConditionConfig;
use super::error::RatewatchError;
use super::exit::{ExitConfig, evaluate_exit};
use super::position::{ExitReason, Position, Trade};
use super::signal;
use super::summary::{Summary, summarize};
use crate::ports::data_port::HistoricalDataProvider;

/// Fewer usable candles than this and no meaningful simulation is possible;
/// the request fails instead of returning an empty ledger.
pub const MIN_BACKTEST_CANDLES: usize = 5;

fn default_initial_capital() -> f64 {
    10_000.0
}

fn default_true() -> bool {
    true
}

/// A backtest request as it arrives over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub pair: String,
    pub days: u32,
    pub entry: ConditionConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_true")]
    pub allow_multiple_trades: bool,
}

/// Trade ledger plus summary for one completed simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub summary: Summary,
}

/// Wire-shaped response: either a result or an explicit error string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub pair: String,
    pub days: u32,
    pub trades: Vec<Trade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

/// Replay `entry`/`exit` over `candles` and summarize the resulting ledger.
///
/// `candles` must already be cleaned (ascending dates, total OHLC). Fails
/// only when fewer than [`MIN_BACKTEST_CANDLES`] candles are supplied;
/// everything else, including a run with zero trades, is a valid result.
pub fn run_backtest(
    candles: &[Candle],
    entry: &ConditionConfig,
    exit: &ExitConfig,
    initial_capital: f64,
    allow_multiple_trades: bool,
) -> Result<BacktestResult, RatewatchError> {
    if candles.len() < MIN_BACKTEST_CANDLES {
        return Err(RatewatchError::InsufficientHistory {
            have: candles.len(),
            minimum: MIN_BACKTEST_CANDLES,
        });
    }

    let mut trades: Vec<Trade> = Vec::new();
    let mut open: Option<Position> = None;

    for i in 1..candles.len() {
        let window = &candles[..=i];
        let current = &candles[i];

        match &open {
            None => {
                if signal::evaluate(window, entry).triggered {
                    open = Some(Position {
                        entry_date: current.date,
                        entry_price: current.close,
                        entry_index: i,
                    });
                }
            }
            Some(position) => {
                if let Some(decision) = evaluate_exit(position, window, i, exit) {
                    let fill = decision.fill_price.unwrap_or(current.close);
                    trades.push(Trade::close(position, current.date, fill, i, decision.reason));
                    open = None;
                    if !allow_multiple_trades {
                        break;
                    }
                }
            }
        }
    }

    if let Some(position) = open {
        let last_index = candles.len() - 1;
        let last = &candles[last_index];
        trades.push(Trade::close(
            &position,
            last.date,
            last.close,
            last_index,
            ExitReason::EndOfData,
        ));
    }

    let summary = summarize(&trades, initial_capital);
    Ok(BacktestResult { trades, summary })
}

/// Drive a full request: fetch, clean, simulate, shape the response.
///
/// Provider/transport failures propagate as errors; a series too short to
/// simulate becomes a failure *response*, matching the wire contract.
pub fn execute(
    provider: &dyn HistoricalDataProvider,
    request: &BacktestRequest,
) -> Result<BacktestResponse, RatewatchError> {
    let raw = provider.fetch_candles(&request.pair, request.days)?;
    let candles = clean_series(&raw);

    match run_backtest(
        &candles,
        &request.entry,
        &request.exit,
        request.initial_capital,
        request.allow_multiple_trades,
    ) {
        Ok(result) => Ok(BacktestResponse {
            success: true,
            error: None,
            pair: request.pair.clone(),
            days: request.days,
            trades: result.trades,
            summary: Some(result.summary),
        }),
        Err(err @ RatewatchError::InsufficientHistory { .. }) => Ok(BacktestResponse {
            success: false,
            error: Some(err.to_string()),
            pair: request.pair.clone(),
            days: request.days,
            trades: Vec::new(),
            summary: None,
        }),
        Err(other) => Err(other),
    }
}
