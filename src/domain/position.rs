//! Open position and closed trade records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open simulated position. Lives only inside a single backtest run;
/// the simulator holds at most one at a time and never persists it.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_index: usize,
}

/// Why a simulated trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TimeExit,
    SignalExit,
    EndOfData,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::TimeExit => "time_exit",
            ExitReason::SignalExit => "signal_exit",
            ExitReason::EndOfData => "end_of_data",
        };
        f.write_str(s)
    }
}

/// A completed round-trip trade. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub pnl_pct: f64,
    pub holding_days: usize,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn close(
        position: &Position,
        exit_date: NaiveDate,
        exit_price: f64,
        exit_index: usize,
        exit_reason: ExitReason,
    ) -> Self {
        let pnl_pct = if position.entry_price != 0.0 {
            (exit_price - position.entry_price) / position.entry_price * 100.0
        } else {
            0.0
        };
        Trade {
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_date,
            exit_price,
            pnl_pct,
            holding_days: exit_index - position.entry_index,
            exit_reason,
        }
    }
}
