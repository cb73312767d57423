//! Performance summary over a trade ledger.
//!
//! Trades are compounded sequentially — the simulator's single-position
//! invariant guarantees they never overlap.

use serde::{Deserialize, Serialize};

use super::position::Trade;

/// Aggregate performance figures for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub num_trades: usize,
    pub win_rate_pct: f64,
    pub avg_trade_pnl_pct: f64,
    pub total_return_pct: f64,
    pub final_equity: f64,
    pub max_drawdown_pct: f64,
}

/// Equity after each trade, starting from `initial_capital`.
pub fn equity_curve(trades: &[Trade], initial_capital: f64) -> Vec<f64> {
    let mut equity = initial_capital;
    let mut curve = Vec::with_capacity(trades.len() + 1);
    curve.push(equity);
    for trade in trades {
        equity *= 1.0 + trade.pnl_pct / 100.0;
        curve.push(equity);
    }
    curve
}

/// Largest peak-to-trough decline of the equity curve, as a percentage of
/// the running peak. 0 when the curve never falls below a prior peak.
pub fn max_drawdown_pct(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0;
    for &value in curve {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd * 100.0
}

/// Summarize a trade ledger.
///
/// A trade with pnl_pct exactly 0 counts as a loss for the win rate.
pub fn summarize(trades: &[Trade], initial_capital: f64) -> Summary {
    let curve = equity_curve(trades, initial_capital);
    let final_equity = *curve.last().unwrap_or(&initial_capital);

    let total_return_pct = if initial_capital != 0.0 {
        (final_equity - initial_capital) / initial_capital * 100.0
    } else {
        0.0
    };

    let num_trades = trades.len();
    let wins = trades.iter().filter(|t| t.pnl_pct > 0.0).count();
    let win_rate_pct = if num_trades > 0 {
        wins as f64 / num_trades as f64 * 100.0
    } else {
        0.0
    };

    let avg_trade_pnl_pct = if num_trades > 0 {
        trades.iter().map(|t| t.pnl_pct).sum::<f64>() / num_trades as f64
    } else {
        0.0
    };

    Summary {
        num_trades,
        win_rate_pct,
        avg_trade_pnl_pct,
        total_return_pct,
        final_equity,
        max_drawdown_pct: max_drawdown_pct(&curve),
    }
}
