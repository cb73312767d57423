//! Condition evaluation engine.
//!
//! [`evaluate`] is a pure function of (candle window, condition): no I/O, no
//! hidden state, deterministic. A window shorter than a condition's lookback
//! produces an untriggered verdict, never an error.
//!
//! # Crossing semantics
//!
//! Moving-average crosses compare "today" (the full window) against
//! "yesterday" (the window minus its last candle) and require a strict
//! cross: `golden_cross` fires only when the short average was at or below
//! the long average yesterday and is above it today, so a persisting state
//! does not re-trigger.

use super::candle::{Candle, closes};
use super::condition::{
    CONSISTENCY_TOLERANCE, ConditionConfig, CrossSignal, DAYS_PER_YEAR, EXTREME_PROXIMITY,
    HIGH_VOL_RATIO, LOW_VOL_RATIO, PriceTrigger, R_SQUARED_FLOOR, Verdict, VolatilityRegime,
};
use super::stats::{linear_regression, sma, stdev_of_returns};

/// Evaluate a condition against an ascending-date candle window.
pub fn evaluate(candles: &[Candle], config: &ConditionConfig) -> Verdict {
    match config {
        ConditionConfig::PercentageChange {
            period,
            threshold_pct,
            require_consistency,
        } => percentage_change(candles, *period, *threshold_pct, *require_consistency),
        ConditionConfig::LongTermUptrend {
            period,
            threshold_pct,
            require_consistency,
            short_ma_period,
            long_ma_period,
        } => long_term_uptrend(
            candles,
            *period,
            *threshold_pct,
            *require_consistency,
            *short_ma_period,
            *long_ma_period,
        ),
        ConditionConfig::PriceLevel { high, low, trigger } => {
            price_level(candles, *high, *low, *trigger)
        }
        ConditionConfig::MovingAverageCrossover {
            short_period,
            long_period,
            signal,
        } => ma_crossover(candles, *short_period, *long_period, *signal),
        ConditionConfig::HistoricalHigh { lookback_years } => {
            historical_extreme(candles, *lookback_years, Extreme::High)
        }
        ConditionConfig::HistoricalLow { lookback_years } => {
            historical_extreme(candles, *lookback_years, Extreme::Low)
        }
        ConditionConfig::Volatility {
            lookback_period,
            regime,
        } => volatility(candles, *lookback_period, *regime),
    }
}

/// The last min(5, n) points form a consistent trend when every point is at
/// least [`CONSISTENCY_TOLERANCE`] of its predecessor.
fn is_consistent(values: &[f64]) -> bool {
    let tail = if values.len() > 5 {
        &values[values.len() - 5..]
    } else {
        values
    };
    tail.windows(2).all(|w| w[1] >= w[0] * CONSISTENCY_TOLERANCE)
}

fn percentage_change(
    candles: &[Candle],
    period: usize,
    threshold_pct: f64,
    require_consistency: bool,
) -> Verdict {
    // A change needs two points, so periods below 2 are never satisfiable.
    if period < 2 {
        return Verdict::miss();
    }
    let prices = closes(candles);
    if prices.len() < period {
        return Verdict::miss();
    }

    let segment = &prices[prices.len() - period..];
    let first = segment[0];
    let last = segment[segment.len() - 1];
    if first == 0.0 {
        return Verdict::miss();
    }

    let pct = (last - first) / first * 100.0;
    let triggered = pct >= threshold_pct && (!require_consistency || is_consistent(segment));

    Verdict::new(triggered)
        .with("percent_change", pct)
        .with("first_price", first)
        .with("last_price", last)
}

fn long_term_uptrend(
    candles: &[Candle],
    period: usize,
    threshold_pct: f64,
    require_consistency: bool,
    short_ma_period: usize,
    long_ma_period: usize,
) -> Verdict {
    let prices = closes(candles);
    let lookback = period.max(long_ma_period + 2).max(60);
    if prices.len() < lookback || period < 2 {
        return Verdict::miss();
    }

    let segment = &prices[prices.len() - period..];
    let first = segment[0];
    let last = segment[segment.len() - 1];
    if first == 0.0 {
        return Verdict::miss();
    }

    let pct = (last - first) / first * 100.0;
    let pct_ok = pct >= threshold_pct && (!require_consistency || is_consistent(segment));

    let yesterday = &prices[..prices.len() - 1];
    let ma_ok = match (
        sma(&prices, short_ma_period),
        sma(&prices, long_ma_period),
        sma(yesterday, long_ma_period),
    ) {
        // Short above long, and the long average is not falling.
        (Some(short_today), Some(long_today), Some(long_yday)) => {
            short_today > long_today && long_today >= long_yday
        }
        _ => false,
    };

    let (slope, r_squared) = match linear_regression(segment) {
        Some(fit) => fit,
        None => return Verdict::miss(),
    };
    let reg_ok = slope > 0.0 && r_squared >= R_SQUARED_FLOOR;

    let mut verdict = Verdict::new(pct_ok && ma_ok && reg_ok)
        .with("percent_change", pct)
        .with("slope", slope)
        .with("r_squared", r_squared);
    if let (Some(s), Some(l)) = (sma(&prices, short_ma_period), sma(&prices, long_ma_period)) {
        verdict = verdict.with("short_ma", s).with("long_ma", l);
    }
    verdict
}

fn ma_crossover(
    candles: &[Candle],
    short_period: usize,
    long_period: usize,
    signal: CrossSignal,
) -> Verdict {
    // Out-of-order periods are never satisfiable, not an error.
    if long_period <= short_period || short_period == 0 {
        return Verdict::miss();
    }
    let prices = closes(candles);
    if prices.len() < long_period + 1 {
        return Verdict::miss();
    }

    let yesterday = &prices[..prices.len() - 1];
    let (Some(short_today), Some(long_today), Some(short_yday), Some(long_yday)) = (
        sma(&prices, short_period),
        sma(&prices, long_period),
        sma(yesterday, short_period),
        sma(yesterday, long_period),
    ) else {
        return Verdict::miss();
    };

    let triggered = match signal {
        CrossSignal::GoldenCross => short_yday <= long_yday && short_today > long_today,
        CrossSignal::DeathCross => short_yday >= long_yday && short_today < long_today,
    };

    Verdict::new(triggered)
        .with("short_ma", short_today)
        .with("long_ma", long_today)
        .with("short_ma_prev", short_yday)
        .with("long_ma_prev", long_yday)
}

fn price_level(
    candles: &[Candle],
    high: Option<f64>,
    low: Option<f64>,
    trigger: PriceTrigger,
) -> Verdict {
    // Reversed bounds have an unambiguous fix: swap.
    let (low, high) = match (low, high) {
        (Some(l), Some(h)) if l > h => (Some(h), Some(l)),
        other => other,
    };

    if candles.len() < 2 {
        return Verdict::miss();
    }
    let prev = &candles[candles.len() - 2];
    let cur = &candles[candles.len() - 1];

    // Cleaned candles always carry an intrabar range (degenerate candles
    // collapse it to the close), so the extreme is the effective trigger
    // price for crossings — the same rule the exit evaluator uses.
    let (triggered, level) = match trigger {
        PriceTrigger::CrossesAbove => match high {
            Some(level) => (prev.close < level && cur.high >= level, level),
            None => return Verdict::miss(),
        },
        PriceTrigger::CrossesBelow => match low {
            Some(level) => (prev.close > level && cur.low <= level, level),
            None => return Verdict::miss(),
        },
        PriceTrigger::Between => match (low, high) {
            (Some(l), Some(h)) => (l <= cur.close && cur.close <= h, l),
            _ => return Verdict::miss(),
        },
    };

    Verdict::new(triggered)
        .with("price", cur.close)
        .with("level", level)
}

enum Extreme {
    High,
    Low,
}

fn historical_extreme(candles: &[Candle], lookback_years: u32, which: Extreme) -> Verdict {
    if candles.len() < 2 {
        return Verdict::miss();
    }
    let lookback = (lookback_years as usize).saturating_mul(DAYS_PER_YEAR);
    let window = if candles.len() > lookback && lookback > 0 {
        &candles[candles.len() - lookback..]
    } else {
        candles
    };

    let prices = closes(window);
    let current = prices[prices.len() - 1];
    let max = prices.iter().cloned().fold(f64::MIN, f64::max);
    let min = prices.iter().cloned().fold(f64::MAX, f64::min);

    let extreme = match which {
        Extreme::High => max,
        Extreme::Low => min,
    };
    let triggered = extreme > 0.0 && (current - extreme).abs() < extreme * EXTREME_PROXIMITY;

    let mut verdict = Verdict::new(triggered)
        .with("current_price", current)
        .with("extreme", extreme);
    if max > min {
        verdict = verdict.with("proximity_percent", (current - min) / (max - min) * 100.0);
    }
    verdict
}

fn volatility(candles: &[Candle], lookback_period: usize, regime: VolatilityRegime) -> Verdict {
    let prices = closes(candles);
    // The older remainder needs at least one return of its own.
    if lookback_period < 2 || prices.len() < lookback_period + 2 {
        return Verdict::miss();
    }

    let split = prices.len() - lookback_period;
    let (older, recent) = prices.split_at(split);

    let (Some(recent_sd), Some(older_sd)) = (stdev_of_returns(recent), stdev_of_returns(older))
    else {
        return Verdict::miss();
    };

    let ratio = if older_sd == 0.0 {
        0.0
    } else {
        recent_sd / older_sd
    };

    let triggered = match regime {
        VolatilityRegime::High => ratio > HIGH_VOL_RATIO,
        VolatilityRegime::Low => ratio < LOW_VOL_RATIO,
    };

    Verdict::new(triggered)
        .with("recent_stdev", recent_sd)
        .with("older_stdev", older_sd)
        .with("ratio", ratio)
}
