//! Daily candle representation and series cleaning.
//!
//! Providers deliver [`RawCandle`]s whose open/high/low may be absent (many
//! FX feeds publish closes only). [`clean_series`] back-fills the gaps with
//! the close, so every [`Candle`] the core sees satisfies
//! low <= open, close <= high. A close-only day becomes a degenerate candle
//! with all four fields equal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A provider-shaped candle: close is mandatory, the rest may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
}

/// A cleaned daily candle. All OHLC fields are present and positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// A candle from a close-only observation: open = high = low = close.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Candle {
            date,
            open: close,
            high: close,
            low: close,
            close,
        }
    }
}

/// Back-fill missing open/high/low with the close and drop unusable rows.
///
/// Rows with a non-finite or non-positive close are discarded. High and low
/// are widened to cover open and close so the OHLC invariant always holds on
/// the output, even for sloppy upstream data.
pub fn clean_series(raw: &[RawCandle]) -> Vec<Candle> {
    let mut out = Vec::with_capacity(raw.len());
    for r in raw {
        if !r.close.is_finite() || r.close <= 0.0 {
            continue;
        }
        let open = r.open.filter(|v| v.is_finite()).unwrap_or(r.close);
        let high = r.high.filter(|v| v.is_finite()).unwrap_or(r.close);
        let low = r.low.filter(|v| v.is_finite()).unwrap_or(r.close);

        let high = high.max(open).max(r.close);
        let low = low.min(open).min(r.close);

        out.push(Candle {
            date: r.date,
            open,
            high,
            low,
            close: r.close,
        });
    }
    out
}

/// Closing prices of a candle slice, in series order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn from_close_is_degenerate() {
        let c = Candle::from_close(day(1), 1.25);
        assert_eq!(c.open, 1.25);
        assert_eq!(c.high, 1.25);
        assert_eq!(c.low, 1.25);
        assert_eq!(c.close, 1.25);
    }

    #[test]
    fn clean_series_backfills_missing_fields() {
        let raw = vec![RawCandle {
            date: day(1),
            open: None,
            high: None,
            low: None,
            close: 100.0,
        }];
        let cleaned = clean_series(&raw);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0], Candle::from_close(day(1), 100.0));
    }

    #[test]
    fn clean_series_keeps_full_candles() {
        let raw = vec![RawCandle {
            date: day(1),
            open: Some(100.0),
            high: Some(110.0),
            low: Some(95.0),
            close: 105.0,
        }];
        let cleaned = clean_series(&raw);
        assert_eq!(cleaned[0].high, 110.0);
        assert_eq!(cleaned[0].low, 95.0);
    }

    #[test]
    fn clean_series_drops_bad_close() {
        let raw = vec![
            RawCandle {
                date: day(1),
                open: None,
                high: None,
                low: None,
                close: f64::NAN,
            },
            RawCandle {
                date: day(2),
                open: None,
                high: None,
                low: None,
                close: 0.0,
            },
            RawCandle {
                date: day(3),
                open: None,
                high: None,
                low: None,
                close: 1.0,
            },
        ];
        let cleaned = clean_series(&raw);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].date, day(3));
    }

    #[test]
    fn clean_series_widens_inconsistent_range() {
        // high below close: the invariant wins over the reported range
        let raw = vec![RawCandle {
            date: day(1),
            open: Some(100.0),
            high: Some(99.0),
            low: Some(101.0),
            close: 100.0,
        }];
        let cleaned = clean_series(&raw);
        assert!(cleaned[0].low <= cleaned[0].open && cleaned[0].open <= cleaned[0].high);
        assert!(cleaned[0].low <= cleaned[0].close && cleaned[0].close <= cleaned[0].high);
    }

    #[test]
    fn closes_extracts_in_order() {
        let candles = vec![
            Candle::from_close(day(1), 1.0),
            Candle::from_close(day(2), 2.0),
        ];
        assert_eq!(closes(&candles), vec![1.0, 2.0]);
    }
}
