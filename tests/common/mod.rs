#![allow(dead_code)]

use std::collections::HashMap;

use chrono::NaiveDate;
use ratewatch::domain::candle::RawCandle;
use ratewatch::domain::error::RatewatchError;
use ratewatch::ports::data_port::HistoricalDataProvider;

pub struct MockDataProvider {
    pub data: HashMap<String, Vec<RawCandle>>,
    pub errors: HashMap<String, String>,
}

impl MockDataProvider {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, pair: &str, candles: Vec<RawCandle>) -> Self {
        self.data.insert(pair.to_string(), candles);
        self
    }

    pub fn with_error(mut self, pair: &str, reason: &str) -> Self {
        self.errors.insert(pair.to_string(), reason.to_string());
        self
    }
}

impl HistoricalDataProvider for MockDataProvider {
    fn fetch_candles(&self, pair: &str, days: u32) -> Result<Vec<RawCandle>, RatewatchError> {
        if let Some(reason) = self.errors.get(pair) {
            return Err(RatewatchError::Data {
                reason: reason.clone(),
            });
        }
        let mut candles = self.data.get(pair).cloned().unwrap_or_default();
        let keep = days as usize;
        if candles.len() > keep {
            candles.drain(..candles.len() - keep);
        }
        Ok(candles)
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Close-only raw candles, one per day from 2024-01-01.
pub fn make_raw_candles(closes: &[f64]) -> Vec<RawCandle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| RawCandle {
            date: start_date() + chrono::Duration::days(i as i64),
            open: None,
            high: None,
            low: None,
            close,
        })
        .collect()
}

/// Raw candles with explicit high/low around each close.
pub fn make_ranged_candles(rows: &[(f64, f64, f64)]) -> Vec<RawCandle> {
    rows.iter()
        .enumerate()
        .map(|(i, &(low, close, high))| RawCandle {
            date: start_date() + chrono::Duration::days(i as i64),
            open: Some(close),
            high: Some(high),
            low: Some(low),
            close,
        })
        .collect()
}
