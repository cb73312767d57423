//! CSV candle file adapter.
//!
//! One file per pair under a base directory, named with the pair's slashes
//! replaced by underscores (`EUR/USD` → `EUR_USD.csv`). Columns are
//! `date,open,high,low,close`; open/high/low cells may be empty — many FX
//! exports carry closes only.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::candle::RawCandle;
use crate::domain::error::RatewatchError;
use crate::ports::data_port::HistoricalDataProvider;

pub struct CsvCandleAdapter {
    base_path: PathBuf,
}

impl CsvCandleAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, pair: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", pair.replace('/', "_")))
    }

    fn parse_optional(cell: Option<&str>, column: &str) -> Result<Option<f64>, RatewatchError> {
        match cell.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse::<f64>()
                .map(Some)
                .map_err(|e| RatewatchError::Data {
                    reason: format!("invalid {} value {:?}: {}", column, value, e),
                }),
        }
    }
}

impl HistoricalDataProvider for CsvCandleAdapter {
    fn fetch_candles(&self, pair: &str, days: u32) -> Result<Vec<RawCandle>, RatewatchError> {
        let path = self.csv_path(pair);
        let content = fs::read_to_string(&path).map_err(|e| RatewatchError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| RatewatchError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| RatewatchError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                RatewatchError::Data {
                    reason: format!("invalid date {:?}: {}", date_str, e),
                }
            })?;

            let open = Self::parse_optional(record.get(1), "open")?;
            let high = Self::parse_optional(record.get(2), "high")?;
            let low = Self::parse_optional(record.get(3), "low")?;

            let close_str = record
                .get(4)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| RatewatchError::Data {
                    reason: format!("missing close on {}", date),
                })?;
            let close: f64 = close_str.parse().map_err(|e| RatewatchError::Data {
                reason: format!("invalid close value {:?}: {}", close_str, e),
            })?;

            candles.push(RawCandle {
                date,
                open,
                high,
                low,
                close,
            });
        }

        candles.sort_by_key(|c| c.date);
        let keep = days as usize;
        if candles.len() > keep {
            candles.drain(..candles.len() - keep);
        }
        Ok(candles)
    }
}
