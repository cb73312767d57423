//! Historical data access port.

use crate::domain::candle::RawCandle;
use crate::domain::error::RatewatchError;

/// Supplies the trailing daily candle series for an instrument.
///
/// Implementations return rows in ascending date order with a numeric close
/// on every row they emit; open/high/low may be absent. Gaps in coverage are
/// allowed — the caller cleans the series before evaluation.
pub trait HistoricalDataProvider {
    fn fetch_candles(&self, pair: &str, days: u32) -> Result<Vec<RawCandle>, RatewatchError>;
}
