//! Alert condition configuration and evaluation verdicts.
//!
//! Conditions form a closed sum type — one variant per rule family — so the
//! evaluator dispatch is exhaustive instead of falling through on an unknown
//! string tag. The serde representation keeps the external payload shape:
//! `{"type": "percentage_change", "period": 30, ...}`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::RatewatchError;

/// Minimum regression R² for `LongTermUptrend` to confirm a trend.
///
/// A tunable noise filter: below this the price path is too jagged to call
/// linear, even when the endpoint-to-endpoint change clears the threshold.
pub const R_SQUARED_FLOOR: f64 = 0.25;

/// Each of the last min(5, n) points must be at least this fraction of its
/// predecessor for a window to count as a consistent trend. Tolerates small
/// wobble, rejects sharp pullbacks.
pub const CONSISTENCY_TOLERANCE: f64 = 0.998;

/// A close counts as "at" a historical extreme when within 0.1% of it.
pub const EXTREME_PROXIMITY: f64 = 0.001;

/// Recent-to-older volatility ratio above which the high regime triggers.
pub const HIGH_VOL_RATIO: f64 = 2.0;

/// Recent-to-older volatility ratio below which the low regime triggers.
pub const LOW_VOL_RATIO: f64 = 0.5;

/// Calendar-day approximation used to turn lookback years into candles.
pub const DAYS_PER_YEAR: usize = 365;

fn default_true() -> bool {
    true
}

fn default_change_period() -> usize {
    30
}

fn default_change_threshold() -> f64 {
    2.0
}

fn default_uptrend_period() -> usize {
    365
}

fn default_uptrend_threshold() -> f64 {
    5.0
}

fn default_short_ma() -> usize {
    10
}

fn default_long_ma() -> usize {
    50
}

fn default_uptrend_short_ma() -> usize {
    50
}

fn default_uptrend_long_ma() -> usize {
    200
}

fn default_lookback_years() -> u32 {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrigger {
    #[default]
    CrossesAbove,
    CrossesBelow,
    Between,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossSignal {
    #[default]
    GoldenCross,
    DeathCross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityRegime {
    #[default]
    High,
    Low,
}

/// One alert condition. Exactly one variant is active per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionConfig {
    PercentageChange {
        #[serde(default = "default_change_period")]
        period: usize,
        #[serde(default = "default_change_threshold")]
        threshold_pct: f64,
        #[serde(default = "default_true")]
        require_consistency: bool,
    },
    LongTermUptrend {
        #[serde(default = "default_uptrend_period")]
        period: usize,
        #[serde(default = "default_uptrend_threshold")]
        threshold_pct: f64,
        #[serde(default = "default_true")]
        require_consistency: bool,
        #[serde(default = "default_uptrend_short_ma")]
        short_ma_period: usize,
        #[serde(default = "default_uptrend_long_ma")]
        long_ma_period: usize,
    },
    PriceLevel {
        #[serde(default)]
        high: Option<f64>,
        #[serde(default)]
        low: Option<f64>,
        #[serde(default)]
        trigger: PriceTrigger,
    },
    MovingAverageCrossover {
        #[serde(default = "default_short_ma")]
        short_period: usize,
        #[serde(default = "default_long_ma")]
        long_period: usize,
        #[serde(default)]
        signal: CrossSignal,
    },
    HistoricalHigh {
        #[serde(default = "default_lookback_years")]
        lookback_years: u32,
    },
    HistoricalLow {
        #[serde(default = "default_lookback_years")]
        lookback_years: u32,
    },
    Volatility {
        lookback_period: usize,
        #[serde(default)]
        regime: VolatilityRegime,
    },
}

impl ConditionConfig {
    /// Reject parameter combinations with no safe normalization.
    ///
    /// The evaluator itself treats these as permanently non-triggering; this
    /// surfaces the mistake up front for config tooling. Reversed price
    /// bounds are *not* an error — they are swapped during evaluation.
    pub fn validate(&self) -> Result<(), RatewatchError> {
        match self {
            ConditionConfig::MovingAverageCrossover {
                short_period,
                long_period,
                ..
            } => {
                if long_period <= short_period {
                    return Err(RatewatchError::InvalidCondition {
                        reason: format!(
                            "long_period ({long_period}) must exceed short_period ({short_period})"
                        ),
                    });
                }
                if *short_period == 0 {
                    return Err(RatewatchError::InvalidCondition {
                        reason: "short_period must be positive".into(),
                    });
                }
                Ok(())
            }
            ConditionConfig::LongTermUptrend {
                short_ma_period,
                long_ma_period,
                period,
                ..
            } => {
                if long_ma_period <= short_ma_period {
                    return Err(RatewatchError::InvalidCondition {
                        reason: format!(
                            "long_ma_period ({long_ma_period}) must exceed short_ma_period ({short_ma_period})"
                        ),
                    });
                }
                if *period < 2 {
                    return Err(RatewatchError::InvalidCondition {
                        reason: "period must be at least 2".into(),
                    });
                }
                Ok(())
            }
            ConditionConfig::PercentageChange { period, .. } => {
                if *period < 2 {
                    return Err(RatewatchError::InvalidCondition {
                        reason: "period must be at least 2".into(),
                    });
                }
                Ok(())
            }
            ConditionConfig::PriceLevel { high, low, trigger } => match trigger {
                PriceTrigger::CrossesAbove if high.is_none() => {
                    Err(RatewatchError::InvalidCondition {
                        reason: "crosses_above requires a high bound".into(),
                    })
                }
                PriceTrigger::CrossesBelow if low.is_none() => {
                    Err(RatewatchError::InvalidCondition {
                        reason: "crosses_below requires a low bound".into(),
                    })
                }
                PriceTrigger::Between if high.is_none() || low.is_none() => {
                    Err(RatewatchError::InvalidCondition {
                        reason: "between requires both bounds".into(),
                    })
                }
                _ => Ok(()),
            },
            ConditionConfig::HistoricalHigh { lookback_years }
            | ConditionConfig::HistoricalLow { lookback_years } => {
                if *lookback_years == 0 {
                    return Err(RatewatchError::InvalidCondition {
                        reason: "lookback_years must be positive".into(),
                    });
                }
                Ok(())
            }
            ConditionConfig::Volatility {
                lookback_period, ..
            } => {
                if *lookback_period < 2 {
                    return Err(RatewatchError::InvalidCondition {
                        reason: "lookback_period must be at least 2".into(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Result of evaluating a condition against a candle window.
///
/// `metrics` carries named diagnostics (percent_change, short_ma, r_squared,
/// ...) for display and alert bodies; callers never branch on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub triggered: bool,
    pub metrics: HashMap<String, f64>,
}

impl Verdict {
    /// An untriggered verdict with no diagnostics — the normal outcome for a
    /// window shorter than the condition's lookback.
    pub fn miss() -> Self {
        Verdict {
            triggered: false,
            metrics: HashMap::new(),
        }
    }

    pub fn new(triggered: bool) -> Self {
        Verdict {
            triggered,
            metrics: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_json_round_trip() {
        let cond = ConditionConfig::MovingAverageCrossover {
            short_period: 10,
            long_period: 50,
            signal: CrossSignal::GoldenCross,
        };
        let json = serde_json::to_string(&cond).unwrap();
        assert!(json.contains("\"type\":\"moving_average_crossover\""));
        assert!(json.contains("\"signal\":\"golden_cross\""));
        let back: ConditionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cond);
    }

    #[test]
    fn condition_json_defaults_apply() {
        let cond: ConditionConfig =
            serde_json::from_str(r#"{"type": "percentage_change"}"#).unwrap();
        assert_eq!(
            cond,
            ConditionConfig::PercentageChange {
                period: 30,
                threshold_pct: 2.0,
                require_consistency: true,
            }
        );
    }

    #[test]
    fn uptrend_json_defaults_apply() {
        let cond: ConditionConfig =
            serde_json::from_str(r#"{"type": "long_term_uptrend"}"#).unwrap();
        assert_eq!(
            cond,
            ConditionConfig::LongTermUptrend {
                period: 365,
                threshold_pct: 5.0,
                require_consistency: true,
                short_ma_period: 50,
                long_ma_period: 200,
            }
        );
    }

    #[test]
    fn validate_rejects_reversed_ma_periods() {
        let cond = ConditionConfig::MovingAverageCrossover {
            short_period: 50,
            long_period: 10,
            signal: CrossSignal::GoldenCross,
        };
        assert!(cond.validate().is_err());

        let equal = ConditionConfig::MovingAverageCrossover {
            short_period: 10,
            long_period: 10,
            signal: CrossSignal::GoldenCross,
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn validate_rejects_price_level_missing_bound() {
        let cond = ConditionConfig::PriceLevel {
            high: None,
            low: Some(1.0),
            trigger: PriceTrigger::CrossesAbove,
        };
        assert!(cond.validate().is_err());

        let between = ConditionConfig::PriceLevel {
            high: Some(2.0),
            low: None,
            trigger: PriceTrigger::Between,
        };
        assert!(between.validate().is_err());
    }

    #[test]
    fn validate_accepts_reversed_price_bounds() {
        // Reversed bounds have an unambiguous fix (swap) at evaluation time.
        let cond = ConditionConfig::PriceLevel {
            high: Some(1.0),
            low: Some(2.0),
            trigger: PriceTrigger::Between,
        };
        assert!(cond.validate().is_ok());
    }

    #[test]
    fn validate_rejects_degenerate_volatility() {
        let cond = ConditionConfig::Volatility {
            lookback_period: 1,
            regime: VolatilityRegime::High,
        };
        assert!(cond.validate().is_err());
    }

    #[test]
    fn verdict_builder() {
        let v = Verdict::new(true).with("percent_change", 3.5);
        assert!(v.triggered);
        assert_eq!(v.metric("percent_change"), Some(3.5));
        assert_eq!(v.metric("absent"), None);
    }

    #[test]
    fn verdict_miss_is_empty() {
        let v = Verdict::miss();
        assert!(!v.triggered);
        assert!(v.metrics.is_empty());
    }
}
