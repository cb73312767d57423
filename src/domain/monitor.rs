//! Monitoring cycle support: preference gating and alert cooldowns.
//!
//! All state that outlives a single check (last-alert timestamps) lives in a
//! [`CooldownTracker`] owned by the caller and passed in explicitly. The
//! clock is likewise an input (`now`, unix seconds), so a cycle can be
//! replayed deterministically in tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::candle::{Candle, clean_series};
use super::condition::ConditionConfig;
use super::error::RatewatchError;
use super::signal;
use crate::ports::alert_port::{AlertHistory, NotificationSink};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::HistoricalDataProvider;
use crate::ports::preference_port::PreferenceStore;

/// Days of history fetched per pair when the config does not say otherwise.
pub const DEFAULT_HISTORY_DAYS: u32 = 365;

/// Minimum elapsed seconds before a pair may re-alert.
pub const DEFAULT_COOLDOWN_SECS: i64 = 3600;

/// How often a scheduler is expected to call [`run_cycle`].
pub const DEFAULT_CHECK_INTERVAL_SECS: i64 = 900;

/// One instrument's alert subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPreference {
    pub pair: String,
    pub condition: ConditionConfig,
    pub enabled: bool,
}

/// A triggered alert, ready for delivery and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub pair: String,
    pub condition: ConditionConfig,
    pub metrics: HashMap<String, f64>,
    /// Unix seconds at which the trigger was observed.
    pub triggered_at: i64,
}

/// Per-pair last-alert timestamps with a shared cooldown window.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownTracker {
    cooldown_secs: i64,
    last_alert: HashMap<String, i64>,
}

impl CooldownTracker {
    pub fn new(cooldown_secs: i64) -> Self {
        Self {
            cooldown_secs,
            last_alert: HashMap::new(),
        }
    }

    /// True when `pair` has never alerted or its cooldown has elapsed.
    pub fn ready(&self, pair: &str, now: i64) -> bool {
        match self.last_alert.get(pair) {
            Some(&last) => now - last >= self.cooldown_secs,
            None => true,
        }
    }

    pub fn mark(&mut self, pair: &str, now: i64) {
        self.last_alert.insert(pair.to_string(), now);
    }
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}

/// Monitoring loop settings, read from the `[monitoring]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub history_days: u32,
    pub check_interval_secs: i64,
    pub cooldown_secs: i64,
}

impl MonitorSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        Self {
            history_days: config
                .get_int("monitoring", "history_days", DEFAULT_HISTORY_DAYS as i64)
                .max(1) as u32,
            check_interval_secs: config.get_int(
                "monitoring",
                "check_interval_secs",
                DEFAULT_CHECK_INTERVAL_SECS,
            ),
            cooldown_secs: config.get_int("monitoring", "cooldown_secs", DEFAULT_COOLDOWN_SECS),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            history_days: DEFAULT_HISTORY_DAYS,
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

/// What one monitoring cycle produced. Per-pair failures are collected, not
/// fatal — one broken feed must not silence every other pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleOutcome {
    pub alerts: Vec<AlertEvent>,
    /// (pair, reason) for every pair that could not be checked.
    pub failures: Vec<(String, String)>,
}

/// Evaluate one preference against an already-cleaned window.
///
/// Returns the alert to deliver, or `None` when the preference is disabled,
/// the pair is cooling down, or the condition simply did not trigger. Marks
/// the tracker only on a delivered alert.
pub fn check_pair(
    candles: &[Candle],
    preference: &AlertPreference,
    tracker: &mut CooldownTracker,
    now: i64,
) -> Option<AlertEvent> {
    if !preference.enabled || !tracker.ready(&preference.pair, now) {
        return None;
    }
    let verdict = signal::evaluate(candles, &preference.condition);
    if !verdict.triggered {
        return None;
    }
    tracker.mark(&preference.pair, now);
    Some(AlertEvent {
        pair: preference.pair.clone(),
        condition: preference.condition.clone(),
        metrics: verdict.metrics,
        triggered_at: now,
    })
}

/// Run one full monitoring cycle: load preferences, fetch and clean each
/// enabled pair's history, evaluate, and route triggered alerts to the sink
/// and the history store.
pub fn run_cycle(
    provider: &dyn HistoricalDataProvider,
    preferences: &dyn PreferenceStore,
    sink: &dyn NotificationSink,
    history: &mut dyn AlertHistory,
    tracker: &mut CooldownTracker,
    settings: &MonitorSettings,
    now: i64,
) -> Result<CycleOutcome, RatewatchError> {
    let mut outcome = CycleOutcome::default();

    for preference in preferences.load_preferences()? {
        if !preference.enabled {
            continue;
        }
        let raw = match provider.fetch_candles(&preference.pair, settings.history_days) {
            Ok(raw) => raw,
            Err(err) => {
                outcome.failures.push((preference.pair.clone(), err.to_string()));
                continue;
            }
        };
        let candles = clean_series(&raw);

        if let Some(event) = check_pair(&candles, &preference, tracker, now) {
            if let Err(err) = sink.notify(&event) {
                outcome.failures.push((preference.pair.clone(), err.to_string()));
            }
            if let Err(err) = history.record(&event) {
                outcome.failures.push((preference.pair.clone(), err.to_string()));
            }
            outcome.alerts.push(event);
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::{Candle, RawCandle};
    use crate::domain::condition::PriceTrigger;
    use crate::domain::error::RatewatchError;
    use chrono::NaiveDate;

    fn make_candles(prices: &[f64]) -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Candle::from_close(start + chrono::Duration::days(i as i64), p))
            .collect()
    }

    fn cross_above(level: f64) -> ConditionConfig {
        ConditionConfig::PriceLevel {
            high: Some(level),
            low: None,
            trigger: PriceTrigger::CrossesAbove,
        }
    }

    fn pref(pair: &str, enabled: bool) -> AlertPreference {
        AlertPreference {
            pair: pair.to_string(),
            condition: cross_above(101.0),
            enabled,
        }
    }

    #[test]
    fn cooldown_gates_repeat_alerts() {
        let mut tracker = CooldownTracker::new(3600);
        assert!(tracker.ready("EUR/USD", 1_000));
        tracker.mark("EUR/USD", 1_000);
        assert!(!tracker.ready("EUR/USD", 1_000 + 3599));
        assert!(tracker.ready("EUR/USD", 1_000 + 3600));
        assert!(tracker.ready("GBP/USD", 1_001));
    }

    #[test]
    fn check_pair_alerts_and_marks() {
        let candles = make_candles(&[100.0, 102.0]);
        let mut tracker = CooldownTracker::new(3600);
        let event = check_pair(&candles, &pref("EUR/USD", true), &mut tracker, 5_000).unwrap();
        assert_eq!(event.pair, "EUR/USD");
        assert_eq!(event.triggered_at, 5_000);
        // second check inside the window is suppressed
        assert!(check_pair(&candles, &pref("EUR/USD", true), &mut tracker, 5_100).is_none());
    }

    #[test]
    fn disabled_preference_never_evaluates() {
        let candles = make_candles(&[100.0, 102.0]);
        let mut tracker = CooldownTracker::new(3600);
        assert!(check_pair(&candles, &pref("EUR/USD", false), &mut tracker, 5_000).is_none());
        // and it must not consume the cooldown
        assert!(tracker.ready("EUR/USD", 5_000));
    }

    #[test]
    fn untriggered_condition_leaves_cooldown_untouched() {
        let candles = make_candles(&[100.0, 100.5]);
        let mut tracker = CooldownTracker::new(3600);
        assert!(check_pair(&candles, &pref("EUR/USD", true), &mut tracker, 5_000).is_none());
        assert!(tracker.ready("EUR/USD", 5_000));
    }

    struct FixedProvider {
        prices: Vec<f64>,
        fail_pair: Option<String>,
    }

    impl HistoricalDataProvider for FixedProvider {
        fn fetch_candles(&self, pair: &str, _days: u32) -> Result<Vec<RawCandle>, RatewatchError> {
            if self.fail_pair.as_deref() == Some(pair) {
                return Err(RatewatchError::Data {
                    reason: format!("no feed for {pair}"),
                });
            }
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok(self
                .prices
                .iter()
                .enumerate()
                .map(|(i, &p)| RawCandle {
                    date: start + chrono::Duration::days(i as i64),
                    open: None,
                    high: None,
                    low: None,
                    close: p,
                })
                .collect())
        }
    }

    struct FixedPrefs(Vec<AlertPreference>);

    impl PreferenceStore for FixedPrefs {
        fn load_preferences(&self) -> Result<Vec<AlertPreference>, RatewatchError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: std::cell::RefCell<Vec<AlertEvent>>,
    }

    impl NotificationSink for Recorder {
        fn notify(&self, event: &AlertEvent) -> Result<(), RatewatchError> {
            self.events.borrow_mut().push(event.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct History(Vec<AlertEvent>);

    impl AlertHistory for History {
        fn record(&mut self, event: &AlertEvent) -> Result<(), RatewatchError> {
            self.0.push(event.clone());
            Ok(())
        }
    }

    #[test]
    fn cycle_alerts_enabled_pairs_only() {
        let provider = FixedProvider {
            prices: vec![100.0, 102.0],
            fail_pair: None,
        };
        let prefs = FixedPrefs(vec![pref("EUR/USD", true), pref("GBP/USD", false)]);
        let sink = Recorder::default();
        let mut history = History::default();
        let mut tracker = CooldownTracker::default();

        let outcome = run_cycle(
            &provider,
            &prefs,
            &sink,
            &mut history,
            &mut tracker,
            &MonitorSettings::default(),
            10_000,
        )
        .unwrap();

        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].pair, "EUR/USD");
        assert!(outcome.failures.is_empty());
        assert_eq!(sink.events.borrow().len(), 1);
        assert_eq!(history.0.len(), 1);
    }

    #[test]
    fn cycle_collects_per_pair_failures() {
        let provider = FixedProvider {
            prices: vec![100.0, 102.0],
            fail_pair: Some("GBP/USD".to_string()),
        };
        let prefs = FixedPrefs(vec![pref("GBP/USD", true), pref("EUR/USD", true)]);
        let sink = Recorder::default();
        let mut history = History::default();
        let mut tracker = CooldownTracker::default();

        let outcome = run_cycle(
            &provider,
            &prefs,
            &sink,
            &mut history,
            &mut tracker,
            &MonitorSettings::default(),
            10_000,
        )
        .unwrap();

        // the failing pair is reported, the healthy one still alerts
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, "GBP/USD");
        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].pair, "EUR/USD");
    }

    #[test]
    fn settings_defaults() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.history_days, 365);
        assert_eq!(settings.check_interval_secs, 900);
        assert_eq!(settings.cooldown_secs, 3600);
    }
}
