//! JSON-file backed preference store and alert history.
//!
//! Preferences are a JSON array of subscriptions; history is one JSON object
//! per line, appended as alerts fire.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::domain::error::RatewatchError;
use crate::domain::monitor::{AlertEvent, AlertPreference};
use crate::ports::alert_port::AlertHistory;
use crate::ports::preference_port::PreferenceStore;

pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn load_preferences(&self) -> Result<Vec<AlertPreference>, RatewatchError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

pub struct JsonAlertHistory {
    path: PathBuf,
}

impl JsonAlertHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl AlertHistory for JsonAlertHistory {
    fn record(&mut self, event: &AlertEvent) -> Result<(), RatewatchError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(event)?)?;
        Ok(())
    }
}
