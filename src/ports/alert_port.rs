//! Outbound alert ports: delivery and history.

use crate::domain::error::RatewatchError;
use crate::domain::monitor::AlertEvent;

/// Delivers a triggered alert to the user (email, webhook, stdout).
pub trait NotificationSink {
    fn notify(&self, event: &AlertEvent) -> Result<(), RatewatchError>;
}

/// Records triggered alerts for later inspection.
pub trait AlertHistory {
    fn record(&mut self, event: &AlertEvent) -> Result<(), RatewatchError>;
}
