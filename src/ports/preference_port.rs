//! Alert preference storage port.

use crate::domain::error::RatewatchError;
use crate::domain::monitor::AlertPreference;

/// Supplies the per-instrument alert preferences a monitoring cycle walks.
pub trait PreferenceStore {
    fn load_preferences(&self) -> Result<Vec<AlertPreference>, RatewatchError>;
}
