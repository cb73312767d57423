//! Port traits separating the domain from its external collaborators.

pub mod alert_port;
pub mod config_port;
pub mod data_port;
pub mod preference_port;
