//! Core domain types and logic.

pub mod backtest;
pub mod candle;
pub mod condition;
pub mod error;
pub mod exit;
pub mod monitor;
pub mod position;
pub mod signal;
pub mod stats;
pub mod summary;
