//! Domain error types.
//!
//! Insufficient lookback inside an evaluator is *not* an error — evaluators
//! return an untriggered verdict instead. These variants cover request-level
//! and configuration failures only.

/// Top-level error type for ratewatch.
#[derive(Debug, thiserror::Error)]
pub enum RatewatchError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid condition: {reason}")]
    InvalidCondition { reason: String },

    #[error("insufficient history: have {have} usable candles, need {minimum}")]
    InsufficientHistory { have: usize, minimum: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RatewatchError> for std::process::ExitCode {
    fn from(err: &RatewatchError) -> Self {
        let code: u8 = match err {
            RatewatchError::Io(_) => 1,
            RatewatchError::ConfigParse { .. }
            | RatewatchError::ConfigMissing { .. }
            | RatewatchError::ConfigInvalid { .. } => 2,
            RatewatchError::Data { .. } | RatewatchError::Json(_) => 3,
            RatewatchError::InvalidCondition { .. } => 4,
            RatewatchError::InsufficientHistory { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
