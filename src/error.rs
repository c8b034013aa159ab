//! Error types for the analysis engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadarError {
    #[error("data source unavailable: {0}")]
    DataUnavailable(String),

    #[error("schema mismatch in {source_name}: missing required column '{column}'")]
    SchemaMismatch { source_name: String, column: String },

    #[error("insufficient history: {observed} valid observations, need at least {required}")]
    InsufficientHistory { observed: usize, required: usize },

    #[error("forecast failed: {0}")]
    ForecastFailed(String),

    #[error("sentiment classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("missing input for synthesis: {0}")]
    MissingInput(String),

    #[error("recommendation generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// The distinguishable ways a chat-completion call can fail. Timeout,
/// HTTP-level failure and malformed body are kept apart so the caller can
/// label each one.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("request failed: {0}")]
    Request(String),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

impl RadarError {
    /// Status code captured from a failed generation call, if any.
    pub fn generation_status(&self) -> Option<u16> {
        match self {
            RadarError::GenerationFailed(GenerationError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RadarError>;
