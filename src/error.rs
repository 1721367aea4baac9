use thiserror::Error;

/// Errors surfaced by the tuning loop and its harness
#[derive(Debug, Error)]
pub enum TunerError {
    /// Caller broke the turn protocol (loss missing after the first turn, or given on it)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The model reply did not contain a usable configuration
    #[error("Malformed response: {reason} (reply: {reply:?})")]
    MalformedResponse { reason: String, reply: String },

    /// A parameter requested by the harness is absent from the initial configuration
    #[error("Parameter not found in initial configuration: {0}")]
    MissingParameter(String),

    /// A proposed value cannot be used for the requested distribution
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    /// Transport or provider failure, passed through untouched
    #[error(transparent)]
    Provider(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Objective error: {0}")]
    Objective(String),
}

impl TunerError {
    pub(crate) fn malformed(reason: impl Into<String>, reply: &str) -> Self {
        TunerError::MalformedResponse {
            reason: reason.into(),
            reply: reply.to_string(),
        }
    }
}

/// Result type for tuning operations
pub type Result<T> = std::result::Result<T, TunerError>;
