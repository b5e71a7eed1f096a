use thiserror::Error;

/// Category a source adapter reports its failures under (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterErrorKind {
    Transient,
    RateLimited,
    Auth,
    Malformed,
    Unavailable,
}

impl AdapterErrorKind {
    /// TRANSIENT and RATE_LIMITED are retryable with backoff; AUTH/MALFORMED/UNAVAILABLE are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterErrorKind::Transient | AdapterErrorKind::RateLimited)
    }
}

#[derive(Error, Debug)]
#[error("{kind:?} error from source {source_id}: {message}")]
pub struct AdapterError {
    pub source_id: String,
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl AdapterError {
    pub fn new(source_id: impl Into<String>, kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            kind,
            message: message.into(),
        }
    }
}

/// The §7 error taxonomy, shared across every pipeline stage.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("sanitizer rejected sample for {symbol} from {source_id}")]
    SanitizationReject { symbol: String, source_id: String },

    #[error("insufficient constituents: {have} < required {required}")]
    InsufficientConstituents { have: usize, required: usize },

    #[error("store monotonicity violation for key {key}")]
    StoreConflict { key: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("cycle deadline exceeded before any constituents were produced")]
    DeadlineExceeded,
}
