use thiserror::Error;

/// Period error types covering initialization, configuration, and timestamp failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeriodError {
    /// The registry was already configured; existing configuration is untouched.
    #[error("period already initialized")]
    AlreadyInitialized,

    /// Configuration rejected at initialization (e.g. a null span).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Timestamp precedes the origin, or the clock could not produce one.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl PeriodError {
    /// Build an [`PeriodError::InvalidTimestamp`] from any message.
    pub fn invalid_timestamp(message: impl Into<String>) -> Self {
        Self::InvalidTimestamp(message.into())
    }

    /// Returns true for [`PeriodError::AlreadyInitialized`].
    ///
    /// Callers that treat a second initialization as idempotent can filter on this.
    #[must_use]
    pub fn is_already_initialized(&self) -> bool {
        matches!(self, Self::AlreadyInitialized)
    }
}

/// Convenience type alias for period operations.
pub type PeriodResult<T> = Result<T, PeriodError>;
