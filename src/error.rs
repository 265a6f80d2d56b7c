//! Error types for Querion.
//!
//! One variant per failure kind in the pipeline; callers branch on the
//! variant, never on message text.

use thiserror::Error;

/// Main error type for Querion operations.
#[derive(Error, Debug)]
pub enum QuerionError {
    /// Invalid client input (missing fields, malformed values).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// SQL generation failed after exhausting all candidate models,
    /// or generation was impossible (missing key, unusable schema).
    #[error("Generation error: {0}")]
    Generation(String),

    /// The generated SQL violated the read-only policy.
    #[error("Security error: {0}")]
    Security(String),

    /// Query execution failed against the target database.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Could not reach or authenticate against a database.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Local connection store errors.
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration errors (invalid config file, missing required fields).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QuerionError {
    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a not-found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates a security error with the given message.
    pub fn security(msg: impl Into<String>) -> Self {
        Self::Security(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a store error with the given message.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error kind as a stable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not-found",
            Self::Generation(_) => "generation",
            Self::Security(_) => "security",
            Self::Execution(_) => "execution",
            Self::Connection(_) => "connection",
            Self::Store(_) => "store",
            Self::Config(_) => "config",
        }
    }

    /// Returns true if the error should be reported as a client error
    /// rather than a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::Generation(_)
        )
    }
}

/// Result type alias using QuerionError.
pub type Result<T> = std::result::Result<T, QuerionError>;
