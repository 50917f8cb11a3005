//! Error types for the relay library.

use thiserror::Error;

/// Main error type for transfer operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target provisioning failed (index could not be deleted/created,
    /// or the sink was configured without a destination name).
    #[error("Provisioning error: {0}")]
    Provisioning(String),

    /// A bulk persist operation reported per-record failures.
    #[error("Persist error: {detail}")]
    Persist { detail: String },

    /// A record destined for a bulk sink has no 'uuid' identifier field.
    #[error("Record is missing the 'uuid' identifier field")]
    MissingId,

    /// The hand-off queue was closed while the producer still had records.
    #[error("Hand-off queue closed before production finished")]
    QueueClosed,

    /// A background task panicked or was torn down unexpectedly.
    #[error("Background task failed: {0}")]
    Task(String),

    /// A document frame did not parse as JSON.
    #[error("Malformed input: {0}")]
    Malformed(#[from] serde_json::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Remote list (Redis) error
    #[error("Remote list error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP transport error talking to a bulk target
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RelayError {
    /// Create a Persist error carrying the first reported failure detail.
    pub fn persist(detail: impl Into<String>) -> Self {
        RelayError::Persist {
            detail: detail.into(),
        }
    }

    /// Create a Provisioning error.
    pub fn provisioning(message: impl Into<String>) -> Self {
        RelayError::Provisioning(message.into())
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            RelayError::Config(_) | RelayError::Yaml(_) => 2,
            RelayError::Provisioning(_) => 3,
            RelayError::Persist { .. } | RelayError::MissingId => 4,
            RelayError::Malformed(_) => 5,
            _ => 1,
        }
    }
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
