//! Error types for the invoker crates.
//!
//! Only configuration problems originate here. Failures of a wrapped
//! operation are the operation's own error type and never pass through
//! [`InvokerError`].

use thiserror::Error;

/// Result type alias using `InvokerError`.
pub type Result<T> = std::result::Result<T, InvokerError>;

/// Main error type for invoker configuration.
#[derive(Debug, Error)]
pub enum InvokerError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A configuration value is out of range.
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration {
        /// Name of the offending setting
        field: String,
        /// What is wrong with its value
        reason: String,
    },

    /// A configuration value could not be parsed.
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl InvokerError {
    /// Builds an `InvalidConfiguration` error for the given field.
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        InvokerError::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error comes from bad configuration input.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            InvokerError::InvalidConfiguration { .. }
                | InvokerError::ConfigParse(_)
                | InvokerError::JsonError(_)
        )
    }
}
