//! Error types for Hartape

use std::io;
use thiserror::Error;

/// Result type for Hartape operations
pub type Result<T> = std::result::Result<T, HartapeError>;

/// Boxed error produced by a transport
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in Hartape
#[derive(Debug, Error)]
pub enum HartapeError {
    /// No recorded message satisfies the matcher for this request
    #[error("No matching interaction for request {method} {url}")]
    NoMatchFound {
        /// Request method
        method: String,
        /// Request URL
        url: String,
    },

    /// Interaction storage is missing, unreadable or unwritable
    #[error("Interaction repository failure for {interaction}: {reason}")]
    RepositoryFailure {
        /// Storage identifier of the interaction
        interaction: String,
        /// What went wrong
        reason: String,
    },

    /// Failure reported by the underlying transport, passed through as-is
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Request could not be turned into a wire request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl HartapeError {
    /// Build a repository failure for `interaction`
    pub fn repository(interaction: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::RepositoryFailure {
            interaction: interaction.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a transport failure
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<TransportError>,
    {
        Self::Transport(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_message_names_request() {
        let error = HartapeError::NoMatchFound {
            method: "GET".to_string(),
            url: "http://localhost/json".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "No matching interaction for request GET http://localhost/json"
        );
    }

    #[test]
    fn test_repository_failure_names_interaction() {
        let error = HartapeError::repository("fixtures/test.har", "not found");
        assert!(error.to_string().contains("fixtures/test.har"));
    }

    #[test]
    fn test_transport_error_keeps_source() {
        let error = HartapeError::transport(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        let source = std::error::Error::source(&error).unwrap();
        assert_eq!(source.to_string(), "refused");
    }
}
