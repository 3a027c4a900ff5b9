// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the crash ETL

use crittercism_client::CrittercismError;
use thiserror::Error;

/// Result type alias for ETL operations
pub type EtlResult<T> = Result<T, EtlError>;

/// Errors that abort an ETL pass
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum EtlError {
    /// Any failure reported by the Crittercism client
    #[error(transparent)]
    Client(#[from] CrittercismError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An error summary lacks a field the merge depends on
    #[error("Invalid crash record: {message}")]
    InvalidRecord { message: String },

    /// The event sink rejected the records
    #[error("Sink error: {message}")]
    Sink { message: String },
}

impl EtlError {
    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// Create an invalid record error
    pub fn invalid_record<T: ToString>(message: T) -> Self {
        Self::InvalidRecord {
            message: message.to_string(),
        }
    }

    /// Create a sink error
    pub fn sink<T: ToString>(message: T) -> Self {
        Self::Sink {
            message: message.to_string(),
        }
    }
}

impl From<config::ConfigError> for EtlError {
    fn from(error: config::ConfigError) -> Self {
        Self::config(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_transparent() {
        let error: EtlError = CrittercismError::config("no credentials").into();
        assert_eq!(error.to_string(), "Configuration error: no credentials");
        assert!(matches!(error, EtlError::Client(_)));
    }

    #[test]
    fn constructors() {
        assert!(matches!(
            EtlError::invalid_record("missing hash"),
            EtlError::InvalidRecord { .. }
        ));
        assert_eq!(
            EtlError::sink("closed").to_string(),
            "Sink error: closed"
        );
    }
}
