// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for Crittercism API calls
//!
//! Every non-200 status the API returns is mapped onto exactly one variant of
//! [`CrittercismError`]. The API variants carry a human-readable message and the
//! [`RawResponse`] they were built from, so callers can log the status, URL and
//! body without re-issuing the request.

use thiserror::Error;

/// Result type alias for Crittercism client operations
pub type CrittercismResult<T> = Result<T, CrittercismError>;

const MALFORMED_REQUEST_MESSAGE: &str = "You provided invalid/malformed request parameters.";
const AUTHENTICATION_MESSAGE: &str = "You provided an invalid token. Please re-authenticate.";
const RATE_LIMIT_MESSAGE: &str =
    "You have exceeded your rate limit. Please decrease your request frequency.";
const SERVER_ERROR_MESSAGE: &str =
    "Server error on Crittercism API. Please contact Crittercism support";
const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error on Crittercism API.";

/// Snapshot of an HTTP response kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// URL the request was sent to
    pub url: String,
    /// Response body as text (may be empty)
    pub body: String,
}

/// Errors returned by the Crittercism client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum CrittercismError {
    /// No response arrived before the request timed out
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// 400: request parameters were invalid or malformed
    #[error("{message}")]
    MalformedRequest {
        message: String,
        response: RawResponse,
    },

    /// 401: the token was invalid or expired
    #[error("{message}")]
    Authentication {
        message: String,
        response: RawResponse,
    },

    /// 429: the client exceeded its rate limit
    #[error("{message}")]
    RateLimitExceeded {
        message: String,
        response: RawResponse,
    },

    /// 500: the server failed to handle the request
    #[error("{message}")]
    ServerError {
        message: String,
        response: RawResponse,
    },

    /// Any other non-200 status
    #[error("{message} (status {})", response.status)]
    Unknown {
        message: String,
        response: RawResponse,
    },

    /// Transport failure other than a timeout
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not have the expected shape
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// Client configuration is unusable
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Only `GET`, `POST` and `TOKEN` are supported
    #[error("Unsupported request verb: {verb}")]
    UnsupportedVerb { verb: String },

    /// A paged endpoint kept reporting more pages past the configured bound
    #[error("Pagination stopped after {max_pages} pages at {url}")]
    PageLimitExceeded { max_pages: usize, url: String },
}

impl CrittercismError {
    /// Map a non-200 response onto its taxonomy variant
    ///
    /// Returns `None` for status 200.
    pub fn from_status(response: RawResponse) -> Option<Self> {
        let error = match response.status {
            200 => return None,
            400 => Self::MalformedRequest {
                message: MALFORMED_REQUEST_MESSAGE.to_string(),
                response,
            },
            401 => Self::Authentication {
                message: AUTHENTICATION_MESSAGE.to_string(),
                response,
            },
            429 => Self::RateLimitExceeded {
                message: RATE_LIMIT_MESSAGE.to_string(),
                response,
            },
            500 => Self::ServerError {
                message: SERVER_ERROR_MESSAGE.to_string(),
                response,
            },
            _ => Self::Unknown {
                message: UNKNOWN_ERROR_MESSAGE.to_string(),
                response,
            },
        };
        Some(error)
    }

    /// Create an invalid response error
    pub fn invalid_response<T: ToString>(message: T) -> Self {
        Self::InvalidResponse {
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// The response attached to an API error, if any
    pub fn raw_response(&self) -> Option<&RawResponse> {
        match self {
            Self::MalformedRequest { response, .. }
            | Self::Authentication { response, .. }
            | Self::RateLimitExceeded { response, .. }
            | Self::ServerError { response, .. }
            | Self::Unknown { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Whether this error belongs to the API taxonomy (timeouts and status codes)
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::MalformedRequest { .. }
                | Self::Authentication { .. }
                | Self::RateLimitExceeded { .. }
                | Self::ServerError { .. }
                | Self::Unknown { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> RawResponse {
        RawResponse {
            status,
            url: "https://developers.crittercism.com/v1.0/apps".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn status_ok_is_not_an_error() {
        assert!(CrittercismError::from_status(response(200)).is_none());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            CrittercismError::from_status(response(400)),
            Some(CrittercismError::MalformedRequest { .. })
        ));
        assert!(matches!(
            CrittercismError::from_status(response(401)),
            Some(CrittercismError::Authentication { .. })
        ));
        assert!(matches!(
            CrittercismError::from_status(response(429)),
            Some(CrittercismError::RateLimitExceeded { .. })
        ));
        assert!(matches!(
            CrittercismError::from_status(response(500)),
            Some(CrittercismError::ServerError { .. })
        ));
        assert!(matches!(
            CrittercismError::from_status(response(404)),
            Some(CrittercismError::Unknown { .. })
        ));
        assert!(matches!(
            CrittercismError::from_status(response(204)),
            Some(CrittercismError::Unknown { .. })
        ));
    }

    #[test]
    fn messages_and_response_are_attached() {
        let error = CrittercismError::from_status(response(429)).unwrap();
        assert_eq!(
            error.to_string(),
            "You have exceeded your rate limit. Please decrease your request frequency."
        );
        assert_eq!(error.raw_response().unwrap().status, 429);
        assert!(error.is_api_error());

        let error = CrittercismError::from_status(response(503)).unwrap();
        assert_eq!(
            error.to_string(),
            "Unknown error on Crittercism API. (status 503)"
        );
    }

    #[test]
    fn ambient_errors_are_not_api_errors() {
        let error = CrittercismError::config("missing password");
        assert!(!error.is_api_error());
        assert!(error.raw_response().is_none());

        let error = CrittercismError::Timeout {
            url: "https://example.com".to_string(),
        };
        assert!(error.is_api_error());
        assert!(error.raw_response().is_none());
    }
}
