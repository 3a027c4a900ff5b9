// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Client configuration
//!
//! The client never reads the environment itself; the composing application
//! resolves the API domain and credentials once and passes them in here.

use std::{sync::Arc, time::Duration};

use url::Url;

use crate::{
    credentials::Credentials,
    error::{CrittercismError, CrittercismResult},
    lookback::{Clock, SystemClock},
};

/// Default API host
pub const DEFAULT_API_DOMAIN: &str = "developers.crittercism.com";

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_PAGES: usize = 1000;

/// Configuration for [`crate::CrittercismClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host the `/v1.0/...` paths are resolved against
    pub base_url: Url,
    /// Bearer token and/or password grant
    pub credentials: Credentials,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Upper bound on pages fetched by a single paged call
    pub max_pages: usize,
    /// How long a scoped transaction token is reused; `None` keeps it for the client lifetime
    pub scoped_token_ttl: Option<Duration>,
    /// Clock used for lookback windows
    pub clock: Arc<dyn Clock>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(&format!("https://{DEFAULT_API_DOMAIN}"))
                .expect("default Crittercism URL is valid"),
            credentials: Credentials::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_pages: DEFAULT_MAX_PAGES,
            scoped_token_ttl: None,
            clock: Arc::new(SystemClock),
        }
    }
}

impl ClientConfig {
    /// Configuration for the given credentials against the default domain
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Default::default()
        }
    }

    /// Point the client at another API host, e.g. a regional deployment
    pub fn with_domain(mut self, domain: &str) -> CrittercismResult<Self> {
        self.base_url = Url::parse(&format!("https://{domain}"))
            .map_err(|e| CrittercismError::config(format!("invalid API domain {domain}: {e}")))?;
        Ok(self)
    }

    /// Point the client at a full base URL (scheme included)
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Override the clock used for lookback windows
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Check the configuration before building a client
    pub fn validate(&self) -> CrittercismResult<()> {
        self.credentials.validate()?;

        if self.base_url.cannot_be_a_base() {
            return Err(CrittercismError::config(format!(
                "base URL {} cannot carry API paths",
                self.base_url
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(CrittercismError::config("timeout must be greater than 0"));
        }
        if self.max_pages == 0 {
            return Err(CrittercismError::config("max_pages must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::PasswordGrant;

    fn credentials() -> Credentials {
        Credentials::password(PasswordGrant::new("id", "user", "pass").unwrap())
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new(credentials());
        assert_eq!(
            config.base_url.as_str(),
            "https://developers.crittercism.com/"
        );
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.max_pages, 1000);
        assert!(config.scoped_token_ttl.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn domain_override() {
        let config = ClientConfig::new(credentials())
            .with_domain("developers.eu.crittercism.com")
            .unwrap();
        assert_eq!(config.base_url.host_str(), Some("developers.eu.crittercism.com"));
    }

    #[test]
    fn validation_failures() {
        assert!(ClientConfig::default().validate().is_err());

        let config = ClientConfig {
            timeout_seconds: 0,
            ..ClientConfig::new(credentials())
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            max_pages: 0,
            ..ClientConfig::new(credentials())
        };
        assert!(config.validate().is_err());

        let config = ClientConfig::new(credentials())
            .with_base_url(Url::parse("mailto:ops@example.com").unwrap());
        assert!(config.validate().is_err());
    }
}
