// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! ETL configuration
//!
//! Loaded once at startup using the config crate with hierarchical sources:
//! 1. Default values
//! 2. Optional configuration file (`crash-etl.json`)
//! 3. Environment variables with the `CR_` prefix (`CR_API_DOMAIN`, `CR_APP_ID`, ...)

use std::{collections::HashMap, path::Path, time::Duration};

use config::{Config, Environment, File};
use crittercism_client::{ClientConfig, Credentials, DEFAULT_API_DOMAIN, PasswordGrant};
use serde::Deserialize;

use crate::error::{EtlError, EtlResult};

const CONFIG_FILE: &str = "crash-etl.json";
const ENV_PREFIX: &str = "CR";

/// Where the enriched records are reported in New Relic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelicDestination {
    /// New Relic account id
    pub account_id: String,
    /// New Relic application id
    pub app_id: String,
}

/// Settings for one ETL deployment
#[derive(Clone, Deserialize)]
pub struct EtlConfig {
    /// Crittercism API host
    pub api_domain: String,
    /// OAuth client id
    pub client_id: Option<String>,
    /// Crittercism account username
    pub username: Option<String>,
    /// Crittercism account password
    pub password: Option<String>,
    /// Pre-issued bearer token
    pub token: Option<String>,
    /// App whose crashes are processed
    pub app_id: String,
    /// Lookback window in minutes
    pub lookback_minutes: u64,
    /// New Relic account receiving the events
    pub new_relic_account: Option<String>,
    /// New Relic application receiving the events
    pub new_relic_app_id: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Page bound for paged endpoints
    pub max_pages: usize,
}

impl std::fmt::Debug for EtlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtlConfig")
            .field("api_domain", &self.api_domain)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("app_id", &self.app_id)
            .field("lookback_minutes", &self.lookback_minutes)
            .field("new_relic_account", &self.new_relic_account)
            .field("new_relic_app_id", &self.new_relic_app_id)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl EtlConfig {
    /// Load from `crash-etl.json` (if present) and `CR_*` environment variables
    pub fn from_env() -> EtlResult<Self> {
        Self::load(Some(Path::new(CONFIG_FILE)), None)
    }

    /// Load from an optional file and an environment
    ///
    /// `env` replaces the process environment when given, keyed by full variable
    /// name (e.g. `CR_APP_ID`).
    pub fn load(file: Option<&Path>, env: Option<HashMap<String, String>>) -> EtlResult<Self> {
        let mut builder = Config::builder()
            .set_default("api_domain", DEFAULT_API_DOMAIN)?
            .set_default("lookback_minutes", 60)?
            .set_default("timeout_seconds", 30)?
            .set_default("max_pages", 1000)?;

        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let etl_config: Self = config.try_deserialize()?;
        etl_config.validate()?;
        Ok(etl_config)
    }

    /// Check invariants the deserializer cannot express
    pub fn validate(&self) -> EtlResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(EtlError::config("app_id cannot be empty"));
        }
        if self.lookback_minutes == 0 {
            return Err(EtlError::config("lookback_minutes must be greater than 0"));
        }
        if self.token.is_none() && self.password_grant()?.is_none() {
            return Err(EtlError::config(
                "either token or client_id, username and password are required",
            ));
        }
        Ok(())
    }

    /// Lookback window as a duration
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_minutes.saturating_mul(60))
    }

    /// New Relic destination, when both ids are configured
    pub fn destination(&self) -> Option<NewRelicDestination> {
        match (&self.new_relic_account, &self.new_relic_app_id) {
            (Some(account_id), Some(app_id)) => Some(NewRelicDestination {
                account_id: account_id.clone(),
                app_id: app_id.clone(),
            }),
            _ => None,
        }
    }

    /// Client configuration for these settings
    pub fn client_config(&self) -> EtlResult<ClientConfig> {
        let mut credentials = match self.password_grant()? {
            Some(grant) => Credentials::password(grant),
            None => Credentials::default(),
        };
        if let Some(token) = &self.token {
            credentials = credentials.with_token(token.clone());
        }

        let client_config = ClientConfig {
            timeout_seconds: self.timeout_seconds,
            max_pages: self.max_pages,
            ..ClientConfig::new(credentials)
        }
        .with_domain(&self.api_domain)?;

        Ok(client_config)
    }

    fn password_grant(&self) -> EtlResult<Option<PasswordGrant>> {
        match (&self.client_id, &self.username, &self.password) {
            (Some(client_id), Some(username), Some(password)) => Ok(Some(PasswordGrant::new(
                client_id.clone(),
                username.clone(),
                password.clone(),
            )?)),
            (None, None, None) => Ok(None),
            _ => Err(EtlError::config(
                "client_id, username and password must be configured together",
            )),
        }
    }
}
