// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Async client for the Crittercism (Apteligent) REST API
//!
//! # Core Abstractions
//!
//! - **[`CrittercismClient`]**: one method per endpoint, all built on a single
//!   request primitive that attaches headers and tokens and maps status codes
//! - **[`CrittercismError`]**: closed error taxonomy, one variant per failure kind
//!   the API reports, each carrying the raw response
//! - **Models**: read-only wrappers around response JSON ([`App`], [`CrashDetails`],
//!   [`ExceptionDetails`], chart results) plus typed request parameters
//!
//! # Authentication
//!
//! The client holds one primary bearer token for its lifetime, obtained through
//! the OAuth password grant unless supplied up front. Transaction endpoints use
//! per-app scoped tokens, fetched lazily and cached in a [`TokenCache`].
//!
//! # Example
//!
//! ```rust,no_run
//! use crittercism_client::{ClientConfig, Credentials, CrittercismClient, PasswordGrant};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let grant = PasswordGrant::new("client-id", "user@example.com", "password")?;
//! let client = CrittercismClient::connect(ClientConfig::new(Credentials::password(grant))).await?;
//!
//! for app in client.apps(Some(&["appName", "crashPercent"])).await? {
//!     println!("{}: {:?}", app.id(), app.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod lookback;
pub mod models;
pub mod tokens;

pub use client::{API_VERSION, CrittercismClient, TOKEN_DURATION_SECONDS, Verb, is_truthy};
pub use config::{ClientConfig, DEFAULT_API_DOMAIN};
pub use credentials::{Credentials, NonEmptyString, PasswordGrant};
pub use error::{CrittercismError, CrittercismResult, RawResponse};
pub use lookback::{Clock, FixedClock, SystemClock};
pub use models::{
    APP_ATTRIBUTES, App, CrashDetails, CrashTable, DAILY_OCCURRENCES_BY_VERSION,
    ErrorMonitoringGraph, ErrorMonitoringPie, ErrorMonitoringRequest, ExceptionDetails,
    PerformanceManagementPie, PerformanceManagementRequest,
};
pub use tokens::TokenCache;
