// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Crash ETL for Crittercism apps
//!
//! Fetches the crash summaries of one app over a lookback window, breaks each
//! crash's daily occurrences down by app version, and hands the enriched
//! records to an [`EventSink`] under the `apteligent_crash` event type.
//!
//! # Example
//!
//! ```rust,no_run
//! use crash_etl::{CrashEtl, EtlConfig, TracingSink};
//! use crittercism_client::CrittercismClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EtlConfig::from_env()?;
//! let client = CrittercismClient::connect(config.client_config()?).await?;
//! let etl = CrashEtl::new(client, config.app_id.clone(), config.lookback());
//!
//! let summary = etl.run(&TracingSink::new(config.destination())).await?;
//! println!("{} crash records", summary.records);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod processor;
pub mod sink;

pub use config::{EtlConfig, NewRelicDestination};
pub use error::{EtlError, EtlResult};
pub use processor::{
    ALL_VERSIONS, CrashEtl, EVENT_TYPE, OccurrencesByHash, RunSummary, accumulate_version,
    attach_occurrences,
};
pub use sink::{CollectingSink, EventSink, TracingSink};
