// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-version crash occurrence aggregation
//!
//! The crash paginated table only reports totals across the versions it was
//! asked for. To get a per-version breakdown, the table is fetched once for
//! `all` versions and once per known version, and the per-version
//! `daily_occurrences` are merged back onto the all-versions summaries by hash.

use std::{collections::HashMap, time::Duration};

use crittercism_client::{
    CrashDetails, CrashTable, CrittercismClient, DAILY_OCCURRENCES_BY_VERSION,
};
use serde_json::{Map, Value};
use tracing::{Span, debug, field, info, instrument};
use uuid::Uuid;

use crate::{
    error::{EtlError, EtlResult},
    sink::EventSink,
};

/// Event type the enriched records are reported under
pub const EVENT_TYPE: &str = "apteligent_crash";

/// Version filter selecting every version of an app
pub const ALL_VERSIONS: &str = "all";

const DAILY_OCCURRENCES: &str = "daily_occurrences";
const HASH: &str = "hash";

/// Daily occurrences per crash hash, then per app version in version-list order
pub type OccurrencesByHash = HashMap<String, Map<String, Value>>;

/// Outcome of one ETL pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Correlation id of the pass
    pub run_id: Uuid,
    /// Enriched records produced
    pub records: usize,
    /// Records the sink accepted
    pub submitted: usize,
}

fn error_hash(error: &Value) -> EtlResult<&str> {
    error
        .get(HASH)
        .and_then(Value::as_str)
        .ok_or_else(|| EtlError::invalid_record(format!("error summary has no {HASH}: {error}")))
}

/// Record each error's daily occurrences under `version`
///
/// A hash already seen under other versions gains a new version key; existing
/// keys for other versions are left alone.
pub fn accumulate_version(
    occurrences: &mut OccurrencesByHash,
    version: &str,
    table: &CrashTable,
) -> EtlResult<()> {
    for error in table.errors()? {
        let hash = error_hash(error)?;
        let daily = error.get(DAILY_OCCURRENCES).cloned().ok_or_else(|| {
            EtlError::invalid_record(format!(
                "error {hash} has no {DAILY_OCCURRENCES} for version {version}"
            ))
        })?;

        occurrences
            .entry(hash.to_string())
            .or_default()
            .insert(version.to_string(), daily);
    }
    Ok(())
}

/// Attach the per-version breakdown to each all-versions summary, keeping their order
///
/// Hashes that never appeared in a per-version table get `null`.
pub fn attach_occurrences(
    summaries: &CrashTable,
    occurrences: &OccurrencesByHash,
) -> EtlResult<Vec<Value>> {
    summaries
        .errors()?
        .iter()
        .map(|summary| {
            let hash = error_hash(summary)?;
            let by_version = occurrences
                .get(hash)
                .map_or(Value::Null, |by_version| Value::Object(by_version.clone()));

            let mut summary = summary.clone();
            match &mut summary {
                Value::Object(fields) => {
                    fields.insert(DAILY_OCCURRENCES_BY_VERSION.to_string(), by_version);
                    Ok(summary)
                }
                other => Err(EtlError::invalid_record(format!(
                    "error summary is not an object: {other}"
                ))),
            }
        })
        .collect()
}

/// Crash ETL for one app
#[derive(Debug)]
pub struct CrashEtl {
    client: CrittercismClient,
    app_id: String,
    lookback: Duration,
}

impl CrashEtl {
    /// Create an ETL for `app_id` looking back `lookback` from now
    pub fn new(client: CrittercismClient, app_id: impl Into<String>, lookback: Duration) -> Self {
        Self {
            client,
            app_id: app_id.into(),
            lookback,
        }
    }

    /// The underlying API client
    pub fn client(&self) -> &CrittercismClient {
        &self.client
    }

    /// App being processed
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Crash records for the window, each with its per-version daily occurrences
    ///
    /// Versions are fetched one after another. Any failure aborts the whole pass;
    /// nothing fetched so far is returned.
    #[instrument(skip(self), fields(app_id = %self.app_id))]
    pub async fn get_errors_with_details(
        &self,
        lookback: Duration,
    ) -> EtlResult<Vec<CrashDetails>> {
        let summaries = self
            .client
            .crash_paginated_tables(&self.app_id, Some(ALL_VERSIONS), Some(lookback))
            .await?;

        let versions = self.client.app_versions(&self.app_id).await?;
        debug!(versions = versions.len(), "fetching per-version crash tables");

        let mut occurrences = OccurrencesByHash::new();
        for version in &versions {
            let table = self
                .client
                .crash_paginated_tables(&self.app_id, Some(version.as_str()), Some(lookback))
                .await?;
            accumulate_version(&mut occurrences, version, &table)?;
        }

        let crashes = attach_occurrences(&summaries, &occurrences)?
            .into_iter()
            .map(|summary| self.client.crash_details(summary))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            crashes = crashes.len(),
            versions = versions.len(),
            "built per-version crash breakdown"
        );
        Ok(crashes)
    }

    /// Run one pass over the configured window and hand the records to `sink`
    #[instrument(skip(self, sink), fields(app_id = %self.app_id, sink = sink.name(), run_id = field::Empty))]
    pub async fn run<S: EventSink>(&self, sink: &S) -> EtlResult<RunSummary> {
        let run_id = Uuid::new_v4();
        Span::current().record("run_id", run_id.to_string());

        let crashes = self.get_errors_with_details(self.lookback).await?;
        let submitted = sink.submit(EVENT_TYPE, &crashes).await?;

        info!(
            records = crashes.len(),
            submitted, "crash ETL pass complete"
        );
        Ok(RunSummary {
            run_id,
            records: crashes.len(),
            submitted,
        })
    }
}
