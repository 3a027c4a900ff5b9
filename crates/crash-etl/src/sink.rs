// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Destinations for enriched crash records
//!
//! Ingestion into the analytics backend is an external contract; the ETL only
//! hands each batch to an [`EventSink`] together with its event type.

use std::sync::Mutex;

use crittercism_client::CrashDetails;
use serde_json::Map;
use tracing::info;

use crate::{
    config::NewRelicDestination,
    error::{EtlError, EtlResult},
};

/// Receiver of enriched crash records
pub trait EventSink: Send + Sync {
    /// Submit a batch of records under `event_type`
    ///
    /// Returns the number of records accepted.
    fn submit(
        &self,
        event_type: &str,
        records: &[CrashDetails],
    ) -> impl Future<Output = EtlResult<usize>> + Send;

    /// Name of this sink, for logs
    fn name(&self) -> &'static str;
}

/// Sink that writes one structured log event per record
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    destination: Option<NewRelicDestination>,
}

impl TracingSink {
    /// Log records, tagged with the destination they are meant for
    pub fn new(destination: Option<NewRelicDestination>) -> Self {
        Self { destination }
    }
}

impl EventSink for TracingSink {
    async fn submit(&self, event_type: &str, records: &[CrashDetails]) -> EtlResult<usize> {
        let (account_id, app_id) = self
            .destination
            .as_ref()
            .map_or(("-", "-"), |d| (d.account_id.as_str(), d.app_id.as_str()));

        for record in records {
            let versions = record
                .daily_occurrences_by_version()
                .map_or(0, Map::len);
            info!(
                event_type,
                account_id,
                app_id,
                hash = record.hash().unwrap_or("unknown"),
                versions,
                "crash event"
            );
        }
        Ok(records.len())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// Sink that keeps every submitted record in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<(String, CrashDetails)>>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything submitted so far, as `(event_type, record)` pairs
    pub fn records(&self) -> EtlResult<Vec<(String, CrashDetails)>> {
        self.records
            .lock()
            .map(|records| records.clone())
            .map_err(|e| EtlError::sink(format!("collecting sink poisoned: {e}")))
    }
}

impl EventSink for CollectingSink {
    async fn submit(&self, event_type: &str, records: &[CrashDetails]) -> EtlResult<usize> {
        let mut collected = self
            .records
            .lock()
            .map_err(|e| EtlError::sink(format!("collecting sink poisoned: {e}")))?;
        collected.extend(
            records
                .iter()
                .map(|record| (event_type.to_string(), record.clone())),
        );
        Ok(records.len())
    }

    fn name(&self) -> &'static str {
        "collecting"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(hash: &str) -> CrashDetails {
        CrashDetails::from_json(json!({
            "hash": hash,
            "daily_occurrences_by_version": {"1.0": 2}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn collecting_sink_keeps_records() {
        let sink = CollectingSink::new();
        let accepted = sink
            .submit("apteligent_crash", &[record("A"), record("B")])
            .await
            .unwrap();

        assert_eq!(accepted, 2);
        let records = sink.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, "apteligent_crash");
        assert_eq!(records[1].1.hash(), Some("B"));
    }

    #[tokio::test]
    async fn tracing_sink_accepts_everything() {
        let sink = TracingSink::new(Some(NewRelicDestination {
            account_id: "1".to_string(),
            app_id: "2".to_string(),
        }));
        assert_eq!(sink.submit("apteligent_crash", &[record("A")]).await.unwrap(), 1);
        assert_eq!(sink.submit("apteligent_crash", &[]).await.unwrap(), 0);
        assert_eq!(sink.name(), "tracing");
    }
}
