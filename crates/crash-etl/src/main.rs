// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Crash ETL
//!
//! Runs one per-version crash breakdown pass for the configured app.

use anyhow::Result;
use crash_etl::{CrashEtl, EtlConfig, TracingSink};
use crittercism_client::CrittercismClient;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EtlConfig::from_env()?;
    info!(app_id = %config.app_id, api_domain = %config.api_domain, "starting crash ETL");

    let client = CrittercismClient::connect(config.client_config()?).await?;
    let etl = CrashEtl::new(client, config.app_id.clone(), config.lookback());
    let sink = TracingSink::new(config.destination());

    let summary = etl.run(&sink).await?;
    info!(
        run_id = %summary.run_id,
        records = summary.records,
        submitted = summary.submitted,
        "crash ETL finished"
    );

    Ok(())
}
