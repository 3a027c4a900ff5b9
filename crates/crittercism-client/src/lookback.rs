// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Lookback windows and the clock they are measured against

use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{CrittercismError, CrittercismResult};

/// Timestamp format the API expects for range filters
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

/// Source of "now" for lookback computations
pub trait Clock: Send + Sync + Debug {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Format a UTC instant the way the API expects
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Start of a window ending at `now`, formatted for the API
pub fn lookback_start(now: DateTime<Utc>, lookback: Duration) -> CrittercismResult<String> {
    let delta = TimeDelta::from_std(lookback).map_err(|e| {
        CrittercismError::config(format!("lookback of {lookback:?} is out of range: {e}"))
    })?;
    let start = now
        .checked_sub_signed(delta)
        .ok_or_else(|| CrittercismError::config(format!("lookback of {lookback:?} underflows")))?;
    Ok(format_timestamp(start))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn lookback_sixty_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 15).unwrap();
        let start = lookback_start(now, Duration::from_secs(60 * 60)).unwrap();
        assert_eq!(start, "2024-03-05T09:30:15+00:00");
    }

    #[test]
    fn lookback_crosses_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap();
        let start = lookback_start(now, Duration::from_secs(20 * 60)).unwrap();
        assert_eq!(start, "2023-12-31T23:50:00+00:00");
    }

    #[test]
    fn sub_second_precision_is_dropped() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 15).unwrap()
            + TimeDelta::milliseconds(999);
        assert_eq!(format_timestamp(now), "2024-03-05T10:30:15+00:00");
    }

    #[test]
    fn fixed_clock_is_stable() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 15).unwrap();
        let clock = FixedClock(now);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now(), now);
    }

    #[test]
    fn huge_lookback_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 15).unwrap();
        assert!(lookback_start(now, Duration::from_secs(u64::MAX)).is_err());
    }
}
