/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use memchr::memchr;

use crate::error::MetricError;

// 2000-01-01T00:00:00Z, the collector rejects anything older
const MIN_EPOCH_TIME: i64 = 946_684_800;

/// A point in time as accepted at the add boundary, before it is
/// normalized to integer epoch seconds.
#[derive(Clone, Debug, PartialEq)]
pub enum TimeSpec {
    Epoch(i64),
    Date(DateTime<Utc>),
    Text(String),
}

impl TimeSpec {
    pub(crate) fn resolve(&self) -> Result<i64, MetricError> {
        let epoch = match self {
            TimeSpec::Epoch(v) => *v,
            TimeSpec::Date(dt) => dt.timestamp(),
            TimeSpec::Text(s) => parse_epoch_text(s)?,
        };
        if epoch < MIN_EPOCH_TIME {
            return Err(MetricError::invalid_time(format!(
                "timestamp {epoch} is before 2000-01-01"
            )));
        }
        Ok(epoch)
    }
}

fn parse_epoch_text(s: &str) -> Result<i64, MetricError> {
    if s.is_empty() {
        return Err(MetricError::invalid_time("empty time string"));
    }

    match memchr(b'.', s.as_bytes()) {
        Some(_) => {
            let f = f64::from_str(s)
                .map_err(|e| MetricError::invalid_time(format!("invalid f64 string: {e}")))?;
            Ok(f as i64)
        }
        None => i64::from_str(s)
            .map_err(|e| MetricError::invalid_time(format!("invalid i64 string: {e}"))),
    }
}

impl From<i64> for TimeSpec {
    fn from(v: i64) -> Self {
        TimeSpec::Epoch(v)
    }
}

impl From<i32> for TimeSpec {
    fn from(v: i32) -> Self {
        TimeSpec::Epoch(v as i64)
    }
}

impl From<DateTime<Utc>> for TimeSpec {
    fn from(v: DateTime<Utc>) -> Self {
        TimeSpec::Date(v)
    }
}

impl From<SystemTime> for TimeSpec {
    fn from(v: SystemTime) -> Self {
        TimeSpec::Date(v.into())
    }
}

impl From<&str> for TimeSpec {
    fn from(v: &str) -> Self {
        TimeSpec::Text(v.to_string())
    }
}

impl From<String> for TimeSpec {
    fn from(v: String) -> Self {
        TimeSpec::Text(v)
    }
}
