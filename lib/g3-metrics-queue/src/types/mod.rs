/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use thiserror::Error;

use crate::error::MetricError;

mod name;
pub use name::MetricName;

mod value;
pub use value::MetricValue;

mod tag;
pub use tag::{MetricTagMap, MetricTagName, MetricTagValue};

mod time;
pub use time::TimeSpec;

mod entry;
pub use entry::{AggregateEntry, GaugeRecord, MeasureEntry, Measurement};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid graphic char: {0}")]
    InvalidGraphic(char),
    #[error("not alpha numeric char")]
    NotAlphaNumeric,
    #[error("empty string")]
    Empty,
}

fn chars_allowed_in_opentsdb(s: &str) -> Result<(), ParseError> {
    for c in s.chars() {
        // Same character range as OpenTSDB
        // http://opentsdb.net/docs/build/html/user_guide/writing/index.html#metrics-and-tags
        if c.is_ascii() {
            match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '/' => {}
                _ => {
                    return if c.is_ascii_graphic() {
                        Err(ParseError::InvalidGraphic(c))
                    } else {
                        Err(ParseError::NotAlphaNumeric)
                    };
                }
            }
        } else if !c.is_alphanumeric() {
            return Err(ParseError::NotAlphaNumeric);
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
}

impl FromStr for MetricType {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("gauge") {
            Ok(MetricType::Gauge)
        } else if s.eq_ignore_ascii_case("counter") {
            Ok(MetricType::Counter)
        } else {
            Err(MetricError::invalid_params(format!(
                "unsupported metric type {s}"
            )))
        }
    }
}
