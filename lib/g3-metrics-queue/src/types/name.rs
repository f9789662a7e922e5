/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use smol_str::SmolStr;

use super::{ParseError, chars_allowed_in_opentsdb};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricName(SmolStr);

impl MetricName {
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Join `prefix` and `name` with the `.` delimiter.
    pub fn prefixed(prefix: &MetricName, name: &str) -> Result<Self, ParseError> {
        let mut s = String::with_capacity(prefix.0.len() + 1 + name.len());
        s.push_str(prefix.as_str());
        s.push('.');
        s.push_str(name);
        MetricName::from_str(&s)
    }
}

impl FromStr for MetricName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        chars_allowed_in_opentsdb(s)?;
        Ok(MetricName(s.into()))
    }
}

impl AsRef<str> for MetricName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MetricName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
