/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use smol_str::SmolStr;

use super::{ParseError, chars_allowed_in_opentsdb};

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct MetricTagName(SmolStr);

impl MetricTagName {
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for MetricTagName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        chars_allowed_in_opentsdb(s)?;
        Ok(MetricTagName(s.into()))
    }
}

impl AsRef<str> for MetricTagName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for MetricTagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct MetricTagValue(SmolStr);

impl MetricTagValue {
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for MetricTagValue {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        chars_allowed_in_opentsdb(s)?;
        Ok(MetricTagValue(s.into()))
    }
}

impl AsRef<str> for MetricTagValue {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for MetricTagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricTagMap {
    inner: BTreeMap<MetricTagName, MetricTagValue>,
}

impl MetricTagMap {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn insert(&mut self, name: MetricTagName, value: MetricTagValue) -> Option<MetricTagValue> {
        self.inner.insert(name, value)
    }

    #[inline]
    pub fn get(&self, key: &MetricTagName) -> Option<&MetricTagValue> {
        self.inner.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        let key = MetricTagName::from_str(key).ok()?;
        self.inner.get(&key).map(|v| v.as_str())
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&MetricTagName, &MetricTagValue)> {
        self.inner.iter()
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = MetricTagMap::default();
        for (name, value) in pairs {
            let name = MetricTagName::from_str(name)?;
            let value = MetricTagValue::from_str(value)?;
            map.inner.insert(name, value);
        }
        Ok(map)
    }
}

impl Serialize for MetricTagMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}
