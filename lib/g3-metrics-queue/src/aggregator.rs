/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::MetricError;
use crate::types::{AggregateEntry, MetricName, MetricValue};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct AggregateKey {
    name: MetricName,
    source: Option<String>,
}

#[derive(Clone, Copy, Debug)]
struct RunningStats {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    fn of(v: f64) -> Self {
        RunningStats {
            count: 1,
            sum: v,
            min: v,
            max: v,
        }
    }

    fn record(&mut self, v: f64) {
        self.count += 1;
        self.sum += v;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }
}

/// Running count/sum/min/max per metric name, kept in insertion order,
/// for later merging into a queue.
#[derive(Clone, Debug, Default)]
pub struct MetricsAggregator {
    source: Option<String>,
    metrics: IndexMap<AggregateKey, RunningStats>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_source<S: Into<String>>(source: S) -> Self {
        MetricsAggregator {
            source: Some(source.into()),
            metrics: IndexMap::new(),
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn add<V>(&mut self, name: &str, value: V) -> Result<&mut Self, MetricError>
    where
        V: Into<MetricValue>,
    {
        self.add_inner(name, None, value.into())
    }

    /// Track `name` under a source overriding the aggregator default.
    pub fn add_with_source<V>(
        &mut self,
        name: &str,
        source: &str,
        value: V,
    ) -> Result<&mut Self, MetricError>
    where
        V: Into<MetricValue>,
    {
        self.add_inner(name, Some(source.to_string()), value.into())
    }

    fn add_inner(
        &mut self,
        name: &str,
        source: Option<String>,
        value: MetricValue,
    ) -> Result<&mut Self, MetricError> {
        let key = AggregateKey {
            name: MetricName::from_str(name)?,
            source,
        };
        let v = value.as_f64();
        self.metrics
            .entry(key)
            .and_modify(|stats| stats.record(v))
            .or_insert_with(|| RunningStats::of(v));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Finalized entries in insertion order. Entries without their own
    /// source carry the aggregator default.
    pub fn entries(&self) -> impl Iterator<Item = AggregateEntry> + '_ {
        self.metrics.iter().map(|(key, stats)| AggregateEntry {
            name: key.name.clone(),
            count: stats.count,
            sum: stats.sum,
            min: stats.min,
            max: stats.max,
            source: key.source.clone().or_else(|| self.source.clone()),
        })
    }
}
