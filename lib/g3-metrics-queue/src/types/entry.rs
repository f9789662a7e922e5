/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde::Serialize;

use super::{MetricName, MetricTagMap, MetricValue};

/// One measurement in the legacy wire schema. Tags never appear here.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeasureEntry {
    pub name: MetricName,
    pub value: MetricValue,
    pub measure_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MeasureEntry {
    pub(crate) fn backfill_source(&mut self, source: &str) {
        if self.source.is_none() {
            self.source = Some(source.to_string());
        }
    }
}

/// One measurement in the tagged wire schema. The `tags` key is present
/// only when the entry owns tags of its own.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Measurement {
    pub name: MetricName,
    pub value: MetricValue,
    pub time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<MetricTagMap>,
}

impl Measurement {
    pub(crate) fn backfill_tags(&mut self, tags: &MetricTagMap) {
        if self.tags.is_none() {
            self.tags = Some(tags.clone());
        }
    }
}

/// Finalized running statistics for one metric name, as produced by an
/// aggregator. Carries no value/measure_time pair of its own.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateEntry {
    pub name: MetricName,
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl AggregateEntry {
    pub(crate) fn backfill_source(&mut self, source: &str) {
        if self.source.is_none() {
            self.source = Some(source.to_string());
        }
    }
}

/// Element of the legacy gauges list: plain measurements and merged-in
/// aggregates share it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GaugeRecord {
    Measure(MeasureEntry),
    Aggregate(AggregateEntry),
}

impl GaugeRecord {
    pub fn name(&self) -> &MetricName {
        match self {
            GaugeRecord::Measure(e) => &e.name,
            GaugeRecord::Aggregate(e) => &e.name,
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            GaugeRecord::Measure(e) => e.source.as_deref(),
            GaugeRecord::Aggregate(e) => e.source.as_deref(),
        }
    }

    pub(crate) fn backfill_source(&mut self, source: &str) {
        match self {
            GaugeRecord::Measure(e) => e.backfill_source(source),
            GaugeRecord::Aggregate(e) => e.backfill_source(source),
        }
    }
}

impl From<MeasureEntry> for GaugeRecord {
    fn from(e: MeasureEntry) -> Self {
        GaugeRecord::Measure(e)
    }
}

impl From<AggregateEntry> for GaugeRecord {
    fn from(e: AggregateEntry) -> Self {
        GaugeRecord::Aggregate(e)
    }
}
