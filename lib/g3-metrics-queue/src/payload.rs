/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde::Serialize;

use crate::types::{GaugeRecord, MeasureEntry, Measurement, MetricTagMap};

/// Snapshot of everything pending in a queue, shaped for the wire.
///
/// The two schemas are mutually exclusive. List keys of the legacy shape
/// and the top level tags of the tagged shape are omitted entirely when
/// empty, they never serialize as empty lists or empty mappings.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricsPayload {
    Legacy {
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        measure_time: Option<i64>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        gauges: Vec<GaugeRecord>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        counters: Vec<MeasureEntry>,
    },
    Tagged {
        #[serde(skip_serializing_if = "MetricTagMap::is_empty")]
        tags: MetricTagMap,
        #[serde(skip_serializing_if = "Option::is_none")]
        time: Option<i64>,
        measurements: Vec<Measurement>,
    },
}

impl MetricsPayload {
    pub(crate) fn empty() -> Self {
        MetricsPayload::Legacy {
            source: None,
            measure_time: None,
            gauges: Vec::new(),
            counters: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MetricsPayload::Legacy {
                gauges, counters, ..
            } => gauges.len() + counters.len(),
            MetricsPayload::Tagged { measurements, .. } => measurements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
