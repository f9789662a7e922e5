/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::{MetricsQueue, QueueMode};
use crate::aggregator::MetricsAggregator;
use crate::error::MetricError;
use crate::payload::MetricsPayload;
use crate::types::GaugeRecord;

/// Something whose pending entries can be folded into a queue.
///
/// Merging never touches the target queue's own defaults. Entries that
/// already carry a source or tags keep them; entries that would lose
/// their origin's defaults get them backfilled at merge time, so they
/// cannot silently pick up the target's unrelated defaults later.
pub trait MergeSource {
    fn merge_into(&self, target: &mut MetricsQueue) -> Result<(), MetricError>;
}

impl MetricsQueue {
    /// Fold another queue, an aggregator or a raw payload into this
    /// queue. Merging an empty source is a no-op.
    pub fn merge<S>(&mut self, source: &S) -> Result<&mut Self, MetricError>
    where
        S: MergeSource + ?Sized,
    {
        source.merge_into(self)?;
        Ok(self)
    }
}

impl MergeSource for MetricsQueue {
    fn merge_into(&self, target: &mut MetricsQueue) -> Result<(), MetricError> {
        if self.is_empty() {
            return Ok(());
        }

        match &self.store {
            super::EntryStore::Unbound => {}
            super::EntryStore::Legacy { gauges, counters } => {
                target.store.bind(QueueMode::Legacy)?;
                for record in gauges {
                    let mut record = record.clone();
                    if let Some(source) = self.source() {
                        record.backfill_source(source);
                    }
                    target.store.push_gauge(record);
                }
                for entry in counters {
                    let mut entry = entry.clone();
                    if let Some(source) = self.source() {
                        entry.backfill_source(source);
                    }
                    target.store.push_counter(entry);
                }
            }
            super::EntryStore::Tagged { measurements } => {
                target.store.bind(QueueMode::Tagged)?;
                for measurement in measurements {
                    let mut measurement = measurement.clone();
                    if self.has_tags() {
                        measurement.backfill_tags(self.tags());
                    }
                    target.store.push_measurement(measurement);
                }
            }
        }
        Ok(())
    }
}

impl MergeSource for MetricsAggregator {
    fn merge_into(&self, target: &mut MetricsQueue) -> Result<(), MetricError> {
        if self.is_empty() {
            return Ok(());
        }

        target.store.bind(QueueMode::Legacy)?;
        for entry in self.entries() {
            target.store.push_gauge(GaugeRecord::Aggregate(entry));
        }
        Ok(())
    }
}

impl MergeSource for MetricsPayload {
    fn merge_into(&self, target: &mut MetricsQueue) -> Result<(), MetricError> {
        if self.is_empty() {
            return Ok(());
        }

        // a raw payload carries no defaults of its own, nothing to backfill
        match self {
            MetricsPayload::Legacy {
                gauges, counters, ..
            } => {
                target.store.bind(QueueMode::Legacy)?;
                for record in gauges {
                    target.store.push_gauge(record.clone());
                }
                for entry in counters {
                    target.store.push_counter(entry.clone());
                }
            }
            MetricsPayload::Tagged { measurements, .. } => {
                target.store.bind(QueueMode::Tagged)?;
                for measurement in measurements {
                    target.store.push_measurement(measurement.clone());
                }
            }
        }
        Ok(())
    }
}
