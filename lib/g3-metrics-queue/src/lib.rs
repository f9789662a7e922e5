/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::MetricError;

mod types;
pub use types::{
    AggregateEntry, GaugeRecord, MeasureEntry, Measurement, MetricName, MetricTagMap,
    MetricTagName, MetricTagValue, MetricType, MetricValue, ParseError, TimeSpec,
};

mod payload;
pub use payload::MetricsPayload;

mod persist;
pub use persist::{DiscardPersister, MemoryPersister, Persister};

mod aggregator;
pub use aggregator::MetricsAggregator;

mod queue;
pub use queue::{MergeSource, MetricAttrs, MetricInput, MetricsQueue, MetricsQueueBuilder};
