/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::error::MetricError;
use crate::payload::MetricsPayload;
use crate::persist::Persister;
use crate::types::{
    GaugeRecord, MeasureEntry, Measurement, MetricName, MetricTagMap, MetricType, TimeSpec,
};

mod input;
pub use input::{MetricAttrs, MetricInput};

mod merge;
pub use merge::MergeSource;

const DEFAULT_PER_REQUEST: usize = 500;

fn epoch_now() -> i64 {
    Utc::now().timestamp()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum QueueMode {
    Legacy,
    Tagged,
}

/// Entry storage, bound to one wire schema once the first entry or
/// schema-specific default arrives.
pub(crate) enum EntryStore {
    Unbound,
    Legacy {
        gauges: Vec<GaugeRecord>,
        counters: Vec<MeasureEntry>,
    },
    Tagged {
        measurements: Vec<Measurement>,
    },
}

impl EntryStore {
    fn mode(&self) -> Option<QueueMode> {
        match self {
            EntryStore::Unbound => None,
            EntryStore::Legacy { .. } => Some(QueueMode::Legacy),
            EntryStore::Tagged { .. } => Some(QueueMode::Tagged),
        }
    }

    fn empty_for(mode: QueueMode) -> Self {
        match mode {
            QueueMode::Legacy => EntryStore::Legacy {
                gauges: Vec::new(),
                counters: Vec::new(),
            },
            QueueMode::Tagged => EntryStore::Tagged {
                measurements: Vec::new(),
            },
        }
    }

    pub(crate) fn bind(&mut self, mode: QueueMode) -> Result<(), MetricError> {
        match self.mode() {
            None => {
                *self = EntryStore::empty_for(mode);
                Ok(())
            }
            Some(bound) if bound == mode => Ok(()),
            Some(_) => Err(MetricError::invalid_params(
                "legacy and tagged measurements cannot share one queue",
            )),
        }
    }

    pub(crate) fn push_gauge(&mut self, record: GaugeRecord) {
        match self {
            EntryStore::Legacy { gauges, .. } => gauges.push(record),
            _ => unreachable!(),
        }
    }

    pub(crate) fn push_counter(&mut self, entry: MeasureEntry) {
        match self {
            EntryStore::Legacy { counters, .. } => counters.push(entry),
            _ => unreachable!(),
        }
    }

    pub(crate) fn push_measurement(&mut self, measurement: Measurement) {
        match self {
            EntryStore::Tagged { measurements } => measurements.push(measurement),
            _ => unreachable!(),
        }
    }

    fn len(&self) -> usize {
        match self {
            EntryStore::Unbound => 0,
            EntryStore::Legacy { gauges, counters } => gauges.len() + counters.len(),
            EntryStore::Tagged { measurements } => measurements.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self) {
        match self {
            EntryStore::Unbound => {}
            EntryStore::Legacy { gauges, counters } => {
                gauges.clear();
                counters.clear();
            }
            EntryStore::Tagged { measurements } => measurements.clear(),
        }
    }
}

enum CanonicalEntry {
    Gauge(MeasureEntry),
    Counter(MeasureEntry),
    Measurement(Measurement),
}

impl CanonicalEntry {
    fn mode(&self) -> QueueMode {
        match self {
            CanonicalEntry::Gauge(_) | CanonicalEntry::Counter(_) => QueueMode::Legacy,
            CanonicalEntry::Measurement(_) => QueueMode::Tagged,
        }
    }
}

pub struct MetricsQueueBuilder {
    source: Option<String>,
    tags: MetricTagMap,
    measure_time: Option<TimeSpec>,
    time: Option<TimeSpec>,
    prefix: Option<String>,
    per_request: usize,
    clock: fn() -> i64,
}

impl Default for MetricsQueueBuilder {
    fn default() -> Self {
        MetricsQueueBuilder {
            source: None,
            tags: MetricTagMap::default(),
            measure_time: None,
            time: None,
            prefix: None,
            per_request: DEFAULT_PER_REQUEST,
            clock: epoch_now,
        }
    }
}

impl MetricsQueueBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn tags(mut self, tags: MetricTagMap) -> Self {
        self.tags = tags;
        self
    }

    pub fn measure_time<T: Into<TimeSpec>>(mut self, time: T) -> Self {
        self.measure_time = Some(time.into());
        self
    }

    pub fn time<T: Into<TimeSpec>>(mut self, time: T) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn per_request(mut self, per_request: usize) -> Self {
        self.per_request = per_request;
        self
    }

    /// Override the epoch clock, mainly to pin times in tests.
    pub fn clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self, persister: Box<dyn Persister>) -> Result<MetricsQueue, MetricError> {
        let legacy = self.source.is_some() || self.measure_time.is_some();
        let tagged = !self.tags.is_empty() || self.time.is_some();
        if legacy && tagged {
            return Err(MetricError::invalid_params(
                "source/measure_time and tags/time defaults cannot be combined",
            ));
        }

        let measure_time = self.measure_time.map(|t| t.resolve()).transpose()?;
        let time = self.time.map(|t| t.resolve()).transpose()?;
        let prefix = match self.prefix {
            Some(p) => Some(MetricName::from_str(&p)?),
            None => None,
        };

        let store = if legacy {
            EntryStore::empty_for(QueueMode::Legacy)
        } else if tagged {
            EntryStore::empty_for(QueueMode::Tagged)
        } else {
            EntryStore::Unbound
        };

        Ok(MetricsQueue {
            source: self.source,
            measure_time,
            tags: self.tags,
            time,
            prefix,
            per_request: self.per_request,
            store,
            persister,
            last_submit_time: None,
            clock: self.clock,
        })
    }
}

/// In-memory batching queue for a metrics ingestion service.
///
/// Measurements accumulate in insertion order until `submit` flushes them
/// through the injected persister. A queue speaks exactly one of the two
/// wire schemas, decided by its defaults or its first entry.
pub struct MetricsQueue {
    source: Option<String>,
    measure_time: Option<i64>,
    tags: MetricTagMap,
    time: Option<i64>,
    prefix: Option<MetricName>,
    per_request: usize,
    pub(crate) store: EntryStore,
    persister: Box<dyn Persister>,
    last_submit_time: Option<DateTime<Utc>>,
    clock: fn() -> i64,
}

impl MetricsQueue {
    pub fn new(persister: Box<dyn Persister>) -> Self {
        MetricsQueue {
            source: None,
            measure_time: None,
            tags: MetricTagMap::default(),
            time: None,
            prefix: None,
            per_request: DEFAULT_PER_REQUEST,
            store: EntryStore::Unbound,
            persister,
            last_submit_time: None,
            clock: epoch_now,
        }
    }

    pub fn builder() -> MetricsQueueBuilder {
        MetricsQueueBuilder::new()
    }

    pub(crate) fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn tags(&self) -> &MetricTagMap {
        &self.tags
    }

    /// Replace the default tags. Binds an unbound queue to the tagged
    /// schema and fails on a queue already bound to the legacy one.
    pub fn set_tags(&mut self, tags: MetricTagMap) -> Result<&mut Self, MetricError> {
        self.store.bind(QueueMode::Tagged)?;
        self.tags = tags;
        Ok(self)
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    pub fn prefix(&self) -> Option<&MetricName> {
        self.prefix.as_ref()
    }

    /// Change the name prefix. Only affects later adds, entries already
    /// queued keep the prefix active when they were added.
    pub fn set_prefix(&mut self, prefix: Option<&str>) -> Result<&mut Self, MetricError> {
        self.prefix = match prefix {
            Some(p) => Some(MetricName::from_str(p)?),
            None => None,
        };
        Ok(self)
    }

    pub fn per_request(&self) -> usize {
        self.per_request
    }

    pub fn set_per_request(&mut self, per_request: usize) {
        self.per_request = per_request;
    }

    pub fn last_submit_time(&self) -> Option<DateTime<Utc>> {
        self.last_submit_time
    }

    pub fn gauges(&self) -> &[GaugeRecord] {
        match &self.store {
            EntryStore::Legacy { gauges, .. } => gauges,
            _ => &[],
        }
    }

    pub fn counters(&self) -> &[MeasureEntry] {
        match &self.store {
            EntryStore::Legacy { counters, .. } => counters,
            _ => &[],
        }
    }

    pub fn measurements(&self) -> &[Measurement] {
        match &self.store {
            EntryStore::Tagged { measurements } => measurements,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Queue one named observation. Returns the queue for chaining.
    pub fn add<V>(&mut self, name: &str, input: V) -> Result<&mut Self, MetricError>
    where
        V: Into<MetricInput>,
    {
        self.add_many(std::iter::once((name, input)))
    }

    /// Queue several named observations atomically: if any item fails to
    /// normalize, nothing from this call is appended.
    pub fn add_many<I, N, V>(&mut self, items: I) -> Result<&mut Self, MetricError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<MetricInput>,
    {
        let mut pending_mode = self.store.mode();
        let mut batch = Vec::new();
        for (name, input) in items {
            let entry = self.normalize(pending_mode, name.as_ref(), input.into())?;
            pending_mode = Some(entry.mode());
            batch.push(entry);
        }

        if let Some(mode) = pending_mode {
            self.store.bind(mode)?;
        }
        for entry in batch {
            match entry {
                CanonicalEntry::Gauge(e) => self.store.push_gauge(e.into()),
                CanonicalEntry::Counter(e) => self.store.push_counter(e),
                CanonicalEntry::Measurement(m) => self.store.push_measurement(m),
            }
        }
        Ok(self)
    }

    fn normalize(
        &self,
        mode: Option<QueueMode>,
        name: &str,
        input: MetricInput,
    ) -> Result<CanonicalEntry, MetricError> {
        let attrs = match input {
            MetricInput::Value(v) => MetricAttrs::new().value(v),
            MetricInput::Attrs(attrs) => attrs,
        };

        let name = match &self.prefix {
            Some(prefix) => MetricName::prefixed(prefix, name)?,
            None => MetricName::from_str(name)?,
        };
        let value = attrs
            .value
            .ok_or_else(|| MetricError::invalid_params(format!("no value given for {name}")))?;

        let wants_tagged = attrs.tags.is_some() || attrs.time.is_some();
        let wants_legacy =
            attrs.source.is_some() || attrs.period.is_some() || attrs.description.is_some();
        if wants_tagged && wants_legacy {
            return Err(MetricError::invalid_params(format!(
                "{name} mixes legacy and tagged attributes"
            )));
        }

        let entry_mode = if wants_tagged {
            QueueMode::Tagged
        } else if wants_legacy {
            QueueMode::Legacy
        } else {
            mode.unwrap_or(QueueMode::Legacy)
        };
        if let Some(bound) = mode {
            if bound != entry_mode {
                return Err(MetricError::invalid_params(format!(
                    "{name} does not match the schema this queue is bound to"
                )));
            }
        }

        match entry_mode {
            QueueMode::Legacy => {
                let measure_time = match &attrs.measure_time {
                    Some(t) => t.resolve()?,
                    None => self.measure_time.unwrap_or_else(|| (self.clock)()),
                };
                let entry = MeasureEntry {
                    name,
                    value,
                    measure_time,
                    source: attrs.source,
                    period: attrs.period,
                    description: attrs.description,
                };
                match attrs.r#type.unwrap_or(MetricType::Gauge) {
                    MetricType::Gauge => Ok(CanonicalEntry::Gauge(entry)),
                    MetricType::Counter => Ok(CanonicalEntry::Counter(entry)),
                }
            }
            QueueMode::Tagged => {
                if attrs.r#type == Some(MetricType::Counter) {
                    return Err(MetricError::invalid_params(format!(
                        "{name}: counters are not part of the tagged schema"
                    )));
                }
                let time = match attrs.time.as_ref().or(attrs.measure_time.as_ref()) {
                    Some(t) => t.resolve()?,
                    None => self.time.unwrap_or_else(|| (self.clock)()),
                };
                Ok(CanonicalEntry::Measurement(Measurement {
                    name,
                    value,
                    time,
                    tags: attrs.tags,
                }))
            }
        }
    }

    /// Snapshot of the pending payload, shaped for the wire.
    pub fn queued(&self) -> MetricsPayload {
        match &self.store {
            EntryStore::Unbound => MetricsPayload::empty(),
            EntryStore::Legacy { gauges, counters } => MetricsPayload::Legacy {
                source: self.source.clone(),
                measure_time: self.measure_time,
                gauges: gauges.clone(),
                counters: counters.clone(),
            },
            EntryStore::Tagged { measurements } => MetricsPayload::Tagged {
                tags: self.tags.clone(),
                time: self.time,
                measurements: measurements.clone(),
            },
        }
    }

    /// Flush all pending entries through the persister.
    ///
    /// Returns `false` and keeps every entry queued when delivery fails,
    /// so the caller may retry later. An empty queue submits trivially.
    pub fn submit(&mut self) -> bool {
        if self.store.is_empty() {
            return true;
        }

        let payload = self.queued();
        if self.persister.persist(&payload) {
            self.store.clear();
            self.last_submit_time = DateTime::from_timestamp((self.clock)(), 0);
            debug!("flushed {} queued metric entries", payload.len());
            true
        } else {
            warn!(
                "metrics submission failed, keeping {} entries queued",
                payload.len()
            );
            false
        }
    }

    /// Run `work` and queue its wall-clock duration in milliseconds as a
    /// gauge under `name`.
    pub fn time<T, F>(&mut self, name: &str, work: F) -> Result<T, MetricError>
    where
        F: FnOnce() -> T,
    {
        self.time_with(name, MetricAttrs::new(), work)
    }

    pub fn time_with<T, F>(
        &mut self,
        name: &str,
        attrs: MetricAttrs,
        work: F,
    ) -> Result<T, MetricError>
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let value = work();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;
        self.add(name, attrs.value(elapsed_ms))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{DiscardPersister, MemoryPersister};
    use serde_json::json;
    use std::time::Duration;

    const TEST_TIME: i64 = 1_700_000_000;

    fn test_clock() -> i64 {
        TEST_TIME
    }

    fn test_queue() -> MetricsQueue {
        MetricsQueue::builder()
            .clock(test_clock)
            .build(Box::new(DiscardPersister))
            .unwrap()
    }

    fn test_builder() -> MetricsQueueBuilder {
        MetricsQueue::builder().clock(test_clock)
    }

    fn tag_map(pairs: &[(&str, &str)]) -> MetricTagMap {
        MetricTagMap::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn queued_json(queue: &MetricsQueue) -> serde_json::Value {
        serde_json::to_value(queue.queued()).unwrap()
    }

    #[test]
    fn build_valid() {
        assert!(test_builder().build(Box::new(DiscardPersister)).is_ok());
        assert!(
            test_builder()
                .source("metrics-web-stg-1")
                .build(Box::new(DiscardPersister))
                .is_ok()
        );
        assert!(
            test_builder()
                .tags(tag_map(&[("hostname", "metrics-web-stg-1")]))
                .build(Box::new(DiscardPersister))
                .is_ok()
        );
    }

    #[test]
    fn build_mixed_schemas() {
        let r = test_builder()
            .source("metrics-web-stg-1")
            .tags(tag_map(&[("hostname", "metrics-web-stg-1")]))
            .build(Box::new(DiscardPersister));
        assert!(matches!(r, Err(MetricError::InvalidParameters(_))));

        let r = test_builder()
            .measure_time(TEST_TIME)
            .time(TEST_TIME)
            .build(Box::new(DiscardPersister));
        assert!(matches!(r, Err(MetricError::InvalidParameters(_))));
    }

    #[test]
    fn tags_accessors() {
        let queue = test_builder()
            .tags(tag_map(&[("instance_id", "i-1234567a")]))
            .build(Box::new(DiscardPersister))
            .unwrap();
        assert!(queue.has_tags());
        assert_eq!(queue.tags().get_str("instance_id"), Some("i-1234567a"));

        let mut queue = test_queue();
        assert!(!queue.has_tags());
        assert!(queue.tags().is_empty());
        queue
            .set_tags(tag_map(&[("instance_id", "i-1234567b")]))
            .unwrap();
        assert!(queue.has_tags());
        assert_eq!(queue.tags().get_str("instance_id"), Some("i-1234567b"));
    }

    #[test]
    fn set_tags_on_legacy_queue() {
        let mut queue = test_builder()
            .source("app")
            .build(Box::new(DiscardPersister))
            .unwrap();
        let r = queue.set_tags(tag_map(&[("region", "us-east-1")]));
        assert!(matches!(r, Err(MetricError::InvalidParameters(_))));
    }

    #[test]
    fn add_chains() {
        let mut queue = MetricsQueue::new(Box::new(DiscardPersister));
        queue
            .add("foo", 123)
            .unwrap()
            .add("bar", 456)
            .unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn add_bare_value_records_gauge() {
        let mut queue = test_queue();
        queue.add("foo", 3000).unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({"gauges": [{"name": "foo", "value": 3000, "measure_time": TEST_TIME}]})
        );
    }

    #[test]
    fn add_typed_entries() {
        let mut queue = test_queue();
        queue
            .add(
                "total_visits",
                MetricAttrs::new().r#type(MetricType::Counter).value(4000),
            )
            .unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({"counters": [{"name": "total_visits", "value": 4000, "measure_time": TEST_TIME}]})
        );

        let mut queue = test_queue();
        queue
            .add(
                "temperature",
                MetricAttrs::new().r#type(MetricType::Gauge).value(34),
            )
            .unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({"gauges": [{"name": "temperature", "value": 34, "measure_time": TEST_TIME}]})
        );

        // type names parse case insensitively
        let mut queue = test_queue();
        queue
            .add(
                "total_visits",
                MetricAttrs::new()
                    .r#type("Counter".parse().unwrap())
                    .value(4000),
            )
            .unwrap();
        assert_eq!(queue.counters().len(), 1);
    }

    #[test]
    fn add_extra_attributes() {
        let mut queue = test_queue();
        queue
            .add(
                "disk_use",
                MetricAttrs::new()
                    .value(35.4)
                    .period(2)
                    .description("current disk utilization")
                    .measure_time(TEST_TIME - 60)
                    .source("db2"),
            )
            .unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({"gauges": [{
                "name": "disk_use",
                "value": 35.4,
                "period": 2,
                "description": "current disk utilization",
                "measure_time": TEST_TIME - 60,
                "source": "db2"
            }]})
        );
    }

    #[test]
    fn add_missing_value() {
        let mut queue = test_queue();
        let r = queue.add("foo", MetricAttrs::new().source("db2"));
        assert!(matches!(r, Err(MetricError::InvalidParameters(_))));
        assert!(queue.is_empty());
    }

    #[test]
    fn add_mixed_schema_attrs() {
        let mut queue = test_queue();
        let r = queue.add(
            "test",
            MetricAttrs::new()
                .value(123)
                .source("metrics-web-stg-1")
                .tags(tag_map(&[("hostname", "metrics-web-stg-1")])),
        );
        assert!(matches!(r, Err(MetricError::InvalidParameters(_))));
        assert!(queue.is_empty());
    }

    #[test]
    fn prefix_applies_to_names() {
        let mut queue = test_builder()
            .prefix("foo")
            .build(Box::new(DiscardPersister))
            .unwrap();
        assert_eq!(queue.prefix().map(|p| p.as_str()), Some("foo"));
        queue.add("bar", 1).unwrap();
        queue.add("baz", MetricAttrs::new().value(23)).unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({"gauges": [
                {"name": "foo.bar", "value": 1, "measure_time": TEST_TIME},
                {"name": "foo.baz", "value": 23, "measure_time": TEST_TIME}
            ]})
        );
    }

    #[test]
    fn prefix_changes_affect_later_adds() {
        let mut queue = test_queue();
        queue.add("bar", 12).unwrap();
        queue.set_prefix(Some("foo")).unwrap();
        queue.add("bar", 23).unwrap();
        queue.add("bar", 34).unwrap();
        queue.set_prefix(None).unwrap();
        queue.add("bar", 45).unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({"gauges": [
                {"name": "bar", "value": 12, "measure_time": TEST_TIME},
                {"name": "foo.bar", "value": 23, "measure_time": TEST_TIME},
                {"name": "foo.bar", "value": 34, "measure_time": TEST_TIME},
                {"name": "bar", "value": 45, "measure_time": TEST_TIME}
            ]})
        );
    }

    #[test]
    fn add_many_keeps_order() {
        let mut queue = test_queue();
        queue
            .add_many([("foo", 123), ("bar", 345), ("baz", 567)])
            .unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({"gauges": [
                {"name": "foo", "value": 123, "measure_time": TEST_TIME},
                {"name": "bar", "value": 345, "measure_time": TEST_TIME},
                {"name": "baz", "value": 567, "measure_time": TEST_TIME}
            ]})
        );
    }

    #[test]
    fn add_many_is_atomic() {
        let mut queue = test_queue();
        let r = queue.add_many([
            ("ok", MetricInput::from(1)),
            ("bad", MetricInput::from(MetricAttrs::new())),
        ]);
        assert!(r.is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_names_are_kept() {
        let mut queue = test_queue();
        queue.add("foo", 1).unwrap().add("foo", 2).unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn measure_time_shapes() {
        let date = DateTime::from_timestamp(TEST_TIME - 5, 0).unwrap();
        let mut queue = test_queue();
        queue
            .add("foo", MetricAttrs::new().value(123).measure_time(date))
            .unwrap();
        queue
            .add(
                "foo",
                MetricAttrs::new().value(123).measure_time(TEST_TIME - 60),
            )
            .unwrap();
        queue
            .add(
                "foo",
                MetricAttrs::new()
                    .value(123)
                    .measure_time((TEST_TIME - 60).to_string()),
            )
            .unwrap();
        let gauges = queue.gauges();
        assert_eq!(gauges.len(), 3);
        match &gauges[0] {
            GaugeRecord::Measure(e) => assert_eq!(e.measure_time, TEST_TIME - 5),
            _ => unreachable!(),
        }
    }

    #[test]
    fn invalid_measure_time() {
        let mut queue = test_queue();
        let r = queue.add("foo", MetricAttrs::new().value(123).measure_time("12"));
        assert!(matches!(r, Err(MetricError::InvalidMeasureTime(_))));
        let r = queue.add(
            "foo",
            MetricAttrs::new().value(123).measure_time("not-a-time"),
        );
        assert!(matches!(r, Err(MetricError::InvalidMeasureTime(_))));
        assert!(queue.is_empty());
    }

    #[test]
    fn default_measure_time_applies() {
        let mut queue = test_builder()
            .source("foo")
            .measure_time(TEST_TIME - 1000)
            .build(Box::new(DiscardPersister))
            .unwrap();
        queue.add("foo", 12).unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({
                "source": "foo",
                "measure_time": TEST_TIME - 1000,
                "gauges": [{"name": "foo", "value": 12, "measure_time": TEST_TIME - 1000}]
            })
        );
    }

    #[test]
    fn top_level_tags_are_not_copied_to_entries() {
        let mut queue = test_builder()
            .tags(tag_map(&[("region", "us-east-1")]))
            .build(Box::new(DiscardPersister))
            .unwrap();
        queue.add("test", 1).unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({
                "tags": {"region": "us-east-1"},
                "measurements": [{"name": "test", "value": 1, "time": TEST_TIME}]
            })
        );
    }

    #[test]
    fn per_measurement_tags() {
        let mut queue = test_queue();
        queue
            .add(
                "test",
                MetricAttrs::new()
                    .value(2)
                    .tags(tag_map(&[("hostname", "metrics-web-stg-1")])),
            )
            .unwrap();
        let value = queued_json(&queue);
        assert!(value.get("tags").is_none());
        assert_eq!(
            value["measurements"][0],
            json!({
                "name": "test",
                "value": 2,
                "tags": {"hostname": "metrics-web-stg-1"},
                "time": TEST_TIME
            })
        );
    }

    #[test]
    fn per_measurement_tags_with_defaults() {
        let mut queue = test_builder()
            .tags(tag_map(&[("region", "us-east-1")]))
            .build(Box::new(DiscardPersister))
            .unwrap();
        queue
            .add(
                "test",
                MetricAttrs::new()
                    .value(3)
                    .tags(tag_map(&[("hostname", "metrics-web-stg-1")])),
            )
            .unwrap();
        let value = queued_json(&queue);
        assert_eq!(value["tags"], json!({"region": "us-east-1"}));
        // per measurement tags are used as given, not merged with defaults
        assert_eq!(
            value["measurements"][0]["tags"],
            json!({"hostname": "metrics-web-stg-1"})
        );
    }

    #[test]
    fn measure_time_converts_to_time_with_tags() {
        let mut queue = test_queue();
        queue
            .add(
                "test",
                MetricAttrs::new()
                    .value(1)
                    .tags(tag_map(&[("foo", "bar")]))
                    .measure_time(TEST_TIME),
            )
            .unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({"measurements": [{
                "name": "test",
                "value": 1,
                "tags": {"foo": "bar"},
                "time": TEST_TIME
            }]})
        );
    }

    #[test]
    fn time_attr_selects_tagged_schema() {
        let mut queue = test_queue();
        queue
            .add("test", MetricAttrs::new().value(5).time(TEST_TIME - 30))
            .unwrap();
        assert_eq!(
            queued_json(&queue),
            json!({"measurements": [{"name": "test", "value": 5, "time": TEST_TIME - 30}]})
        );
    }

    #[test]
    fn default_time_applies() {
        let mut queue = test_builder()
            .tags(tag_map(&[("foo", "bar")]))
            .time(TEST_TIME - 1000)
            .build(Box::new(DiscardPersister))
            .unwrap();
        queue.add("test", 10).unwrap();
        let value = queued_json(&queue);
        assert_eq!(value["time"], json!(TEST_TIME - 1000));
        assert_eq!(value["measurements"][0]["time"], json!(TEST_TIME - 1000));
    }

    #[test]
    fn schema_conflicts_fail_fast() {
        // tagged attributes against a legacy bound queue
        let mut queue = test_builder()
            .source("app")
            .build(Box::new(DiscardPersister))
            .unwrap();
        let r = queue.add(
            "test",
            MetricAttrs::new().value(1).tags(tag_map(&[("a", "b")])),
        );
        assert!(matches!(r, Err(MetricError::InvalidParameters(_))));

        // legacy attributes against a tagged bound queue
        let mut queue = test_builder()
            .tags(tag_map(&[("a", "b")]))
            .build(Box::new(DiscardPersister))
            .unwrap();
        let r = queue.add("test", MetricAttrs::new().value(1).source("app"));
        assert!(matches!(r, Err(MetricError::InvalidParameters(_))));

        // counters do not exist in the tagged schema
        let r = queue.add(
            "test",
            MetricAttrs::new().value(1).r#type(MetricType::Counter),
        );
        assert!(matches!(r, Err(MetricError::InvalidParameters(_))));
    }

    #[test]
    fn typed_accessors() {
        let mut queue = test_queue();
        queue
            .add_many([
                (
                    "transactions",
                    MetricAttrs::new().r#type(MetricType::Counter).value(12345),
                ),
                (
                    "register_cents",
                    MetricAttrs::new().r#type(MetricType::Gauge).value(211101),
                ),
            ])
            .unwrap();
        assert_eq!(queue.counters().len(), 1);
        assert_eq!(queue.counters()[0].name.as_str(), "transactions");
        assert_eq!(queue.gauges().len(), 1);
        assert_eq!(queue.gauges()[0].name().as_str(), "register_cents");
        assert!(queue.measurements().is_empty());

        let mut queue = test_queue();
        queue
            .add(
                "test_1",
                MetricAttrs::new()
                    .value(1)
                    .tags(tag_map(&[("region", "us-east-1")])),
            )
            .unwrap();
        assert_eq!(queue.measurements().len(), 1);
        assert!(queue.gauges().is_empty());
        assert!(queue.counters().is_empty());
    }

    #[test]
    fn len_counts_both_lists() {
        let mut queue = test_queue();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        for _ in 0..2 {
            queue
                .add_many([
                    (
                        "transactions",
                        MetricAttrs::new().r#type(MetricType::Counter).value(12345),
                    ),
                    (
                        "register_cents",
                        MetricAttrs::new().r#type(MetricType::Gauge).value(211101),
                    ),
                ])
                .unwrap();
        }
        assert_eq!(queue.len(), 4);
        assert!(!queue.is_empty());
    }

    #[test]
    fn per_request_defaults_to_500() {
        let mut queue = test_queue();
        assert_eq!(queue.per_request(), 500);
        queue.set_per_request(200);
        assert_eq!(queue.per_request(), 200);
    }

    #[test]
    fn submit_success_flushes() {
        let persister = MemoryPersister::new();
        let mut queue = test_builder()
            .build(Box::new(persister.clone()))
            .unwrap();
        queue.add_many([("steps", 2042), ("distance", 1234)]).unwrap();

        assert!(queue.submit());
        assert!(queue.is_empty());
        assert!(queue.queued().is_empty());
        assert_eq!(
            persister.last_payload().unwrap(),
            json!({"gauges": [
                {"name": "steps", "value": 2042, "measure_time": TEST_TIME},
                {"name": "distance", "value": 1234, "measure_time": TEST_TIME}
            ]})
        );
    }

    #[test]
    fn submit_failure_preserves_queue() {
        let persister = MemoryPersister::new();
        let mut queue = test_builder()
            .build(Box::new(persister.clone()))
            .unwrap();
        queue.add_many([("steps", 2042), ("distance", 1234)]).unwrap();

        let before = queued_json(&queue);
        persister.set_result(false);
        assert!(!queue.submit());
        assert_eq!(queued_json(&queue), before);
        assert_eq!(queue.len(), 2);
        assert!(queue.last_submit_time().is_none());
    }

    #[test]
    fn submit_empty_short_circuits() {
        let persister = MemoryPersister::new();
        let mut queue = test_builder()
            .build(Box::new(persister.clone()))
            .unwrap();
        persister.set_result(false);
        assert!(queue.submit());
        assert!(persister.payloads().is_empty());
        assert!(queue.last_submit_time().is_none());
    }

    #[test]
    fn last_submit_time_set_on_success() {
        let mut queue = test_queue();
        assert!(queue.last_submit_time().is_none());
        queue.add("foo", 123).unwrap();
        assert!(queue.submit());
        assert_eq!(
            queue.last_submit_time(),
            DateTime::from_timestamp(TEST_TIME, 0)
        );
    }

    #[test]
    fn time_queues_elapsed_gauge() {
        let mut queue = test_queue();
        let result = queue
            .time("sleeping", || {
                std::thread::sleep(Duration::from_millis(20));
                7
            })
            .unwrap();
        assert_eq!(result, 7);

        let gauges = queue.gauges();
        assert_eq!(gauges.len(), 1);
        match &gauges[0] {
            GaugeRecord::Measure(e) => {
                assert_eq!(e.name.as_str(), "sleeping");
                assert!(e.value.as_f64() >= 19.0);
                assert!(e.value.as_f64() < 10_000.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn time_with_options() {
        let mut queue = test_queue();
        queue
            .time_with(
                "sleep_two",
                MetricAttrs::new().source("app1").period(2),
                || std::thread::sleep(Duration::from_millis(10)),
            )
            .unwrap();

        match &queue.gauges()[0] {
            GaugeRecord::Measure(e) => {
                assert_eq!(e.name.as_str(), "sleep_two");
                assert_eq!(e.source.as_deref(), Some("app1"));
                assert_eq!(e.period, Some(2));
                assert!(e.value.as_f64() >= 9.0);
            }
            _ => unreachable!(),
        }
    }
}
