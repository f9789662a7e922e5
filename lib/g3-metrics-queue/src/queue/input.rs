/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::types::{MetricTagMap, MetricType, MetricValue, TimeSpec};

/// Open attribute set for one `add` item.
///
/// Which keys are set decides the wire schema the item belongs to, see
/// the normalization step on the queue. The shape is resolved into a
/// canonical entry there and never kept around.
#[derive(Clone, Debug, Default)]
pub struct MetricAttrs {
    pub(crate) value: Option<MetricValue>,
    pub(crate) r#type: Option<MetricType>,
    pub(crate) source: Option<String>,
    pub(crate) tags: Option<MetricTagMap>,
    pub(crate) period: Option<u64>,
    pub(crate) description: Option<String>,
    pub(crate) measure_time: Option<TimeSpec>,
    pub(crate) time: Option<TimeSpec>,
}

impl MetricAttrs {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn value<V: Into<MetricValue>>(mut self, value: V) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn r#type(mut self, r#type: MetricType) -> Self {
        self.r#type = Some(r#type);
        self
    }

    pub fn source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn tags(mut self, tags: MetricTagMap) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn period(mut self, period: u64) -> Self {
        self.period = Some(period);
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
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
}

/// Raw input of one `add` item: a bare number or an attribute set.
#[derive(Clone, Debug)]
pub enum MetricInput {
    Value(MetricValue),
    Attrs(MetricAttrs),
}

impl From<MetricValue> for MetricInput {
    fn from(v: MetricValue) -> Self {
        MetricInput::Value(v)
    }
}

impl From<MetricAttrs> for MetricInput {
    fn from(attrs: MetricAttrs) -> Self {
        MetricInput::Attrs(attrs)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),+) => {
        $(
            impl From<$t> for MetricInput {
                fn from(v: $t) -> Self {
                    MetricInput::Value(MetricValue::from(v))
                }
            }
        )+
    };
}

impl_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
