/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

use crate::types::ParseError;

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("invalid measure time: {0}")]
    InvalidMeasureTime(String),
}

impl MetricError {
    pub(crate) fn invalid_params(msg: impl Into<String>) -> Self {
        MetricError::InvalidParameters(msg.into())
    }

    pub(crate) fn invalid_time(msg: impl Into<String>) -> Self {
        MetricError::InvalidMeasureTime(msg.into())
    }
}

impl From<ParseError> for MetricError {
    fn from(e: ParseError) -> Self {
        MetricError::InvalidParameters(e.to_string())
    }
}
