/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::payload::MetricsPayload;

mod discard;
pub use discard::DiscardPersister;

mod memory;
pub use memory::MemoryPersister;

/// Delivery seam towards the remote collector.
///
/// Ordinary delivery failure is the `false` return, never a panic. The
/// caller keeps its pending entries on failure and may retry later.
pub trait Persister {
    fn persist(&mut self, payload: &MetricsPayload) -> bool;
}
