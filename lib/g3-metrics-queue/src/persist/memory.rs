/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::rc::Rc;
use std::sync::Mutex;

use serde_json::Value;

use super::Persister;
use crate::payload::MetricsPayload;

struct Inner {
    payloads: Vec<Value>,
    next_result: bool,
}

/// Records delivered payloads in memory.
///
/// Clones share the same store, so a handle kept outside the queue can
/// inspect deliveries and flip the result returned to the queue.
#[derive(Clone)]
pub struct MemoryPersister {
    inner: Rc<Mutex<Inner>>,
}

impl Default for MemoryPersister {
    fn default() -> Self {
        MemoryPersister {
            inner: Rc::new(Mutex::new(Inner {
                payloads: Vec::new(),
                next_result: true,
            })),
        }
    }
}

impl MemoryPersister {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_result(&self, ok: bool) {
        self.inner.lock().unwrap().next_result = ok;
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.inner.lock().unwrap().payloads.clone()
    }

    pub fn last_payload(&self) -> Option<Value> {
        self.inner.lock().unwrap().payloads.last().cloned()
    }
}

impl Persister for MemoryPersister {
    fn persist(&mut self, payload: &MetricsPayload) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.next_result {
            inner.payloads.push(serde_json::to_value(payload).unwrap());
        }
        inner.next_result
    }
}
