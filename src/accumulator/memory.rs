//! In-memory buffering accumulator.

use std::sync::Mutex;

use crate::accumulator::{Accumulator, FieldMap, Measurement, TagMap};
use crate::collector::CollectorError;

/// Accumulator that buffers everything in memory.
///
/// Intended for tests and embedders that inspect a cycle's output
/// directly instead of draining a channel.
#[derive(Debug, Default)]
pub struct MemoryAccumulator {
    measurements: Mutex<Vec<Measurement>>,
    errors: Mutex<Vec<String>>,
}

impl MemoryAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded measurements, in recording order.
    pub fn measurements(&self) -> Vec<Measurement> {
        self.measurements
            .lock()
            .expect("measurement buffer poisoned")
            .clone()
    }

    /// Recorded measurements with the given name.
    pub fn measurements_named(&self, name: &str) -> Vec<Measurement> {
        self.measurements()
            .into_iter()
            .filter(|m| m.name == name)
            .collect()
    }

    /// Snapshot of recorded error messages, in recording order.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().expect("error buffer poisoned").clone()
    }
}

impl Accumulator for MemoryAccumulator {
    fn record_fields(&self, measurement: &str, fields: FieldMap, tags: TagMap) {
        self.measurements
            .lock()
            .expect("measurement buffer poisoned")
            .push(Measurement::new(measurement, fields, tags));
    }

    fn record_error(&self, error: CollectorError) {
        self.errors
            .lock()
            .expect("error buffer poisoned")
            .push(error.to_string());
    }
}
