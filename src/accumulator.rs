//! Accumulator Layer
//!
//! The downstream sink collectors write into. Measurements and
//! per-endpoint errors are recorded through the [`Accumulator`] trait;
//! both calls must be safe from concurrently running probe tasks, and
//! recording an error never halts the collection cycle that produced
//! it.
//!
//! # Implementations
//!
//! - [`ChannelAccumulator`]: non-blocking writes into a bounded MPSC
//!   channel drained by the host
//! - [`MemoryAccumulator`]: mutex-guarded buffers for tests and
//!   embedders that inspect a cycle's output directly

mod channel;
mod memory;
mod types;

pub use channel::ChannelAccumulator;
pub use memory::MemoryAccumulator;
pub use types::{ErrorRecord, FieldMap, Measurement, Record, TagMap};

use crate::collector::CollectorError;

/// Sink for collected measurements and per-endpoint errors.
pub trait Accumulator: Send + Sync {
    /// Record one measurement's field set under the given tags.
    fn record_fields(&self, measurement: &str, fields: FieldMap, tags: TagMap);

    /// Record a per-endpoint failure.
    ///
    /// Capturing an error must not prevent other endpoints' results
    /// from being recorded in the same cycle.
    fn record_error(&self, error: CollectorError);
}
