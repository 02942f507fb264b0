//! Non-blocking channel-backed accumulator.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use crate::accumulator::{Accumulator, ErrorRecord, FieldMap, Measurement, Record, TagMap};
use crate::collector::CollectorError;

/// Accumulator backed by a bounded MPSC channel.
///
/// Uses `try_send` - a record is dropped (and counted) when the
/// channel is full, so probe tasks never block on a slow consumer.
#[derive(Clone)]
pub struct ChannelAccumulator {
    tx: SyncSender<Record>,
    dropped: Arc<AtomicU64>,
}

impl std::fmt::Debug for ChannelAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelAccumulator")
            .field("dropped", &self.dropped.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ChannelAccumulator {
    /// Create a bounded accumulator and the receiver end the host
    /// drains.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Record>) {
        let (tx, rx) = sync_channel(capacity);
        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Total records dropped because the channel was full.
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, record: Record) {
        if self.tx.try_send(record).is_err() {
            tracing::warn!("Record channel full, dropping record");
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Accumulator for ChannelAccumulator {
    fn record_fields(&self, measurement: &str, fields: FieldMap, tags: TagMap) {
        self.push(Record::Measurement(Measurement::new(
            measurement,
            fields,
            tags,
        )));
    }

    fn record_error(&self, error: CollectorError) {
        self.push(Record::Error(ErrorRecord::new(error.to_string())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("active".to_string(), 1);
        fields
    }

    #[test]
    fn test_records_arrive_in_order_sent() {
        let (acc, rx) = ChannelAccumulator::bounded(16);

        acc.record_fields("nginx", sample_fields(), TagMap::new());
        let parse_err = url::Url::parse("://nope").unwrap_err();
        acc.record_error(CollectorError::AddressParse {
            url: "://nope".to_string(),
            source: parse_err,
        });
        drop(acc);

        let records: Vec<Record> = rx.into_iter().collect();
        assert_eq!(records.len(), 2);
        assert!(matches!(&records[0], Record::Measurement(m) if m.name == "nginx"));
        assert!(matches!(&records[1], Record::Error(e) if e.message.contains("://nope")));
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let (acc, rx) = ChannelAccumulator::bounded(1);

        acc.record_fields("nginx", sample_fields(), TagMap::new());
        acc.record_fields("nginx", sample_fields(), TagMap::new());
        acc.record_fields("nginx", sample_fields(), TagMap::new());

        assert_eq!(acc.dropped_records(), 2);
        drop(acc);
        assert_eq!(rx.into_iter().count(), 1);
    }

    #[test]
    fn test_clone_shares_drop_counter() {
        let (acc, _rx) = ChannelAccumulator::bounded(1);
        let clone = acc.clone();

        acc.record_fields("nginx", sample_fields(), TagMap::new());
        acc.record_fields("nginx", sample_fields(), TagMap::new());

        assert_eq!(clone.dropped_records(), 1);
    }

    #[test]
    fn test_concurrent_records_all_arrive() {
        let (acc, rx) = ChannelAccumulator::bounded(64);
        let acc = Arc::new(acc);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let acc = Arc::clone(&acc);
                std::thread::spawn(move || {
                    for _ in 0..4 {
                        acc.record_fields("nginx", sample_fields(), TagMap::new());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(acc.dropped_records(), 0);
        drop(acc);
        assert_eq!(rx.into_iter().count(), 32);
    }
}
