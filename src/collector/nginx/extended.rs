//! Structural decode of the JSON extended status document.
//!
//! Unlike the stub format this document is self-describing, so it is
//! decoded directly into typed structs and re-emitted as one
//! measurement per counter group. Unknown fields are ignored.

use serde::Deserialize;

use crate::accumulator::{Accumulator, FieldMap, TagMap};

/// The counter groups re-emitted from the extended status document.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ExtendedStatus {
    connections: Connections,
    requests: Requests,
    #[serde(default)]
    ssl: Option<Ssl>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Connections {
    accepted: u64,
    dropped: u64,
    active: u64,
    idle: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Requests {
    total: u64,
    current: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Ssl {
    handshakes: u64,
    handshakes_failed: u64,
    session_reuses: u64,
}

/// Decode an extended status body.
pub(crate) fn decode(body: &[u8]) -> Result<ExtendedStatus, serde_json::Error> {
    serde_json::from_slice(body)
}

impl ExtendedStatus {
    /// Emit one measurement per counter group under the given tags.
    pub(crate) fn record(&self, accumulator: &dyn Accumulator, tags: &TagMap) {
        let mut fields = FieldMap::new();
        fields.insert("accepted".to_string(), self.connections.accepted);
        fields.insert("dropped".to_string(), self.connections.dropped);
        fields.insert("active".to_string(), self.connections.active);
        fields.insert("idle".to_string(), self.connections.idle);
        accumulator.record_fields("nginx_connections", fields, tags.clone());

        let mut fields = FieldMap::new();
        fields.insert("total".to_string(), self.requests.total);
        fields.insert("current".to_string(), self.requests.current);
        accumulator.record_fields("nginx_requests", fields, tags.clone());

        if let Some(ssl) = self.ssl {
            let mut fields = FieldMap::new();
            fields.insert("handshakes".to_string(), ssl.handshakes);
            fields.insert("handshakes_failed".to_string(), ssl.handshakes_failed);
            fields.insert("session_reuses".to_string(), ssl.session_reuses);
            accumulator.record_fields("nginx_ssl", fields, tags.clone());
        }
    }
}
