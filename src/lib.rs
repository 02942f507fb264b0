//! ngxmon - nginx status metrics collector
//!
//! Polls a set of nginx status endpoints concurrently, parses the
//! status page format advertised by each response's content type, and
//! emits labeled counter measurements to an accumulator.
//!
//! # Architecture
//!
//! - **Collector**: the fetch-dispatch-parse pipeline; one concurrent
//!   probe per configured endpoint, per-endpoint errors captured
//!   without failing the cycle
//! - **Accumulator**: the downstream sink for measurements and errors;
//!   channel-backed for hosts, in-memory for tests and embedders
//! - **Config**: YAML application configuration with validation
//! - **TLS**: trust material loading for https endpoints
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ngxmon::{Collector, MemoryAccumulator, NginxCollector, NginxConfig};
//!
//! # async fn run() -> Result<(), ngxmon::CollectorError> {
//! let accumulator = Arc::new(MemoryAccumulator::new());
//! let config = NginxConfig::new(["http://localhost/server_status"]);
//! let collector = NginxCollector::new(config, accumulator.clone());
//!
//! collector.collect().await?;
//! for measurement in accumulator.measurements() {
//!     println!("{measurement:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod collector;
pub mod config;
pub mod tls;

pub use accumulator::{
    Accumulator, ChannelAccumulator, ErrorRecord, FieldMap, Measurement, MemoryAccumulator,
    Record, TagMap,
};
pub use collector::nginx::{NginxCollector, NginxConfig};
pub use collector::{Collector, CollectorError};
pub use config::{AppConfig, ConfigError};
pub use tls::{TlsConfig, TlsError};
