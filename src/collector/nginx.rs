//! nginx status page collector.
//!
//! Polls the configured status endpoints concurrently and parses the
//! format each response advertises:
//!
//! - [`NginxCollector`]: concurrent endpoint poller and response
//!   dispatcher
//! - stub parser: the position-based three-line plain-text grammar
//! - extended decode: structural decode of the JSON status document

mod collector;
mod extended;
mod stub;

pub use collector::{NginxCollector, NginxConfig};
pub use stub::StatusParseError;
