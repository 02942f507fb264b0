//! Plain-text stub status parser.
//!
//! The stub status page is line- and position-dependent rather than
//! self-describing, so the parser consumes the exact three-data-line
//! layout in order and fails on any deviation. Label tokens are
//! skipped by position, never matched by text - the layout must stay
//! bit-for-bit compatible with the known status page format.

use std::io::BufRead;
use std::num::ParseIntError;

use thiserror::Error;

use crate::accumulator::FieldMap;

const ACTIVE_LINE: &str = "active connections";
const HEADER_LINE: &str = "server accepts handled requests";
const ACCEPTS_LINE: &str = "accepts/handled/requests";
const WORKERS_LINE: &str = "reading/writing/waiting";

/// Errors raised while parsing a stub status body.
#[derive(Debug, Error)]
pub enum StatusParseError {
    /// The body ended before a required line was complete.
    #[error("status body ended before the {0} line was complete")]
    UnexpectedEof(&'static str),

    /// A required token was absent from its line.
    #[error("missing '{field}' value on the {line} line")]
    MissingField {
        line: &'static str,
        field: &'static str,
    },

    /// A token in a numeric position failed to parse.
    #[error("invalid '{field}' value '{value}': {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// Underlying read failure.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters exposed by the stub status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StubStatus {
    pub active: u64,
    pub accepts: u64,
    pub handled: u64,
    pub requests: u64,
    pub reading: u64,
    pub writing: u64,
    pub waiting: u64,
}

impl StubStatus {
    /// Convert to the measurement field set.
    pub(crate) fn fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("active".to_string(), self.active);
        fields.insert("accepts".to_string(), self.accepts);
        fields.insert("handled".to_string(), self.handled);
        fields.insert("requests".to_string(), self.requests);
        fields.insert("reading".to_string(), self.reading);
        fields.insert("writing".to_string(), self.writing);
        fields.insert("waiting".to_string(), self.waiting);
        fields
    }
}

/// Parse a stub status body.
///
/// All-or-nothing: any truncation or non-numeric token aborts the
/// whole parse and no partial result is produced.
pub(crate) fn parse<R: BufRead>(mut reader: R) -> Result<StubStatus, StatusParseError> {
    // "Active connections:" label, up to and including the colon.
    let mut label = Vec::new();
    reader.read_until(b':', &mut label)?;
    if label.last() != Some(&b':') {
        return Err(StatusParseError::UnexpectedEof(ACTIVE_LINE));
    }

    let line = read_line(&mut reader, ACTIVE_LINE)?;
    let active = parse_u64("active", line.trim())?;

    // "server accepts handled requests" header line, discarded.
    read_line(&mut reader, HEADER_LINE)?;

    let line = read_line(&mut reader, ACCEPTS_LINE)?;
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let accepts = parse_u64("accepts", token(&tokens, 0, ACCEPTS_LINE, "accepts")?)?;
    let handled = parse_u64("handled", token(&tokens, 1, ACCEPTS_LINE, "handled")?)?;
    let requests = parse_u64("requests", token(&tokens, 2, ACCEPTS_LINE, "requests")?)?;

    let line = read_line(&mut reader, WORKERS_LINE)?;
    let tokens: Vec<&str> = line.split_whitespace().collect();
    // Tokens 0/2/4 are the "Reading:"/"Writing:"/"Waiting:" labels.
    let reading = parse_u64("reading", token(&tokens, 1, WORKERS_LINE, "reading")?)?;
    let writing = parse_u64("writing", token(&tokens, 3, WORKERS_LINE, "writing")?)?;
    let waiting = parse_u64("waiting", token(&tokens, 5, WORKERS_LINE, "waiting")?)?;

    Ok(StubStatus {
        active,
        accepts,
        handled,
        requests,
        reading,
        writing,
        waiting,
    })
}

/// Read one newline-terminated line. Reaching end-of-stream first is
/// a parse failure naming the incomplete line.
fn read_line<R: BufRead>(reader: &mut R, line: &'static str) -> Result<String, StatusParseError> {
    let mut buf = String::new();
    reader.read_line(&mut buf)?;
    if !buf.ends_with('\n') {
        return Err(StatusParseError::UnexpectedEof(line));
    }
    Ok(buf)
}

fn token<'a>(
    tokens: &[&'a str],
    index: usize,
    line: &'static str,
    field: &'static str,
) -> Result<&'a str, StatusParseError> {
    tokens
        .get(index)
        .copied()
        .ok_or(StatusParseError::MissingField { line, field })
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, StatusParseError> {
    value.parse().map_err(|source| StatusParseError::InvalidNumber {
        field,
        value: value.to_string(),
        source,
    })
}
