//! Core collector trait and error types.

use thiserror::Error;
use url::Url;

use crate::collector::nginx::StatusParseError;
use crate::tls::TlsError;

/// Errors that can occur during collection.
///
/// Client construction failures ([`Tls`](Self::Tls),
/// [`ClientBuild`](Self::ClientBuild)) abort the whole cycle; every
/// other kind is scoped to a single endpoint and is captured on the
/// accumulator without stopping the remaining endpoints.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Endpoint address failed to parse as a URL.
    #[error("unable to parse address '{url}': {source}")]
    AddressParse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// TLS trust material could not be loaded.
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// HTTP client construction failed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Network or transport failure for one endpoint.
    #[error("error making HTTP request to {url}: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint answered with a non-success HTTP status.
    #[error("{url} returned HTTP status {status}")]
    UnexpectedStatus { url: Url, status: reqwest::StatusCode },

    /// Endpoint answered with a content type no parser handles.
    #[error("{url} returned unexpected content type '{content_type}'")]
    UnexpectedContentType { url: Url, content_type: String },

    /// Stub status body did not match the expected layout.
    #[error("malformed stub status body from {url}: {source}")]
    MalformedStatus {
        url: Url,
        #[source]
        source: StatusParseError,
    },

    /// Extended status body was not valid JSON of the expected shape.
    #[error("malformed extended status body from {url}: {source}")]
    MalformedExtendedStatus {
        url: Url,
        #[source]
        source: serde_json::Error,
    },
}

/// Core trait for metric collectors.
///
/// # Error Handling
///
/// `collect()` distinguishes per-endpoint failures from collector
/// failures: an unreachable endpoint, a bad status code, or a
/// malformed body is recorded on the accumulator and the cycle keeps
/// going. `collect()` returns `Err` only when the collector itself
/// cannot run (no usable HTTP client).
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Run one collection cycle, returning after every endpoint probe
    /// has finished.
    async fn collect(&self) -> Result<(), CollectorError>;
}
