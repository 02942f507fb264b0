//! Concurrent nginx status endpoint poller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use url::Url;

use crate::accumulator::{Accumulator, TagMap};
use crate::collector::nginx::{extended, stub};
use crate::collector::{Collector, CollectorError};
use crate::tls::TlsConfig;

/// Measurement name for stub status counters.
const STUB_MEASUREMENT: &str = "nginx";

/// Default response timeout (5 seconds).
const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum accepted response timeout (1 second). Sub-second requests
/// are treated as misconfiguration and replaced with the default.
const MIN_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

fn default_response_timeout() -> Duration {
    DEFAULT_RESPONSE_TIMEOUT
}

/// Configuration for the nginx status collector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NginxConfig {
    /// Status page URLs to poll.
    pub urls: Vec<String>,

    /// TLS trust material for https endpoints.
    #[serde(flatten)]
    pub tls: TlsConfig,

    /// Response timeout (default: 5s, floor: 1s).
    #[serde(default = "default_response_timeout", with = "humantime_serde")]
    pub response_timeout: Duration,
}

impl NginxConfig {
    /// Create a configuration polling the given URLs.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            tls: TlsConfig::default(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Set the response timeout.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set TLS settings.
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }
}

/// nginx status collector.
///
/// Fans out one fetch per configured endpoint, captures per-endpoint
/// failures on the accumulator, and waits for every fetch before the
/// cycle returns. The HTTP client is built once on first use and
/// reused for the collector's lifetime; mutating the configuration
/// afterwards never rebuilds it.
pub struct NginxCollector {
    config: NginxConfig,
    accumulator: Arc<dyn Accumulator>,
    client: OnceCell<Client>,
}

impl NginxCollector {
    /// Create a collector writing to the given accumulator.
    pub fn new(config: NginxConfig, accumulator: Arc<dyn Accumulator>) -> Self {
        Self {
            config,
            accumulator,
            client: OnceCell::new(),
        }
    }

    /// Effective request timeout after the sub-second floor.
    fn effective_timeout(requested: Duration) -> Duration {
        if requested < MIN_RESPONSE_TIMEOUT {
            DEFAULT_RESPONSE_TIMEOUT
        } else {
            requested
        }
    }

    /// Build the shared HTTP client from the TLS settings and timeout.
    fn build_client(config: &NginxConfig) -> Result<Client, CollectorError> {
        let builder = Client::builder().timeout(Self::effective_timeout(config.response_timeout));
        let builder = config.tls.apply(builder)?;
        builder.build().map_err(CollectorError::ClientBuild)
    }

    /// Get the cached client, building it on first use. The once-guard
    /// keeps overlapping cycles from building twice; a failed build
    /// leaves the cell empty so the next cycle retries.
    async fn client(&self) -> Result<&Client, CollectorError> {
        self.client
            .get_or_try_init(|| async { Self::build_client(&self.config) })
            .await
    }
}

impl std::fmt::Debug for NginxCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NginxCollector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Collector for NginxCollector {
    fn name(&self) -> &str {
        "nginx"
    }

    async fn collect(&self) -> Result<(), CollectorError> {
        // No usable client means no endpoint can be polled: fatal.
        let client = self.client().await?.clone();

        let mut probes: JoinSet<()> = JoinSet::new();
        for raw in &self.config.urls {
            let url = match Url::parse(raw) {
                Ok(url) => url,
                Err(source) => {
                    self.accumulator.record_error(CollectorError::AddressParse {
                        url: raw.clone(),
                        source,
                    });
                    continue;
                }
            };

            let client = client.clone();
            let accumulator = Arc::clone(&self.accumulator);
            probes.spawn(async move {
                if let Err(e) = probe_endpoint(&client, &url, accumulator.as_ref()).await {
                    tracing::warn!(url = %url, error = %e, "Endpoint probe failed");
                    accumulator.record_error(e);
                }
            });
        }

        // Join barrier: the cycle returns only after every probe has
        // finished, success or failure.
        while probes.join_next().await.is_some() {}
        Ok(())
    }
}

/// Fetch one endpoint and route the body to the parser matching its
/// content type.
async fn probe_endpoint(
    client: &Client,
    url: &Url,
    accumulator: &dyn Accumulator,
) -> Result<(), CollectorError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| CollectorError::Request {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CollectorError::UnexpectedStatus {
            url: url.clone(),
            status,
        });
    }

    let content_type = primary_content_type(response.headers());
    let tags = endpoint_tags(url);

    // The body buffer is dropped on every path out of this function.
    let body = response
        .bytes()
        .await
        .map_err(|source| CollectorError::Request {
            url: url.clone(),
            source,
        })?;

    match content_type.as_str() {
        "text/plain" => {
            let status = stub::parse(&body[..]).map_err(|source| CollectorError::MalformedStatus {
                url: url.clone(),
                source,
            })?;
            accumulator.record_fields(STUB_MEASUREMENT, status.fields(), tags);
            Ok(())
        }
        "application/json" => {
            let status = extended::decode(&body).map_err(|source| {
                CollectorError::MalformedExtendedStatus {
                    url: url.clone(),
                    source,
                }
            })?;
            status.record(accumulator, &tags);
            Ok(())
        }
        _ => Err(CollectorError::UnexpectedContentType {
            url: url.clone(),
            content_type,
        }),
    }
}

/// Extract the primary content-type token, ignoring any parameters
/// after `;`.
fn primary_content_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Derive the `{server, port}` tag pair for an endpoint.
///
/// The port falls back to the scheme default for http/https and to an
/// empty string for anything else.
fn endpoint_tags(url: &Url) -> TagMap {
    let server = url.host_str().unwrap_or_default().to_string();
    let port = match url.port() {
        Some(port) => port.to_string(),
        None => match url.scheme() {
            "http" => "80".to_string(),
            "https" => "443".to_string(),
            _ => String::new(),
        },
    };

    let mut tags = TagMap::new();
    tags.insert("server".to_string(), server);
    tags.insert("port".to_string(), port);
    tags
}
