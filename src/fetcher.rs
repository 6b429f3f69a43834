//! Document fetching with per-URL outcome caching.
//!
//! A [`DocumentFetcher`] performs at most one HTTP GET per URL for its whole
//! lifetime. The outcome — the raw document bytes or the failure — is cached,
//! because multiple downstream steps (version detection, feature-type
//! listing, URL construction) query the same capabilities document and must
//! not re-issue network I/O. Concurrent callers for the same URL coalesce
//! into a single in-flight request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{FetchFailure, WfsError};

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("wfs-validate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Outcome of fetching one document.
///
/// Either a successful payload or a tagged failure, never both. Clone is
/// cheap (the payload is behind an `Arc`) so outcomes can live in the cache
/// and be handed to every caller.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Raw response body of a 2xx response
    Document(Arc<[u8]>),
    /// Terminal failure for this URL within this fetcher's lifetime
    Failed(FetchFailure),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Document(_))
    }

    pub fn into_result(self) -> Result<Arc<[u8]>, FetchFailure> {
        match self {
            FetchOutcome::Document(bytes) => Ok(bytes),
            FetchOutcome::Failed(failure) => Err(failure),
        }
    }
}

/// Raw response handed back by a [`Transport`]
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transport abstraction under the fetcher.
///
/// Production uses [`HttpTransport`]; tests substitute a counting mock to
/// assert how many requests actually go out.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single GET. `Err` carries a transport-level failure
    /// description (DNS, connect, timeout); HTTP status handling is the
    /// fetcher's job.
    async fn get(&self, url: &str) -> Result<TransportResponse, String>;
}

/// Transport backed by a reqwest client.
///
/// No retries: the pipeline treats a failed fetch as terminal, and the caller
/// constructs a fresh resolver or validator to try again.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &FetcherConfig) -> Result<Self, WfsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()
            .map_err(WfsError::from)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| err.to_string())?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| err.to_string())?
            .to_vec();

        Ok(TransportResponse { status, body })
    }
}

/// Fetches documents over HTTP, caching each URL's outcome.
pub struct DocumentFetcher {
    transport: Arc<dyn Transport>,
    cache: Cache<String, FetchOutcome>,
}

impl DocumentFetcher {
    /// Create a fetcher with a reqwest-backed transport.
    pub fn new(config: FetcherConfig) -> Result<Self, WfsError> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(&config)?)))
    }

    /// Create a fetcher over an arbitrary transport (used by tests).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: Cache::new(64),
        }
    }

    /// Fetch a document, hitting the network at most once per URL.
    ///
    /// Failures are cached exactly like successes: once a URL has failed, the
    /// same failure is returned for the rest of this fetcher's lifetime.
    /// Concurrent calls for the same URL share one in-flight request.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let transport = Arc::clone(&self.transport);
        let request_url = url.to_string();

        self.cache
            .get_with(url.to_string(), async move {
                match transport.get(&request_url).await {
                    Ok(response) if (200..300).contains(&response.status) => {
                        debug!(url = %request_url, bytes = response.body.len(), "document fetched");
                        FetchOutcome::Document(response.body.into())
                    }
                    Ok(response) => {
                        warn!(url = %request_url, status = response.status, "document fetch failed");
                        FetchOutcome::Failed(FetchFailure::Http {
                            status: response.status,
                        })
                    }
                    Err(details) => {
                        warn!(url = %request_url, %details, "network error during fetch");
                        FetchOutcome::Failed(FetchFailure::Network { details })
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport that counts requests and replays canned responses.
    struct CountingTransport {
        status: u16,
        body: Vec<u8>,
        fail_network: bool,
        calls: AtomicUsize,
    }

    impl CountingTransport {
        fn ok(body: &[u8]) -> Self {
            Self {
                status: 200,
                body: body.to_vec(),
                fail_network: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn status(status: u16) -> Self {
            Self {
                status,
                body: Vec::new(),
                fail_network: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn network_error() -> Self {
            Self {
                status: 0,
                body: Vec::new(),
                fail_network: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn get(&self, _url: &str) -> Result<TransportResponse, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_network {
                return Err("connection refused".to_string());
            }
            Ok(TransportResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let transport = Arc::new(CountingTransport::ok(b"<doc/>"));
        let fetcher = DocumentFetcher::with_transport(transport.clone());

        let outcome = fetcher.fetch("http://example.com/wfs").await;
        let bytes = outcome.into_result().unwrap();
        assert_eq!(&bytes[..], b"<doc/>");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_is_cached_per_url() {
        let transport = Arc::new(CountingTransport::ok(b"<doc/>"));
        let fetcher = DocumentFetcher::with_transport(transport.clone());

        fetcher.fetch("http://example.com/wfs").await;
        fetcher.fetch("http://example.com/wfs").await;
        fetcher.fetch("http://example.com/wfs").await;
        assert_eq!(transport.call_count(), 1);

        fetcher.fetch("http://example.com/other").await;
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_http_error_outcome() {
        let transport = Arc::new(CountingTransport::status(503));
        let fetcher = DocumentFetcher::with_transport(transport.clone());

        let outcome = fetcher.fetch("http://example.com/wfs").await;
        match outcome.into_result() {
            Err(FetchFailure::Http { status }) => assert_eq!(status, 503),
            other => panic!("expected Http failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let transport = Arc::new(CountingTransport::status(500));
        let fetcher = DocumentFetcher::with_transport(transport.clone());

        let first = fetcher.fetch("http://example.com/wfs").await;
        assert!(!first.is_success());

        // Cached failure; the transport is not consulted again
        let second = fetcher.fetch("http://example.com/wfs").await;
        assert!(!second.is_success());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_network_error_outcome() {
        let transport = Arc::new(CountingTransport::network_error());
        let fetcher = DocumentFetcher::with_transport(transport.clone());

        let outcome = fetcher.fetch("http://example.com/wfs").await;
        match outcome.into_result() {
            Err(FetchFailure::Network { details }) => {
                assert!(details.contains("connection refused"));
            }
            other => panic!("expected Network failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_fetches_coalesce() {
        let transport = Arc::new(CountingTransport::ok(b"<doc/>"));
        let fetcher = Arc::new(DocumentFetcher::with_transport(transport.clone()));

        let (a, b, c) = tokio::join!(
            fetcher.fetch("http://example.com/wfs"),
            fetcher.fetch("http://example.com/wfs"),
            fetcher.fetch("http://example.com/wfs"),
        );
        assert!(a.is_success() && b.is_success() && c.is_success());
        assert_eq!(transport.call_count(), 1);
    }
}
