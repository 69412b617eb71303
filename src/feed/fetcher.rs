use crate::feed::parser::{parse_feed, RssFeed};
use crate::util::{validate_url, Shutdown, UrlValidationError};
use futures::StreamExt;
use reqwest::header::USER_AGENT;
use std::time::Duration;
use thiserror::Error;

/// Identifier sent in the `User-Agent` header of every feed request
pub const CLIENT_USER_AGENT: &str = "gator";

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching a feed.
///
/// Each stage of a fetch has its own variant so callers can tell a typo in a
/// URL from a dead server or a page that is not a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be turned into a request
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    /// The HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// The connection broke while the body was being read
    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body is not an RSS document
    #[error("Parse error: {0}")]
    Parse(#[from] rss::Error),
    /// The caller's shutdown signal fired before the fetch finished
    #[error("Fetch cancelled")]
    Cancelled,
}

/// Fetches and parses RSS feeds over HTTP.
///
/// Cloning is cheap; the underlying `reqwest::Client` shares its connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Build a fetcher with a 30-second whole-request timeout.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(CLIENT_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Wrap an existing client. The `User-Agent` header is still set per request.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch `url` and parse it as RSS.
    ///
    /// The HTTP status code is not inspected: whatever body comes back is
    /// parsed, so an error page surfaces as [`FetchError::Parse`].
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] - Not an http(s) URL
    /// - [`FetchError::Network`] - Connection, TLS or timeout errors
    /// - [`FetchError::Body`] - Connection dropped mid-body
    /// - [`FetchError::ResponseTooLarge`] - Body exceeded 10MB
    /// - [`FetchError::Parse`] - Body is not an RSS document
    /// - [`FetchError::Cancelled`] - `shutdown` fired first, including before the call
    pub async fn fetch(&self, url: &str, shutdown: &Shutdown) -> Result<RssFeed, FetchError> {
        let url = validate_url(url)?;
        let mut shutdown = shutdown.clone();

        tokio::select! {
            biased;

            _ = shutdown.triggered() => {
                tracing::debug!(feed = %url, "Fetch cancelled");
                Err(FetchError::Cancelled)
            }

            result = self.fetch_uncancelled(url.clone()) => result,
        }
    }

    async fn fetch_uncancelled(&self, url: url::Url) -> Result<RssFeed, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(FetchError::Network)?;

        tracing::debug!(feed = %url, status = %response.status(), "Feed responded");

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
        let feed = parse_feed(&bytes)?;

        tracing::debug!(
            feed = %url,
            items = feed.channel.items.len(),
            "Parsed feed"
        );
        Ok(feed)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Body)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
