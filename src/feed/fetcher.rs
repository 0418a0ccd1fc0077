use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching a remote resource.
///
/// Every variant is terminal for the call: the fetcher makes exactly one
/// attempt and leaves fallback decisions to the caller.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed or has no host/port to probe
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// TCP reachability probe failed or timed out
    #[error("Host unreachable: {0}")]
    Unreachable(String),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Best-effort, single-attempt HTTP fetcher with a fast reachability probe.
///
/// Before issuing a request the fetcher opens a plain TCP connection to the
/// target host with a short timeout, so an unreachable build server costs
/// seconds instead of the full request timeout.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    probe_timeout: Duration,
    fetch_timeout: Duration,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, probe_timeout: Duration, fetch_timeout: Duration) -> Self {
        Self {
            client,
            probe_timeout,
            fetch_timeout,
        }
    }

    /// Fetches `url` into memory.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Unreachable`] - probe connect refused or timed out
    /// - [`FetchError::Timeout`] - headers and body together exceeded the timeout
    /// - [`FetchError::HttpStatus`] - non-2xx response, e.g. 404 for a missing changelog
    /// - [`FetchError::ResponseTooLarge`] - body exceeded 10MB
    ///
    /// A body that breaks off mid-stream is not an error: whatever arrived
    /// before the interruption is returned.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        self.probe(&parsed).await?;

        // The timeout spans headers and body so a stalled stream cannot hang the caller
        let request = async {
            let response = self.client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(FetchError::HttpStatus(response.status().as_u16()));
            }
            read_available_bytes(url, response, MAX_RESPONSE_SIZE).await
        };

        tokio::time::timeout(self.fetch_timeout, request)
            .await
            .map_err(|_| {
                tracing::debug!(url = %url, timeout = ?self.fetch_timeout, "Request timed out");
                FetchError::Timeout
            })?
    }

    /// Like [`Fetcher::fetch`], decoding the body as UTF-8 (lossily).
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let bytes = self.fetch(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn probe(&self, url: &Url) -> Result<(), FetchError> {
        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl(format!("{url} has no host")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| FetchError::InvalidUrl(format!("{url} has no port")))?;

        // IPv6 literals arrive bracketed from host_str()
        let host = host.trim_start_matches('[').trim_end_matches(']');

        match tokio::time::timeout(self.probe_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => {
                tracing::debug!(host = %host, port = port, error = %e, "Reachability probe failed");
                Err(FetchError::Unreachable(format!("{host}:{port}: {e}")))
            }
            Err(_) => {
                tracing::debug!(host = %host, port = port, "Reachability probe timed out");
                Err(FetchError::Unreachable(format!(
                    "{host}:{port}: no connection within {:?}",
                    self.probe_timeout
                )))
            }
        }
    }
}

async fn read_available_bytes(
    url: &str,
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
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(
                    url = %url,
                    received = bytes.len(),
                    error = %e,
                    "Body interrupted, keeping partial content"
                );
                break;
            }
        };
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
