//! HTTP client wrapper for fetching templates and fragments.

use std::io::Read;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::error::{ComposerError, Result};
use crate::session::SessionFragment;

/// User agent string identifying the composer.
const USER_AGENT: &str = concat!("fragment-composer/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// A fetched template or fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// URL the document was requested from.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers whose values are valid visible ASCII.
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8.
    pub body: String,
}

impl FetchedDocument {
    /// Session entries carried by the response headers.
    #[must_use]
    pub fn session_fragment(&self) -> SessionFragment {
        SessionFragment::from_headers(
            self.headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )
    }
}

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` configured with the given timeout and the
/// composer's user agent.
pub fn create_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Fetch a document with retry logic.
///
/// Uses exponential backoff for transient failures (network errors, 5xx
/// responses). `headers` are sent with every attempt.
///
/// # Arguments
/// * `client` - HTTP client to use
/// * `url` - URL to fetch
/// * `headers` - Extra request headers (session entries)
/// * `max_size` - Maximum accepted body size in bytes
pub fn fetch_document(
    client: &Client,
    url: &str,
    headers: &[(String, String)],
    max_size: u64,
) -> Result<FetchedDocument> {
    let mut last_error: Option<String> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // Exponential backoff: 500ms, 1000ms
            let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1));
            tracing::debug!(attempt, delay_ms = delay, url, "Retrying after delay");
            thread::sleep(Duration::from_millis(delay));
        }

        let mut request = client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        match request.send() {
            Ok(response) => {
                let status = response.status();

                // Retry on server errors (5xx)
                if status.is_server_error() {
                    tracing::warn!(
                        url,
                        status = %status,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                // Don't retry client errors (4xx) - they won't succeed
                let response = response.error_for_status()?;
                return read_document(url, response, max_size);
            }
            Err(e) => {
                // Retry on connection/timeout errors
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!(
                        url,
                        error = %e,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "Connection error, will retry"
                    );
                    last_error = Some(e.to_string());
                    continue;
                }
                // Other errors (like invalid URL) - don't retry
                return Err(ComposerError::Http(e));
            }
        }
    }

    // All retries exhausted
    Err(ComposerError::RetriesExhausted {
        attempts: MAX_RETRIES,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

fn read_document(url: &str, response: Response, max_size: u64) -> Result<FetchedDocument> {
    if let Some(length) = response.content_length() {
        check_size(url, length, max_size)?;
    }

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let bytes = read_limited(response, url, max_size)?;

    Ok(FetchedDocument {
        url: url.to_string(),
        status,
        headers,
        body: bytes_to_string(&bytes, url),
    })
}

/// Read at most `max_size` bytes, failing as soon as the body is longer.
///
/// Bodies without a `Content-Length` are only known to be too large while
/// reading, so the reader is never drained past the limit.
fn read_limited(reader: impl Read, url: &str, max_size: u64) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(max_size.saturating_add(1))
        .read_to_end(&mut bytes)?;
    check_size(url, bytes.len() as u64, max_size)?;
    Ok(bytes)
}

fn check_size(url: &str, size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(ComposerError::ResponseTooLarge {
            url: url.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Decode a response body as UTF-8, replacing invalid sequences.
///
/// Logs a warning naming `context` when the body was not valid UTF-8.
pub fn bytes_to_string(bytes: &[u8], context: &str) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) => {
            tracing::warn!(context, error = %e, "Response is not valid UTF-8, replacing invalid bytes");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}
