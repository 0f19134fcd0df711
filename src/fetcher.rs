//! Remote lookups against the REST API
//!
//! One call to [`Fetcher::fetch`] is one logical lookup: GET the key,
//! parse the body as JSON and unwrap a paginated envelope if present.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::pagination::unwrap_envelope;
use crate::Record;

/// Failure of a single key lookup
///
/// Cloned into every caller waiting on the key, so it only carries strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: u16 },

    #[error("Invalid JSON from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Load of {url} was cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    /// The key this failure belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::Http { url, .. }
            | Self::Decode { url, .. }
            | Self::Cancelled { url } => url,
        }
    }
}

/// Performs one lookup per key
///
/// Implementations are shared by every query in the process and must
/// tolerate arbitrary concurrent calls.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Record, FetchError>;
}

/// [`Fetcher`] backed by a pooled `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a preconfigured client (timeouts, proxies, user agent)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, key: &str) -> Result<Record, FetchError> {
        debug!(url = key, "GET");

        let transport = |e: reqwest::Error| FetchError::Transport {
            url: key.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(key).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: key.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        decode_record(key, &body)
    }
}

/// Parse a response body and unwrap it if it is a page envelope
pub fn decode_record(key: &str, body: &[u8]) -> Result<Record, FetchError> {
    let decode = |e: serde_json::Error| FetchError::Decode {
        url: key.to_string(),
        message: e.to_string(),
    };
    let value: Record = serde_json::from_slice(body).map_err(decode)?;
    unwrap_envelope(value).map_err(decode)
}
