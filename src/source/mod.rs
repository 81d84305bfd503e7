//! Retrieval side of an export: pulling the full document set of one
//! database as an opaque payload.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;

mod http;
#[cfg(test)]
pub mod mock;

pub use http::{HttpSource, HttpSourceConfig};

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch `<url>/_all_docs?include_docs=true`, giving up after `timeout`.
    async fn fetch_all_docs(&self, url: &str, timeout: Duration) -> Result<Bytes, FetchError>;
}

#[derive(Debug)]
pub enum FetchError {
    InvalidUrl(String),
    Timeout,
    Http(reqwest::Error),
    Status { status: StatusCode },
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            // the url may carry credentials
            FetchError::Http(err.without_url())
        }
    }

    /// Short machine-readable reason for reports.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::Timeout => "timeout",
            FetchError::Http(_) => "transport",
            FetchError::Status { .. } => "status",
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::InvalidUrl(url) => write!(f, "invalid source url: {url}"),
            FetchError::Timeout => write!(f, "request timed out"),
            FetchError::Http(err) => write!(f, "http error: {err}"),
            FetchError::Status { status } => write!(f, "unexpected status {status}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err),
            _ => None,
        }
    }
}
