//! HTTP client utilities.

use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;

use crate::sources::SourceError;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new HTTP client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        Self::build(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            timeout,
        )
    }

    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(user_agent: &str) -> Result<Self, SourceError> {
        Self::build(user_agent, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    fn build(user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }
}
