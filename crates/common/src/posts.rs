//! Upstream post fetching.
//!
//! Every call is a single `GET` with cache bypass requested. Nothing is
//! retried and nothing is cached between calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use tracing::debug;

use crate::types::Post;
use crate::CoreError;

/// Source of the post rendered on each page request.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_post(&self) -> Result<Post, CoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// `None` leaves the request without a deadline.
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

/// Fetches a post from a fixed URL over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPostSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPostSource {
    pub fn new(url: impl Into<String>, opts: &ClientOptions) -> Result<Self, CoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(ua) = &opts.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let client = builder
            .build()
            .map_err(|e| CoreError::Network(e.to_string()))?;
        Ok(Self { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PostSource for HttpPostSource {
    async fn fetch_post(&self) -> Result<Post, CoreError> {
        let resp = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;

        let status = resp.status();
        debug!(url = %self.url, status = status.as_u16(), "upstream responded");
        if !status.is_success() {
            return Err(CoreError::Status(status.as_u16()));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;
        serde_json::from_slice::<Post>(&bytes).map_err(|e| CoreError::Parse(e.to_string()))
    }
}
