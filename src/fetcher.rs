//! Attachment fetching over HTTP

use crate::config::Config;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::StatusCode;

/// Abstraction over attachment retrieval, so the pipeline can run without a network
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    /// Fetch the full body of `url`
    ///
    /// # Errors
    /// Returns [`FetchError::Status`] for any status other than `200 OK` and
    /// [`FetchError::Transport`] for connection, DNS, timeout or body read failures
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Production [`AttachmentFetcher`] backed by a shared `reqwest::Client`
///
/// No retries and no authentication; redirects follow the client's default policy.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher using the timeout and User-Agent from `config`
    ///
    /// # Errors
    /// Returns [`FetchError::Client`] if the HTTP client cannot be created
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttachmentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}
