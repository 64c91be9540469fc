//! Single-shot upstream fetches.
//!
//! `Fetch` is the seam between the aggregator and the network: production
//! code uses `HttpFetcher` (reqwest with a bounded timeout), tests drive the
//! pipeline with canned payloads and injected delays.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

use crate::error::FetchError;

#[async_trait]
pub trait Fetch: Send + Sync {
    /// Issue one GET against `url`. No retries; the caller decides what a
    /// failure means.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Production fetcher. The inner client owns a connection pool scoped to
/// this value's lifetime, so constructing one per aggregate call and
/// dropping it afterwards releases the pool on every exit path.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                "devdash-aggregator/",
                env!("CARGO_PKG_VERSION"),
                " (dashboard feed aggregator)"
            ))
            .build()
            .context("building http client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }
}
