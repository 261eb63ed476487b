//! Hacker News API client.
//!
//! Public, unauthenticated JSON over HTTP. Deleted or unknown items are
//! answered with a literal `null` body rather than a 404.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{CandidateIdSet, StoryDetail};
use super::{Upstream, UpstreamError};
use crate::config::UpstreamConfig;
use crate::metrics::{UPSTREAM_DURATION, UPSTREAM_REQUESTS};

/// Hacker News API client.
pub struct HackerNewsClient {
    client: Client,
    base_url: String,
}

impl HackerNewsClient {
    /// Create a new client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn top_ids_url(&self) -> String {
        format!("{}/v0/topstories.json", self.base_url)
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/v0/item/{}.json", self.base_url, id)
    }

    /// GET a JSON document, recording latency and outcome under `call`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        call: &str,
        url: &str,
    ) -> Result<T, UpstreamError> {
        let start = Instant::now();
        let result = self.send(url).await;
        UPSTREAM_DURATION
            .with_label_values(&[call])
            .observe(start.elapsed().as_secs_f64());

        let outcome = if result.is_ok() { "success" } else { "error" };
        UPSTREAM_REQUESTS.with_label_values(&[call, outcome]).inc();

        result
    }

    async fn send<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            UpstreamError::Parse(format!("Failed to parse response from {}: {}", url, e))
        })
    }
}

#[async_trait]
impl Upstream for HackerNewsClient {
    async fn fetch_ids(&self) -> Result<CandidateIdSet, UpstreamError> {
        let url = self.top_ids_url();
        debug!("Fetching top story ids from {}", url);

        let ids: CandidateIdSet = self.get_json("top_ids", &url).await?;
        debug!("Received {} top story ids", ids.len());
        Ok(ids)
    }

    async fn fetch_detail(&self, id: u64) -> Result<StoryDetail, UpstreamError> {
        let url = self.item_url(id);
        debug!("Fetching story detail: id={}", id);

        let detail: Option<StoryDetail> = self.get_json("item", &url).await?;
        detail.ok_or(UpstreamError::NotFound(id))
    }
}
