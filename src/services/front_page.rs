use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{cause_chain, AppError, Result};
use crate::models::{Hit, RawHit};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<RawHit>,
}

pub struct FrontPageClient {
    client: Client,
    url: String,
}

impl FrontPageClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            url: config.front_page_url.clone(),
        })
    }

    /// Current front page, highest score first.
    pub async fn fetch(&self) -> Result<Vec<Hit>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::fetch(&self.url, cause_chain(e)))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch front page: HTTP {}", response.status()).into());
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::fetch(&self.url, cause_chain(e)))?;
        let hits = into_sorted_hits(body.hits);
        tracing::debug!("Fetched {} front-page hits", hits.len());
        Ok(hits)
    }
}

fn into_sorted_hits(raw: Vec<RawHit>) -> Vec<Hit> {
    let mut hits: Vec<Hit> = raw.into_iter().filter_map(RawHit::into_hit).collect();
    hits.sort_by(|a, b| b.points.cmp(&a.points));
    hits
}
