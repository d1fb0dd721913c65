//! Startpage adapter.
//!
//! Scrapes the HTML results page; there is no key, no quota, and no budget
//! charge. Runs as a fallback when DuckDuckGo comes back empty. Every
//! request is preceded by a short pause, and an HTTP 429 backs the engine
//! off for half an hour.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::backends::{anchor_results, SearchBackend};
use crate::context::RunContext;
use crate::models::NewsResult;

const ENDPOINT: &str = "https://www.startpage.com/sp/search";

const PRE_REQUEST_DELAY: Duration = Duration::from_millis(1500);

const BLOCK_BACKOFF: Duration = Duration::from_secs(30 * 60);

pub struct Startpage {
    client: reqwest::Client,
    endpoint: String,
    pre_delay: Duration,
}

impl Startpage {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: ENDPOINT.to_string(),
            pre_delay: PRE_REQUEST_DELAY,
        }
    }
}

fn parse_results(html: &str) -> Vec<NewsResult> {
    anchor_results(html, "startpage.com", "Startpage", "Startpage")
}

#[async_trait]
impl SearchBackend for Startpage {
    fn name(&self) -> &'static str {
        "Startpage"
    }

    async fn search(&self, query: &str, ctx: &RunContext) -> Vec<NewsResult> {
        if ctx.backoff.is_backing_off(self.name()).await {
            debug!(query, "Startpage in backoff, skipping");
            return Vec::new();
        }

        tokio::time::sleep(self.pre_delay).await;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query),
                ("language", "english"),
                ("cat", "web"),
                ("pl", "opensearch"),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(query, error = %err, "Startpage request failed");
                return Vec::new();
            }
        };

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            ctx.backoff.set(self.name(), BLOCK_BACKOFF).await;
            return Vec::new();
        }
        if !response.status().is_success() {
            warn!(query, status = %response.status(), "Startpage returned an error status");
            return Vec::new();
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(err) => {
                warn!(query, error = %err, "Startpage body could not be read");
                return Vec::new();
            }
        };

        let results = parse_results(&html);
        debug!(query, kept = results.len(), "Startpage search complete");
        results
    }
}
