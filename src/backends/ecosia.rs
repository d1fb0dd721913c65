//! Ecosia adapter.
//!
//! Scrapes the HTML results page, same contract as Startpage: no key, no
//! budget charge, fallback-only, pre-request pause, half-hour backoff on
//! HTTP 429. Ecosia wants a same-origin referer before it serves results.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::backends::{anchor_results, SearchBackend};
use crate::context::RunContext;
use crate::models::NewsResult;

const ENDPOINT: &str = "https://www.ecosia.org/search";

const REFERER: &str = "https://www.ecosia.org/";

const PRE_REQUEST_DELAY: Duration = Duration::from_secs(2);

const BLOCK_BACKOFF: Duration = Duration::from_secs(30 * 60);

pub struct Ecosia {
    client: reqwest::Client,
    endpoint: String,
    pre_delay: Duration,
}

impl Ecosia {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: ENDPOINT.to_string(),
            pre_delay: PRE_REQUEST_DELAY,
        }
    }
}

fn parse_results(html: &str) -> Vec<NewsResult> {
    anchor_results(html, "ecosia.org", "Ecosia", "Ecosia")
}

#[async_trait]
impl SearchBackend for Ecosia {
    fn name(&self) -> &'static str {
        "Ecosia"
    }

    async fn search(&self, query: &str, ctx: &RunContext) -> Vec<NewsResult> {
        if ctx.backoff.is_backing_off(self.name()).await {
            debug!(query, "Ecosia in backoff, skipping");
            return Vec::new();
        }

        tokio::time::sleep(self.pre_delay).await;

        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));
        let response = self.client.get(&url).header("Referer", REFERER).send().await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(query, error = %err, "Ecosia request failed");
                return Vec::new();
            }
        };

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            ctx.backoff.set(self.name(), BLOCK_BACKOFF).await;
            return Vec::new();
        }
        if !response.status().is_success() {
            warn!(query, status = %response.status(), "Ecosia returned an error status");
            return Vec::new();
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(err) => {
                warn!(query, error = %err, "Ecosia body could not be read");
                return Vec::new();
            }
        };

        let results = parse_results(&html);
        debug!(query, kept = results.len(), "Ecosia search complete");
        results
    }
}
