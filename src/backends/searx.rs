//! SearX metasearch adapter.
//!
//! Queries a public SearX instance's JSON API over the news category with a
//! one-week time range. Public instances rate-limit aggressively, so the
//! backend is off unless explicitly enabled, keeps only two results per
//! call, and backs off for two hours on HTTP 403 or 429.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backends::SearchBackend;
use crate::context::RunContext;
use crate::models::NewsResult;
use crate::scoring;

const ENDPOINT: &str = "https://searx.be/search";

/// Results kept from one SearX call.
const RESULT_CAP: usize = 2;

const BLOCK_BACKOFF: Duration = Duration::from_secs(120 * 60);

pub struct Searx {
    client: reqwest::Client,
    endpoint: String,
}

impl Searx {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct SearxResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    publishedDate: Option<String>,
    #[serde(default)]
    engine: String,
}

#[async_trait]
impl SearchBackend for Searx {
    fn name(&self) -> &'static str {
        "SearX"
    }

    async fn search(&self, query: &str, ctx: &RunContext) -> Vec<NewsResult> {
        if ctx.backoff.is_backing_off(self.name()).await {
            debug!(query, "SearX in backoff, skipping");
            return Vec::new();
        }
        if !ctx.budget.try_spend() {
            warn!(query, "run budget exhausted, skipping SearX");
            return Vec::new();
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("categories", "news"),
                ("time_range", "week"),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(query, error = %err, "SearX request failed");
                return Vec::new();
            }
        };

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            ctx.backoff.set(self.name(), BLOCK_BACKOFF).await;
            return Vec::new();
        }
        if !status.is_success() {
            warn!(query, status = %status, "SearX returned an error status");
            return Vec::new();
        }

        let body: SearxResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(query, error = %err, "SearX response was not valid JSON");
                return Vec::new();
            }
        };

        let results: Vec<NewsResult> = body
            .results
            .into_iter()
            .filter(|result| !result.title.is_empty() && !result.url.is_empty())
            .map(|result| NewsResult {
                description: if result.content.is_empty() {
                    result.title.clone()
                } else {
                    result.content
                },
                title: result.title,
                url: result.url,
                publishedAt: result
                    .publishedDate
                    .filter(|date| !date.is_empty())
                    .unwrap_or_else(|| Utc::now().to_rfc3339()),
                source: if result.engine.is_empty() {
                    "SearX".to_string()
                } else {
                    result.engine
                },
            })
            .collect();

        let ranked = scoring::filter_and_rank(results, query, RESULT_CAP);
        debug!(query, kept = ranked.len(), "SearX search complete");
        ranked
    }
}
