//! Bing News Search adapter.
//!
//! Calls the v7 `news/search` endpoint with day freshness and date ordering.
//! Auth is the `Ocp-Apim-Subscription-Key` header. Calls are budget-counted;
//! an HTTP 429 puts the backend into a one-hour backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backends::{SearchBackend, PER_CALL_RESULT_CAP};
use crate::context::RunContext;
use crate::models::NewsResult;
use crate::scoring;

const ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/news/search";

/// Value the setup templates ship for `BING_SEARCH_KEY`; treated as unset.
pub(crate) const PLACEHOLDER_KEY: &str = "your-bing-search-key";

const QUOTA_BACKOFF: Duration = Duration::from_secs(60 * 60);

pub struct BingNews {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl BingNews {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            endpoint: ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BingResponse {
    #[serde(default)]
    value: Vec<BingArticle>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct BingArticle {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    datePublished: String,
    #[serde(default)]
    provider: Vec<BingProvider>,
}

#[derive(Debug, Deserialize)]
struct BingProvider {
    name: Option<String>,
}

#[async_trait]
impl SearchBackend for BingNews {
    fn name(&self) -> &'static str {
        "Bing"
    }

    async fn search(&self, query: &str, ctx: &RunContext) -> Vec<NewsResult> {
        if ctx.backoff.is_backing_off(self.name()).await {
            debug!(query, "Bing in backoff, skipping");
            return Vec::new();
        }
        if !ctx.budget.try_spend() {
            warn!(query, "run budget exhausted, skipping Bing");
            return Vec::new();
        }

        let count = (PER_CALL_RESULT_CAP * 2).to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("count", count.as_str()),
                ("freshness", "Day"),
                ("mkt", "en-US"),
                ("sortBy", "Date"),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(query, error = %err, "Bing request failed");
                return Vec::new();
            }
        };

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            ctx.backoff.set(self.name(), QUOTA_BACKOFF).await;
            return Vec::new();
        }
        if !response.status().is_success() {
            warn!(query, status = %response.status(), "Bing returned an error status");
            return Vec::new();
        }

        let body: BingResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(query, error = %err, "Bing response was not valid JSON");
                return Vec::new();
            }
        };

        let results: Vec<NewsResult> = body
            .value
            .into_iter()
            .filter(|article| !article.name.is_empty() && !article.url.is_empty())
            .map(|article| NewsResult {
                title: article.name,
                description: article.description,
                url: article.url,
                publishedAt: article.datePublished,
                source: article
                    .provider
                    .into_iter()
                    .next()
                    .and_then(|provider| provider.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect();

        let ranked = scoring::filter_and_rank(results, query, PER_CALL_RESULT_CAP);
        debug!(query, kept = ranked.len(), "Bing search complete");
        ranked
    }
}
