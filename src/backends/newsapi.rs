//! NewsAPI adapter.
//!
//! Queries the `everything` endpoint of <https://newsapi.org> restricted to
//! a fixed roster of trusted news domains and a four-day freshness window.
//! Calls are budget-counted; an HTTP 429 puts the backend into a one-hour
//! backoff.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backends::{SearchBackend, PER_CALL_RESULT_CAP};
use crate::context::RunContext;
use crate::models::NewsResult;
use crate::scoring;

const ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// Domain allowlist sent with every query.
const TRUSTED_DOMAINS: &str = "bbc.com,reuters.com,ap.org,guardian.com,aljazeera.com,haaretz.com,timesofisrael.com,ynetnews.com";

/// Freshness window sent as the `from` parameter.
const FRESHNESS_DAYS: i64 = 4;

const QUOTA_BACKOFF: Duration = Duration::from_secs(60 * 60);

pub struct NewsApi {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl NewsApi {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            endpoint: ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct NewsApiArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    publishedAt: String,
    source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

#[async_trait]
impl SearchBackend for NewsApi {
    fn name(&self) -> &'static str {
        "NewsAPI"
    }

    async fn search(&self, query: &str, ctx: &RunContext) -> Vec<NewsResult> {
        if ctx.backoff.is_backing_off(self.name()).await {
            debug!(query, "NewsAPI in backoff, skipping");
            return Vec::new();
        }
        if !ctx.budget.try_spend() {
            warn!(query, "run budget exhausted, skipping NewsAPI");
            return Vec::new();
        }

        let from = (Utc::now() - chrono::Duration::days(FRESHNESS_DAYS))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let page_size = (PER_CALL_RESULT_CAP * 2).min(20).to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("apiKey", self.api_key.as_str()),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("from", from.as_str()),
                ("pageSize", page_size.as_str()),
                ("domains", TRUSTED_DOMAINS),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(query, error = %err, "NewsAPI request failed");
                return Vec::new();
            }
        };

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            ctx.backoff.set(self.name(), QUOTA_BACKOFF).await;
            return Vec::new();
        }
        if !response.status().is_success() {
            warn!(query, status = %response.status(), "NewsAPI returned an error status");
            return Vec::new();
        }

        let body: NewsApiResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(query, error = %err, "NewsAPI response was not valid JSON");
                return Vec::new();
            }
        };

        let results: Vec<NewsResult> = body
            .articles
            .into_iter()
            .filter(|article| !article.title.is_empty() && !article.url.is_empty())
            .map(|article| NewsResult {
                title: article.title,
                description: article.description,
                url: article.url,
                publishedAt: article.publishedAt,
                source: article
                    .source
                    .and_then(|source| source.name)
                    .unwrap_or_else(|| "NewsAPI".to_string()),
            })
            .collect();

        let ranked = scoring::filter_and_rank(results, query, PER_CALL_RESULT_CAP);
        debug!(query, kept = ranked.len(), "NewsAPI search complete");
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::http_client;
    use mockito::Server;

    fn adapter_for(server: &Server) -> NewsApi {
        NewsApi {
            client: http_client(),
            api_key: "test-key".to_string(),
            endpoint: format!("{}/v2/everything", server.url()),
        }
    }

    fn recent_timestamp() -> String {
        (Utc::now() - chrono::Duration::hours(2)).to_rfc3339()
    }

    #[tokio::test]
    async fn test_search_maps_ranks_and_drops_irrelevant_articles() {
        let mut server = Server::new_async().await;
        let body = serde_json::json!({
            "status": "ok",
            "articles": [
                {
                    "title": "Maria Walsh detained after flotilla raid",
                    "description": "Navy intercepts Gaza aid boat",
                    "url": "https://bbc.com/news/1",
                    "publishedAt": recent_timestamp(),
                    "source": {"name": "BBC News"}
                },
                {
                    "title": "Midweek weather outlook",
                    "description": "",
                    "url": "https://bbc.com/weather",
                    "publishedAt": "2020-01-01T00:00:00Z",
                    "source": {"name": "BBC News"}
                },
                {
                    "title": "Activist detained near Gaza",
                    "description": "",
                    "url": "",
                    "publishedAt": recent_timestamp(),
                    "source": null
                }
            ]
        });
        let mock = server
            .mock("GET", "/v2/everything")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let ctx = RunContext::new(50);
        let results = adapter
            .search("\"Maria Walsh\" detained released flotilla Gaza", &ctx)
            .await;

        mock.assert_async().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://bbc.com/news/1");
        assert_eq!(results[0].source, "BBC News");
        assert_eq!(ctx.budget.used(), 1);
    }

    #[tokio::test]
    async fn test_search_skips_network_while_backed_off() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/everything")
            .expect(0)
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let ctx = RunContext::new(50);
        ctx.backoff.set("NewsAPI", Duration::from_secs(3600)).await;

        let results = adapter.search("anything", &ctx).await;

        mock.assert_async().await;
        assert!(results.is_empty());
        assert_eq!(ctx.budget.used(), 0);
    }

    #[tokio::test]
    async fn test_search_skips_network_when_budget_exhausted() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/everything")
            .expect(0)
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let ctx = RunContext::new(0);
        let results = adapter.search("anything", &ctx).await;

        mock.assert_async().await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_quota_status_backs_off_and_mutes_the_next_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/everything")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let ctx = RunContext::new(50);
        assert!(adapter.search("anything", &ctx).await.is_empty());
        assert!(ctx.backoff.is_backing_off("NewsAPI").await);

        // Within the backoff window: no request, no budget spend.
        assert!(adapter.search("anything", &ctx).await.is_empty());
        mock.assert_async().await;
        assert_eq!(ctx.budget.used(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_yields_empty_results() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2/everything")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let ctx = RunContext::new(50);
        assert!(adapter.search("anything", &ctx).await.is_empty());
    }
}
