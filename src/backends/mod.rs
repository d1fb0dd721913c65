//! Search backend adapters for the news-gathering fan-out.
//!
//! Each submodule wraps one external search/news source behind the
//! [`SearchBackend`] trait. Adapters isolate everything source-specific:
//! request shape, auth, response schema, and quota semantics. They never
//! fail; any error is logged and surfaces as an empty result list.
//!
//! | Backend | Module | Kind | Gate | Budget-counted |
//! |---------|--------|------|------|----------------|
//! | NewsAPI | [`newsapi`] | JSON API | `NEWSAPI_KEY` | yes |
//! | Bing News | [`bing`] | JSON API | `BING_SEARCH_KEY` | yes |
//! | DuckDuckGo | [`duckduckgo`] | subprocess helper | always on | no |
//! | SearX | [`searx`] | JSON API | `SEARX_ENABLED` | yes |
//! | Startpage | [`startpage`] | HTML scrape | always on | no |
//! | Ecosia | [`ecosia`] | HTML scrape | always on | no |
//!
//! # Common Contract
//!
//! Before doing any work an adapter checks the backoff registry and, when
//! budget-counted, claims one call from the run budget. On a quota or block
//! signal it records a backoff entry for itself. Results missing a usable
//! url are dropped before they leave the adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::context::RunContext;
use crate::extract::ArticleExtractor;
use crate::models::NewsResult;
use crate::utils::collapse_whitespace;

pub mod bing;
pub mod duckduckgo;
pub mod ecosia;
pub mod newsapi;
pub mod searx;
pub mod startpage;

/// Browser identity sent on every scrape-style request.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Hard ceiling on one adapter HTTP call.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Results kept from one adapter call.
pub(crate) const PER_CALL_RESULT_CAP: usize = 3;

/// Anchors collected from a result page before the cap is applied.
const ANCHOR_SCAN_LIMIT: usize = 5;

static RESULT_ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Build the HTTP client shared by the adapters and the extractor.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Pull organic result links out of a search engine's HTML page.
///
/// Engine chrome is filtered by marker: links back into the engine's own
/// domain, relative and fragment links, javascript links, and anchors whose
/// text is too short to be a headline. Survivors become results with the
/// anchor text standing in for both title and description and the current
/// time as the published timestamp.
pub(crate) fn anchor_results(
    html: &str,
    engine_domain: &str,
    engine_marker: &str,
    source: &str,
) -> Vec<NewsResult> {
    let document = Html::parse_document(html);
    let mut results = Vec::new();
    for anchor in document.select(&RESULT_ANCHORS) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.is_empty()
            || href.contains(engine_domain)
            || href.starts_with('/')
            || href.starts_with('#')
            || href.starts_with("javascript:")
        {
            continue;
        }
        let title = collapse_whitespace(&anchor.text().collect::<String>());
        if title.chars().count() <= 10 || title.contains(engine_marker) {
            continue;
        }
        results.push(NewsResult {
            title: title.clone(),
            description: title,
            url: href.to_string(),
            publishedAt: Utc::now().to_rfc3339(),
            source: source.to_string(),
        });
        if results.len() >= ANCHOR_SCAN_LIMIT {
            break;
        }
    }
    results.truncate(PER_CALL_RESULT_CAP);
    results
}

/// One external search/news source.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Stable name used in logs, availability lists, and backoff entries.
    fn name(&self) -> &'static str;

    /// Run one query. Never fails; failures are logged and yield an empty
    /// list. Respects the context's backoff registry and call budget.
    async fn search(&self, query: &str, ctx: &RunContext) -> Vec<NewsResult>;
}

/// Credential and flag configuration gating the optional backends.
#[derive(Debug, Default, Clone)]
pub struct BackendCredentials {
    pub newsapi_key: Option<String>,
    pub bing_search_key: Option<String>,
    pub searx_enabled: bool,
}

/// The full adapter roster for one run.
///
/// Slots are positional because the orchestrator's merge order and fallback
/// chain are positional: NewsAPI, Bing, DuckDuckGo, and SearX fan out
/// concurrently; Startpage and Ecosia only run when DuckDuckGo comes back
/// empty. Optional slots are `None` when their credential or flag is absent.
pub struct BackendSet {
    pub newsapi: Option<Box<dyn SearchBackend>>,
    pub bing: Option<Box<dyn SearchBackend>>,
    pub duckduckgo: Box<dyn SearchBackend>,
    pub searx: Option<Box<dyn SearchBackend>>,
    pub startpage: Box<dyn SearchBackend>,
    pub ecosia: Box<dyn SearchBackend>,
}

impl BackendSet {
    /// Assemble the production roster from credentials.
    ///
    /// A Bing key still carrying the setup placeholder value counts as
    /// absent.
    pub fn new(
        client: reqwest::Client,
        extractor: Arc<ArticleExtractor>,
        credentials: &BackendCredentials,
    ) -> Self {
        let newsapi = credentials
            .newsapi_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| {
                Box::new(newsapi::NewsApi::new(client.clone(), key.to_string()))
                    as Box<dyn SearchBackend>
            });

        let bing = credentials
            .bing_search_key
            .as_deref()
            .filter(|key| !key.is_empty() && *key != bing::PLACEHOLDER_KEY)
            .map(|key| {
                Box::new(bing::BingNews::new(client.clone(), key.to_string()))
                    as Box<dyn SearchBackend>
            });

        let searx = credentials
            .searx_enabled
            .then(|| Box::new(searx::Searx::new(client.clone())) as Box<dyn SearchBackend>);

        Self {
            newsapi,
            bing,
            duckduckgo: Box::new(duckduckgo::DuckDuckGo::from_env(extractor)),
            searx,
            startpage: Box::new(startpage::Startpage::new(client.clone())),
            ecosia: Box::new(ecosia::Ecosia::new(client)),
        }
    }

    /// Enablement of every slot, for the startup status log.
    pub fn enablement(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("NewsAPI", self.newsapi.is_some()),
            ("Bing", self.bing.is_some()),
            ("DuckDuckGo", true),
            ("SearX", self.searx.is_some()),
            ("Startpage", true),
            ("Ecosia", true),
        ]
    }

    /// Names of the fan-out backends callable right now: enabled and not
    /// inside a backoff window. The free engines are implied and omitted.
    pub async fn available_names(&self, ctx: &RunContext) -> Vec<&'static str> {
        let mut names = Vec::new();
        for slot in [&self.newsapi, &self.bing, &self.searx] {
            if let Some(backend) = slot {
                if !ctx.backoff.is_backing_off(backend.name()).await {
                    names.push(backend.name());
                }
            }
        }
        names.push(self.duckduckgo.name());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(credentials: &BackendCredentials) -> BackendSet {
        let client = http_client();
        let extractor = Arc::new(ArticleExtractor::new(client.clone()));
        BackendSet::new(client, extractor, credentials)
    }

    #[test]
    fn test_roster_without_credentials_keeps_free_backends() {
        let set = set_with(&BackendCredentials::default());
        assert!(set.newsapi.is_none());
        assert!(set.bing.is_none());
        assert!(set.searx.is_none());
        let enabled: Vec<&str> = set
            .enablement()
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect();
        assert_eq!(enabled, vec!["DuckDuckGo", "Startpage", "Ecosia"]);
    }

    #[test]
    fn test_bing_placeholder_key_counts_as_absent() {
        let set = set_with(&BackendCredentials {
            bing_search_key: Some(bing::PLACEHOLDER_KEY.to_string()),
            ..Default::default()
        });
        assert!(set.bing.is_none());
    }

    #[tokio::test]
    async fn test_available_names_skips_backed_off_backends() {
        let set = set_with(&BackendCredentials {
            newsapi_key: Some("key".to_string()),
            bing_search_key: Some("key".to_string()),
            searx_enabled: true,
        });

        let ctx = RunContext::new(50);
        assert_eq!(
            set.available_names(&ctx).await,
            vec!["NewsAPI", "Bing", "SearX", "DuckDuckGo"]
        );

        ctx.backoff.set("Bing", Duration::from_secs(3600)).await;
        assert_eq!(
            set.available_names(&ctx).await,
            vec!["NewsAPI", "SearX", "DuckDuckGo"]
        );
    }
}
