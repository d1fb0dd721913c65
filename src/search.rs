//! Per-activist search orchestration.
//!
//! For one activist this module runs a small number of targeted queries
//! against the backend roster, merges whatever comes back, and shapes the
//! outcome into an [`ActivistSearchResult`].
//!
//! Each query fans out concurrently to the API-backed backends (NewsAPI,
//! Bing, SearX) together with DuckDuckGo. The scrape engines are held in
//! reserve: Startpage runs only when DuckDuckGo finds nothing, Ecosia only
//! when Startpage also finds nothing. Merged results are deduped by url in
//! arrival order (API sources first, so they win duplicate ties), filtered
//! against the relevance cutoff, then ranked by score and capped.
//!
//! The default policy stops at the first query that lands any results; the
//! later queries are fallbacks for activists the first one misses.

use std::time::Duration;

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::backends::{BackendSet, SearchBackend};
use crate::context::RunContext;
use crate::models::{Activist, ActivistSearchResult, NewsResult};
use crate::queries;
use crate::scoring;

/// Per-activist result cap.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Primary queries attempted per activist.
const DEFAULT_PRIMARY_QUERY_LIMIT: usize = 2;

const DEFAULT_INTER_QUERY_DELAY: Duration = Duration::from_secs(2);

/// Knobs for one activist's search loop.
#[derive(Debug, Clone)]
pub struct SearchPolicy {
    /// How many primary queries to attempt.
    pub primary_query_limit: usize,
    /// Final results kept per activist.
    pub max_results: usize,
    /// Pause between consecutive query attempts.
    pub inter_query_delay: Duration,
    /// Stop querying once a query lands any results.
    pub stop_after_first_hit: bool,
    /// Append the alternative query pool after the primaries.
    pub use_alternatives: bool,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            primary_query_limit: DEFAULT_PRIMARY_QUERY_LIMIT,
            max_results: DEFAULT_MAX_RESULTS,
            inter_query_delay: DEFAULT_INTER_QUERY_DELAY,
            stop_after_first_hit: true,
            use_alternatives: false,
        }
    }
}

/// Run the full search loop for one activist.
///
/// Always returns a result; an activist with no findable news comes back
/// with an empty `newsResults` and the list of queries that were attempted.
pub async fn search_for_activist(
    activist: &Activist,
    backends: &BackendSet,
    policy: &SearchPolicy,
    ctx: &RunContext,
) -> ActivistSearchResult {
    info!(name = %activist.name, nationality = %activist.nationality, "searching for activist");

    let available = backends.available_names(ctx).await;
    info!(apis = %available.join(", "), "available backends");

    let mut queries: Vec<String> = queries::primary_queries(activist)
        .into_iter()
        .take(policy.primary_query_limit)
        .collect();
    if policy.use_alternatives {
        queries.extend(queries::alternative_queries(activist));
    }

    let mut all_results: Vec<(f64, NewsResult)> = Vec::new();
    let mut attempted = 0usize;

    for query in &queries {
        if ctx.budget.is_exhausted() {
            warn!(
                used = ctx.budget.used(),
                "run budget exhausted, stopping activist search"
            );
            break;
        }

        attempted += 1;
        info!(number = attempted, query = %query, "running query");

        let (newsapi, bing, duckduckgo, searx) = futures::join!(
            run_optional(backends.newsapi.as_deref(), query, ctx),
            run_optional(backends.bing.as_deref(), query, ctx),
            backends.duckduckgo.search(query, ctx),
            run_optional(backends.searx.as_deref(), query, ctx),
        );

        let mut startpage = Vec::new();
        let mut ecosia = Vec::new();
        if duckduckgo.is_empty() {
            startpage = backends.startpage.search(query, ctx).await;
            if startpage.is_empty() {
                ecosia = backends.ecosia.search(query, ctx).await;
            }
        }

        debug!(
            newsapi = newsapi.len(),
            bing = bing.len(),
            duckduckgo = duckduckgo.len(),
            startpage = startpage.len(),
            ecosia = ecosia.len(),
            searx = searx.len(),
            "per-backend result counts"
        );

        let query_results: Vec<NewsResult> = newsapi
            .into_iter()
            .chain(bing)
            .chain(duckduckgo)
            .chain(startpage)
            .chain(ecosia)
            .chain(searx)
            .collect();
        let result_count = query_results.len();

        for result in query_results {
            let score = scoring::score(&result, query);
            debug!(
                title = %result.title,
                source = %result.source,
                score,
                url = %result.url,
                "candidate article"
            );
            all_results.push((score, result));
        }

        ctx.analytics.record(query, result_count).await;

        if result_count > 0 {
            info!(added = result_count, "query produced results");
            if policy.stop_after_first_hit {
                break;
            }
        }

        if attempted < queries.len() {
            tokio::time::sleep(policy.inter_query_delay).await;
        }
    }

    let mut ranked: Vec<(f64, NewsResult)> = all_results
        .into_iter()
        .unique_by(|(_, result)| result.url.clone())
        .filter(|(score, _)| *score > scoring::RELEVANCE_CUTOFF)
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let kept: Vec<NewsResult> = ranked
        .into_iter()
        .take(policy.max_results)
        .map(|(_, result)| result)
        .collect();

    if kept.is_empty() {
        info!(name = %activist.name, "no relevant articles found");
    } else {
        info!(name = %activist.name, count = kept.len(), "relevant articles kept");
    }

    ActivistSearchResult {
        activistId: activist.id.clone(),
        activistName: activist.name.clone(),
        nationality: activist.nationality.clone(),
        boatName: activist.boatName.clone(),
        newsResults: kept,
        searchQueries: queries.into_iter().take(attempted).collect(),
    }
}

async fn run_optional(
    backend: Option<&dyn SearchBackend>,
    query: &str,
    ctx: &RunContext,
) -> Vec<NewsResult> {
    match backend {
        Some(backend) => backend.search(query, ctx).await,
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeBackend {
        name: &'static str,
        results: Vec<NewsResult>,
        calls: Arc<AtomicU32>,
    }

    impl FakeBackend {
        fn new(name: &'static str, results: Vec<NewsResult>) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            (
                Self {
                    name,
                    results,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl SearchBackend for FakeBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &str, _ctx: &RunContext) -> Vec<NewsResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results.clone()
        }
    }

    fn result(url: &str, title: &str) -> NewsResult {
        NewsResult {
            title: title.to_string(),
            description: title.to_string(),
            url: url.to_string(),
            publishedAt: "2025-10-06T12:00:00Z".to_string(),
            source: "Test".to_string(),
        }
    }

    fn activist() -> Activist {
        Activist {
            id: "act-1".to_string(),
            name: "Maria Walsh".to_string(),
            nationality: "Irish".to_string(),
            boatName: "Hope".to_string(),
        }
    }

    fn fast_policy() -> SearchPolicy {
        SearchPolicy {
            inter_query_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    struct FakeSet {
        set: BackendSet,
        duckduckgo_calls: Arc<AtomicU32>,
        startpage_calls: Arc<AtomicU32>,
        ecosia_calls: Arc<AtomicU32>,
    }

    fn fake_set(
        newsapi_results: Vec<NewsResult>,
        duckduckgo_results: Vec<NewsResult>,
        startpage_results: Vec<NewsResult>,
        ecosia_results: Vec<NewsResult>,
    ) -> FakeSet {
        let (newsapi, _) = FakeBackend::new("NewsAPI", newsapi_results);
        let (duckduckgo, duckduckgo_calls) = FakeBackend::new("DuckDuckGo", duckduckgo_results);
        let (startpage, startpage_calls) = FakeBackend::new("Startpage", startpage_results);
        let (ecosia, ecosia_calls) = FakeBackend::new("Ecosia", ecosia_results);
        FakeSet {
            set: BackendSet {
                newsapi: Some(Box::new(newsapi)),
                bing: None,
                duckduckgo: Box::new(duckduckgo),
                searx: None,
                startpage: Box::new(startpage),
                ecosia: Box::new(ecosia),
            },
            duckduckgo_calls,
            startpage_calls,
            ecosia_calls,
        }
    }

    #[tokio::test]
    async fn test_stops_after_first_query_that_lands_results() {
        let fakes = fake_set(
            vec![],
            vec![result("https://example.com/1", "Detained activist")],
            vec![],
            vec![],
        );
        let ctx = RunContext::new(50);

        let outcome = search_for_activist(&activist(), &fakes.set, &fast_policy(), &ctx).await;

        assert_eq!(outcome.newsResults.len(), 1);
        assert_eq!(outcome.searchQueries.len(), 1);
        assert_eq!(fakes.duckduckgo_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fakes.startpage_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fakes.ecosia_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_chain_reaches_ecosia_when_others_miss() {
        let fakes = fake_set(
            vec![],
            vec![],
            vec![],
            vec![result("https://example.com/e1", "Crew released")],
        );
        let ctx = RunContext::new(50);

        let outcome = search_for_activist(&activist(), &fakes.set, &fast_policy(), &ctx).await;

        assert_eq!(outcome.newsResults.len(), 1);
        assert_eq!(outcome.newsResults[0].url, "https://example.com/e1");
        assert_eq!(fakes.startpage_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fakes.ecosia_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_backends_empty_yields_empty_result() {
        let fakes = fake_set(vec![], vec![], vec![], vec![]);
        let ctx = RunContext::new(50);

        let outcome = search_for_activist(&activist(), &fakes.set, &fast_policy(), &ctx).await;

        assert!(outcome.newsResults.is_empty());
        assert_eq!(outcome.searchQueries.len(), 2);
        assert_eq!(outcome.activistId, "act-1");
        assert_eq!(fakes.duckduckgo_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dedup_keeps_first_occurrence_and_caps_results() {
        // Same keyword profile everywhere so scores tie and arrival order holds.
        let fakes = fake_set(
            vec![result("https://example.com/1", "Crew detained offshore")],
            vec![
                result("https://example.com/1", "Crew detained offshore again"),
                result("https://example.com/2", "Crew detained in port"),
                result("https://example.com/3", "Crew detained overnight"),
                result("https://example.com/4", "Crew detained briefly"),
            ],
            vec![],
            vec![],
        );
        let ctx = RunContext::new(50);

        let outcome = search_for_activist(&activist(), &fakes.set, &fast_policy(), &ctx).await;

        assert_eq!(outcome.newsResults.len(), 3);
        assert_eq!(outcome.newsResults[0].title, "Crew detained offshore");
        assert_eq!(outcome.newsResults[1].url, "https://example.com/2");
        assert_eq!(outcome.newsResults[2].url, "https://example.com/3");
    }

    #[tokio::test]
    async fn test_low_scoring_results_are_dropped_from_output() {
        let fakes = fake_set(
            vec![],
            vec![
                result("https://example.com/hit", "Maria Walsh detained on flotilla"),
                result("https://example.com/miss", "Harbour boat tours resume"),
            ],
            vec![],
            vec![],
        );
        let ctx = RunContext::new(50);

        let outcome = search_for_activist(&activist(), &fakes.set, &fast_policy(), &ctx).await;

        assert_eq!(outcome.newsResults.len(), 1);
        assert_eq!(outcome.newsResults[0].url, "https://example.com/hit");
        // The query still counts as a hit, so the loop stops after it.
        assert_eq!(outcome.searchQueries.len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_budget_stops_before_any_query() {
        let fakes = fake_set(vec![], vec![], vec![], vec![]);
        let ctx = RunContext::new(0);

        let outcome = search_for_activist(&activist(), &fakes.set, &fast_policy(), &ctx).await;

        assert!(outcome.newsResults.is_empty());
        assert!(outcome.searchQueries.is_empty());
        assert_eq!(fakes.duckduckgo_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_alternative_queries_extend_the_attempt_list() {
        let fakes = fake_set(vec![], vec![], vec![], vec![]);
        let ctx = RunContext::new(50);
        let policy = SearchPolicy {
            use_alternatives: true,
            ..fast_policy()
        };

        let outcome = search_for_activist(&activist(), &fakes.set, &policy, &ctx).await;

        assert_eq!(outcome.searchQueries.len(), 10);
        assert_eq!(fakes.duckduckgo_calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_analytics_records_every_attempted_query() {
        let fakes = fake_set(
            vec![],
            vec![result("https://example.com/1", "Detained activist")],
            vec![],
            vec![],
        );
        let ctx = RunContext::new(50);

        search_for_activist(&activist(), &fakes.set, &fast_policy(), &ctx).await;

        let top = ctx.analytics.top_queries(5).await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].1.success_count, 1);
        assert_eq!(top[0].1.total_count, 1);
    }
}
