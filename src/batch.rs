//! Batch orchestration over the full activist roster.
//!
//! Activists are processed strictly one at a time, in small batches with a
//! pause between batches; only the per-activist backend fan-out runs
//! concurrently. The roster is truncated to a hard per-run cap before
//! processing. At the end the module logs budget usage and the top
//! performing queries.

use std::time::Duration;

use tracing::{info, warn};

use crate::backends::BackendSet;
use crate::context::RunContext;
use crate::models::{Activist, ActivistSearchResult};
use crate::search::{self, SearchPolicy};

/// Activists processed per run unless overridden.
pub const DEFAULT_MAX_ACTIVISTS: usize = 50;

const DEFAULT_BATCH_SIZE: usize = 5;

const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_secs(3);

/// Queries shown in the end-of-run analytics log.
const TOP_QUERY_COUNT: usize = 5;

/// Knobs for the batch loop.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    /// Activists processed per run; excess input is dropped.
    pub max_activists: usize,
    /// Activists per batch.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub inter_batch_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            max_activists: DEFAULT_MAX_ACTIVISTS,
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
        }
    }
}

/// Run the search loop for every activist on the roster.
///
/// Returns one entry per processed activist, in input order, including the
/// activists for whom nothing was found.
pub async fn scrape_all(
    activists: &[Activist],
    backends: &BackendSet,
    batch_policy: &BatchPolicy,
    search_policy: &SearchPolicy,
    ctx: &RunContext,
) -> Vec<ActivistSearchResult> {
    info!(
        total = activists.len(),
        cap = batch_policy.max_activists,
        batch_size = batch_policy.batch_size,
        "starting bulk news scrape"
    );
    for (backend, enabled) in backends.enablement() {
        info!(backend, enabled, "backend status");
    }

    let limited = &activists[..activists.len().min(batch_policy.max_activists)];
    if limited.len() < activists.len() {
        warn!(
            dropped = activists.len() - limited.len(),
            "activist list truncated to the run cap"
        );
    }

    let total_batches = limited.len().div_ceil(batch_policy.batch_size.max(1));
    let mut results: Vec<ActivistSearchResult> = Vec::with_capacity(limited.len());

    for (index, batch) in limited.chunks(batch_policy.batch_size.max(1)).enumerate() {
        info!(
            batch = index + 1,
            of = total_batches,
            size = batch.len(),
            "processing batch"
        );

        let mut with_news = 0usize;
        for activist in batch {
            let result = search::search_for_activist(activist, backends, search_policy, ctx).await;
            info!(
                name = %result.activistName,
                articles = result.newsResults.len(),
                "processed activist"
            );
            if result.has_news() {
                with_news += 1;
            }
            results.push(result);
        }

        if with_news > 0 {
            info!(with_news, of = batch.len(), "batch complete, recent news found");
        } else {
            info!(of = batch.len(), "batch complete, no recent news");
        }

        if index + 1 < total_batches {
            tokio::time::sleep(batch_policy.inter_batch_delay).await;
        }
    }

    info!(processed = results.len(), "scraping complete");
    info!(
        used = ctx.budget.used(),
        max = ctx.budget.max(),
        "API call budget"
    );
    log_query_analytics(ctx).await;

    results
}

async fn log_query_analytics(ctx: &RunContext) {
    let top = ctx.analytics.top_queries(TOP_QUERY_COUNT).await;
    if top.is_empty() {
        return;
    }
    info!("top performing queries");
    for (query, stats) in top {
        let success_rate = stats.success_count as f64 / stats.total_count as f64 * 100.0;
        info!(
            query = %query,
            success = %format!("{success_rate:.0}%"),
            avg_results = %format!("{:.1}", stats.avg_results),
            "query performance"
        );
    }
}
