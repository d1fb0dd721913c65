//! Per-run shared state: call budget, backend backoff, query analytics.
//!
//! A [`RunContext`] is constructed once at the start of a pipeline run and
//! passed by reference into every backend adapter call. Nothing in here is
//! global: when the run ends the context is dropped and all of its state goes
//! with it.
//!
//! Within one query the adapters run concurrently and share the context, so
//! the budget is an atomic counter and the registry/analytics sit behind an
//! async mutex. Across queries and activists the pipeline is sequential, so
//! contention is short-lived by construction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::info;

/// Default ceiling on counted backend calls for one run.
pub const DEFAULT_MAX_CALLS_PER_RUN: u32 = 50;

/// Global ceiling on counted backend calls for one pipeline run.
///
/// Only the credentialed/metered backends spend from this budget; the free
/// scrape engines and the subprocess search never do. Once the budget is
/// exhausted every further counted call is skipped for the rest of the run.
#[derive(Debug)]
pub struct RunBudget {
    max_calls: u32,
    calls_made: AtomicU32,
}

impl RunBudget {
    pub fn new(max_calls: u32) -> Self {
        Self {
            max_calls,
            calls_made: AtomicU32::new(0),
        }
    }

    /// Atomically claim one call against the budget.
    ///
    /// Returns `false` without incrementing when the budget is already
    /// spent. Concurrent callers can never overshoot `max_calls`.
    pub fn try_spend(&self) -> bool {
        self.calls_made
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n < self.max_calls { Some(n + 1) } else { None }
            })
            .is_ok()
    }

    /// Whether the budget is fully spent.
    pub fn is_exhausted(&self) -> bool {
        self.calls_made.load(Ordering::SeqCst) >= self.max_calls
    }

    /// Counted calls made so far.
    pub fn used(&self) -> u32 {
        self.calls_made.load(Ordering::SeqCst)
    }

    /// The configured ceiling.
    pub fn max(&self) -> u32 {
        self.max_calls
    }
}

/// Per-backend "do not call until" timestamps.
///
/// An adapter that receives a quota or block signal records itself here with
/// a provider-tuned duration. Every adapter checks the registry before doing
/// any work. Entries expire implicitly: once the resume time has passed the
/// backend is treated as available again, no cleanup required.
#[derive(Debug, Default)]
pub struct BackoffRegistry {
    resume_at: Mutex<HashMap<&'static str, Instant>>,
}

impl BackoffRegistry {
    /// Record that `backend` must not be called for `duration`.
    pub async fn set(&self, backend: &'static str, duration: Duration) {
        let until = Instant::now() + duration;
        self.resume_at.lock().await.insert(backend, until);
        info!(
            backend,
            minutes = duration.as_secs() / 60,
            "backend entering backoff"
        );
    }

    /// Whether `backend` is currently inside a backoff window.
    pub async fn is_backing_off(&self, backend: &str) -> bool {
        match self.resume_at.lock().await.get(backend) {
            Some(until) => Instant::now() < *until,
            None => false,
        }
    }
}

/// Running statistics for one query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryStats {
    /// Times the query returned at least one result.
    pub success_count: u32,
    /// Times the query was attempted.
    pub total_count: u32,
    /// Average result count over the successful attempts.
    pub avg_results: f64,
}

/// Per-query success tracking, summarized at the end of a run.
#[derive(Debug, Default)]
pub struct QueryAnalytics {
    stats: Mutex<HashMap<String, QueryStats>>,
}

impl QueryAnalytics {
    /// Record one attempt of `query` that produced `result_count` results.
    pub async fn record(&self, query: &str, result_count: usize) {
        let mut stats = self.stats.lock().await;
        let entry = stats.entry(query.to_string()).or_default();
        entry.total_count += 1;
        if result_count > 0 {
            entry.success_count += 1;
            entry.avg_results = (entry.avg_results * f64::from(entry.success_count - 1)
                + result_count as f64)
                / f64::from(entry.success_count);
        }
    }

    /// The `limit` most successful queries, sorted by success count.
    pub async fn top_queries(&self, limit: usize) -> Vec<(String, QueryStats)> {
        let stats = self.stats.lock().await;
        let mut entries: Vec<(String, QueryStats)> =
            stats.iter().map(|(q, s)| (q.clone(), *s)).collect();
        entries.sort_by(|a, b| b.1.success_count.cmp(&a.1.success_count));
        entries.truncate(limit);
        entries
    }
}

/// Everything one pipeline run shares across adapter calls.
#[derive(Debug)]
pub struct RunContext {
    pub budget: RunBudget,
    pub backoff: BackoffRegistry,
    pub analytics: QueryAnalytics,
}

impl RunContext {
    pub fn new(max_calls: u32) -> Self {
        Self {
            budget: RunBudget::new(max_calls),
            backoff: BackoffRegistry::default(),
            analytics: QueryAnalytics::default(),
        }
    }
}
