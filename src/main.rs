//! # Flotilla Watch
//!
//! A best-effort news gathering pipeline for flotilla activists. Given a
//! roster of activists exported by the persistence layer, it fans targeted
//! queries out across news APIs and search engines, deep-scrapes the most
//! promising articles, and writes a dated JSON artifact for the downstream
//! status classifier.
//!
//! ## Features
//!
//! - Six search backends behind one adapter contract: NewsAPI, Bing News,
//!   DuckDuckGo (via a Python helper), SearX, Startpage, and Ecosia
//! - Relevance scoring tuned for detention/release coverage, with a strict
//!   cutoff so junk never reaches the classifier
//! - A per-run call budget plus per-backend backoff windows, so one run can
//!   never burn through API quotas
//! - Three-stage article extraction: rendered DOM, raw HTML heuristics,
//!   then meta description
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=... flotilla_watch --input activists.json --output-dir .
//! ```
//!
//! ## Architecture
//!
//! The run is a pipeline:
//! 1. **Load**: Read the activist roster from the input JSON file
//! 2. **Search**: For each activist, fan targeted queries out across the
//!    backend roster in small sequential batches
//! 3. **Extract**: Deep-scrape promising articles for full text
//! 4. **Output**: Write one dated JSON artifact for the classifier

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod backends;
mod batch;
mod cli;
mod context;
mod extract;
mod models;
mod outputs;
mod queries;
mod scoring;
mod search;
mod utils;

use backends::{BackendCredentials, BackendSet};
use batch::BatchPolicy;
use cli::Cli;
use context::RunContext;
use extract::ArticleExtractor;
use models::Activist;
use search::SearchPolicy;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("flotilla_watch starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(
        ?args.input,
        ?args.output_dir,
        args.max_activists,
        args.dry_run,
        "Parsed CLI arguments"
    );

    // The artifact feeds an OpenAI-backed classification step downstream;
    // the key is validated here even though this tool never calls OpenAI.
    if args.openai_api_key.as_deref().is_none_or(str::is_empty) {
        error!("OPENAI_API_KEY environment variable is required");
        return Err("OPENAI_API_KEY environment variable is required".into());
    }

    // ---- Load the activist roster ----
    let raw = match tokio::fs::read_to_string(&args.input).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(path = %args.input, error = %e, "Failed to read the activist roster");
            return Err(e.into());
        }
    };
    let activists: Vec<Activist> = match serde_json::from_str(&raw) {
        Ok(activists) => activists,
        Err(e) => {
            error!(path = %args.input, error = %e, "Activist roster is not valid JSON");
            return Err(e.into());
        }
    };
    info!(count = activists.len(), path = %args.input, "Loaded activist roster");

    if args.dry_run {
        info!(
            planned = activists.len().min(args.max_activists),
            "Dry run, listing activists without searching"
        );
        for activist in activists.iter().take(args.max_activists) {
            info!(
                id = %activist.id,
                name = %activist.name,
                nationality = %activist.nationality,
                boat = %activist.boatName,
                "would process"
            );
        }
        return Ok(());
    }

    // Early check: ensure the output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Assemble the run ----
    let ctx = RunContext::new(context::DEFAULT_MAX_CALLS_PER_RUN);
    let client = backends::http_client();
    let extractor = Arc::new(ArticleExtractor::new(client.clone()));
    let credentials = BackendCredentials {
        newsapi_key: args.newsapi_key.clone(),
        bing_search_key: args.bing_search_key.clone(),
        searx_enabled: args.enable_searx,
    };
    let backend_set = BackendSet::new(client, extractor, &credentials);

    let batch_policy = BatchPolicy {
        max_activists: args.max_activists,
        ..Default::default()
    };
    let search_policy = SearchPolicy::default();

    // ---- Search ----
    let results = batch::scrape_all(
        &activists,
        &backend_set,
        &batch_policy,
        &search_policy,
        &ctx,
    )
    .await;

    // ---- Output ----
    let artifact_path = match outputs::json::write_results(&results, &args.output_dir).await {
        Ok(path) => path,
        Err(e) => {
            error!(error = %e, "Failed to write the results artifact");
            return Err(e);
        }
    };

    let total_articles: usize = results.iter().map(|r| r.newsResults.len()).sum();
    let with_news = results.iter().filter(|r| r.has_news()).count();
    info!(
        activists = results.len(),
        with_news,
        total_articles,
        artifact = %artifact_path,
        "Run summary"
    );

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
