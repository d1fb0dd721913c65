//! Command-line interface definitions for Flotilla Watch.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials and feature flags can be provided via command-line flags or
//! environment variables; a `.env` file is honored as well.

use clap::Parser;

use crate::batch;

/// Command-line arguments for the Flotilla Watch scraper.
///
/// This struct defines all configuration options that can be passed to the
/// application at runtime. Options include the activist roster file, the
/// artifact output directory, per-run limits, and backend credentials.
///
/// # Examples
///
/// ```sh
/// # Process the default roster file
/// flotilla_watch
///
/// # Limit the run and keep artifacts elsewhere
/// flotilla_watch --input rosters/current.json --output-dir ./artifacts --max-activists 10
///
/// # Show what would run without touching the network
/// flotilla_watch --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the activist roster JSON exported by the persistence layer
    #[arg(short, long, default_value = "activists.json")]
    pub input: String,

    /// Directory the results artifact is written into
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Maximum number of activists processed this run
    #[arg(long, default_value_t = batch::DEFAULT_MAX_ACTIVISTS)]
    pub max_activists: usize,

    /// List the activists that would be processed, then exit without
    /// touching the network
    #[arg(long)]
    pub dry_run: bool,

    /// NewsAPI key; the NewsAPI backend is disabled without it
    #[arg(long, env = "NEWSAPI_KEY")]
    pub newsapi_key: Option<String>,

    /// Bing Web Search key; the Bing backend is disabled without it
    #[arg(long, env = "BING_SEARCH_KEY")]
    pub bing_search_key: Option<String>,

    /// Enable the SearX backend (public instances rate-limit aggressively)
    #[arg(long, env = "SEARX_ENABLED")]
    pub enable_searx: bool,

    /// OpenAI API key for the downstream classification step; required even
    /// though this tool never calls OpenAI itself
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,
}
