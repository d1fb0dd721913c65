//! DuckDuckGo adapter.
//!
//! Searches run through a small Python helper built on the `ddgs` package;
//! the adapter shells out to it and reads a JSON array from its stdout.
//! Helper failures of any kind (launch error, non-zero exit, timeout,
//! unparseable output) are logged and yield an empty list.
//!
//! Search snippets are shallow, so each kept result is deep-scraped through
//! the article extractor; when that produces a substantial body it replaces
//! the snippet as the result description.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::backends::{SearchBackend, PER_CALL_RESULT_CAP};
use crate::context::RunContext;
use crate::extract::ArticleExtractor;
use crate::models::NewsResult;
use crate::utils::truncate_for_log;

const PYTHON_BIN: &str = "python3";

/// Override with the `DDG_HELPER` environment variable.
const DEFAULT_HELPER: &str = "scripts/ddg_search.py";

/// Results requested from the helper, before field filtering and the keep
/// cap are applied.
const HELPER_RESULT_LIMIT: &str = "5";

const HELPER_MODE: &str = "text";

const HELPER_TIMEOUT: Duration = Duration::from_secs(15);

/// A deep-scraped body shorter than this keeps the search snippet instead.
const DEEP_DESCRIPTION_MIN_LEN: usize = 100;

pub struct DuckDuckGo {
    helper: PathBuf,
    extractor: Arc<ArticleExtractor>,
}

impl DuckDuckGo {
    pub fn from_env(extractor: Arc<ArticleExtractor>) -> Self {
        let helper = std::env::var("DDG_HELPER")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_HELPER));
        Self { helper, extractor }
    }

    async fn run_helper(&self, query: &str) -> Option<Vec<HelperResult>> {
        let output = tokio::time::timeout(
            HELPER_TIMEOUT,
            Command::new(PYTHON_BIN)
                .arg(&self.helper)
                .arg(query)
                .arg(HELPER_RESULT_LIMIT)
                .arg(HELPER_MODE)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match output {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                warn!(
                    helper = %self.helper.display(),
                    error = %err,
                    "DuckDuckGo helper failed to launch"
                );
                return None;
            }
            Err(_) => {
                warn!(
                    timeout_secs = HELPER_TIMEOUT.as_secs(),
                    "DuckDuckGo helper timed out"
                );
                return None;
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                status = %output.status,
                stderr = %truncate_for_log(&stderr, 400),
                "DuckDuckGo helper exited with an error"
            );
            return None;
        }

        parse_helper_output(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct HelperResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    publishedAt: String,
    #[serde(default)]
    source: String,
}

fn parse_helper_output(stdout: &[u8]) -> Option<Vec<HelperResult>> {
    match serde_json::from_slice(stdout) {
        Ok(results) => Some(results),
        Err(err) => {
            let raw = String::from_utf8_lossy(stdout);
            warn!(
                error = %err,
                raw = %truncate_for_log(&raw, 400),
                "DuckDuckGo helper output was not valid JSON"
            );
            None
        }
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGo {
    fn name(&self) -> &'static str {
        "DuckDuckGo"
    }

    async fn search(&self, query: &str, _ctx: &RunContext) -> Vec<NewsResult> {
        let raw = match self.run_helper(query).await {
            Some(raw) => raw,
            None => return Vec::new(),
        };
        debug!(query, found = raw.len(), "DuckDuckGo helper returned results");

        let mut results = Vec::new();
        for item in raw
            .into_iter()
            .filter(|item| !item.title.is_empty() && !item.url.is_empty())
            .take(PER_CALL_RESULT_CAP)
        {
            let mut description = if item.description.is_empty() {
                item.title.clone()
            } else {
                item.description
            };

            let article = self.extractor.extract(&item.url).await;
            if article.content.chars().count() > DEEP_DESCRIPTION_MIN_LEN {
                debug!(
                    url = %item.url,
                    words = article.word_count,
                    "deep scrape replaced search snippet"
                );
                description = article.content;
            } else {
                debug!(url = %item.url, "deep scrape too thin, keeping search snippet");
            }

            results.push(NewsResult {
                title: item.title,
                description,
                url: item.url,
                publishedAt: if item.publishedAt.is_empty() {
                    Utc::now().to_rfc3339()
                } else {
                    item.publishedAt
                },
                source: if item.source.is_empty() {
                    "DuckDuckGo".to_string()
                } else {
                    item.source
                },
            });
        }
        results
    }
}
