//! Relevance scoring heuristic for search results.
//!
//! Every candidate result is scored against the query that produced it, on
//! the lowercased concatenation of title and description. The score is a sum
//! of independent signals, capped at 1.0:
//!
//! | Signal | Weight |
//! |--------|--------|
//! | Normalized query text appears verbatim | +0.8 |
//! | Each high-value keyword (detained, released, ...) | +0.3 |
//! | Each medium-value keyword (israel, aid, ...) | +0.1 |
//! | Published within 1 day | +0.4 |
//! | Published within 2 days | +0.3 |
//! | Published within 4 days | +0.2 |
//! | Source matches a reliable outlet | +0.2 |
//!
//! Scoring is deterministic for a given (result, query, clock) and is used
//! twice: inside the credentialed adapters to pre-filter provider responses,
//! and by callers applying [`RELEVANCE_CUTOFF`] before accepting a result.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::NewsResult;

/// Minimum score a result must exceed to be kept.
pub const RELEVANCE_CUTOFF: f64 = 0.2;

/// Status and mission terms that strongly suggest the story is about an
/// activist's situation.
const HIGH_VALUE_KEYWORDS: [&str; 8] = [
    "detained",
    "released",
    "flotilla",
    "gaza",
    "humanitarian",
    "activist",
    "arrested",
    "freed",
];

/// Contextual terms that weakly suggest relevance.
const MEDIUM_VALUE_KEYWORDS: [&str; 6] =
    ["israel", "palestine", "aid", "boat", "mission", "protest"];

/// Outlets whose coverage of the region is considered dependable. Matched
/// case-insensitively as substrings of the source label.
const RELIABLE_SOURCES: [&str; 8] = [
    "bbc",
    "reuters",
    "ap",
    "guardian",
    "al jazeera",
    "haaretz",
    "times of israel",
    "ynet",
];

/// Score `result` against `query`, in `[0.0, 1.0]`.
pub fn score(result: &NewsResult, query: &str) -> f64 {
    score_at(result, query, Utc::now())
}

fn score_at(result: &NewsResult, query: &str, now: DateTime<Utc>) -> f64 {
    let text = format!("{} {}", result.title, result.description).to_lowercase();
    let mut total: f64 = 0.0;

    // Exact query match, with the phrase quotes stripped.
    let normalized_query = query.to_lowercase().replace('"', "");
    if text.contains(&normalized_query) {
        total += 0.8;
    }

    for keyword in HIGH_VALUE_KEYWORDS {
        if text.contains(keyword) {
            total += 0.3;
        }
    }
    for keyword in MEDIUM_VALUE_KEYWORDS {
        if text.contains(keyword) {
            total += 0.1;
        }
    }

    if let Some(published) = parse_published(&result.publishedAt) {
        let days_since = (now - published).num_seconds() as f64 / 86_400.0;
        if days_since <= 1.0 {
            total += 0.4;
        } else if days_since <= 2.0 {
            total += 0.3;
        } else if days_since <= 4.0 {
            total += 0.2;
        }
    }

    let source = result.source.to_lowercase();
    if RELIABLE_SOURCES.iter().any(|outlet| source.contains(outlet)) {
        total += 0.2;
    }

    total.min(1.0)
}

/// Keep results scoring above [`RELEVANCE_CUTOFF`], best first, at most `cap`.
pub fn filter_and_rank(results: Vec<NewsResult>, query: &str, cap: usize) -> Vec<NewsResult> {
    let mut scored: Vec<(f64, NewsResult)> = results
        .into_iter()
        .map(|result| (score(&result, query), result))
        .filter(|(score, _)| *score > RELEVANCE_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(cap);
    scored.into_iter().map(|(_, result)| result).collect()
}

/// Parse a provider timestamp. Providers mostly emit RFC 3339; a bare date
/// is accepted as midnight UTC. Anything else forfeits the recency bonus.
fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
