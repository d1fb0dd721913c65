//! Data models for activists and their gathered news results.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Activist`]: A person of interest, as exported by the persistence layer
//! - [`NewsResult`]: A normalized search/news result from any backend
//! - [`ActivistSearchResult`]: Everything gathered for one activist in one run
//!
//! The models use camelCase field names to match the JSON schema shared with
//! the persistence layer and the downstream classification service, hence the
//! `#[allow(non_snake_case)]` attributes.

use serde::{Deserialize, Serialize};

/// A person of interest whose status the pipeline gathers evidence for.
///
/// Activist records are owned by the external persistence layer and arrive
/// here through a JSON hand-off file. The pipeline never mutates them.
///
/// # Fields
///
/// * `id` - Stable identity key assigned by the persistence layer
/// * `name` - Display name, quoted verbatim inside generated queries
/// * `nationality` - Used by the alternative query pool
/// * `boatName` - The vessel the activist sailed with
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Activist {
    /// Identity key from the persistence layer.
    pub id: String,
    /// Display name of the activist.
    pub name: String,
    /// Nationality, e.g. "Irish".
    pub nationality: String,
    /// Name of the associated vessel.
    pub boatName: String,
}

/// A single normalized search result.
///
/// Every backend adapter maps its provider-specific response shape into this
/// struct, so the orchestration layers never see provider schemas. Entries
/// without a usable `url` are dropped at the adapter boundary and never
/// constructed.
///
/// # Fields
///
/// * `title` - Result headline
/// * `description` - Snippet, or full extracted article text when a deep
///   scrape succeeded
/// * `url` - Link to the article; non-empty by construction
/// * `publishedAt` - RFC 3339 timestamp as reported by the provider, or the
///   retrieval time when the provider reports none
/// * `source` - Human-readable source label (outlet or engine name)
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsResult {
    /// Result headline.
    pub title: String,
    /// Snippet or extracted article text.
    pub description: String,
    /// Link to the article.
    pub url: String,
    /// RFC 3339 publication timestamp.
    pub publishedAt: String,
    /// Source label, e.g. "Reuters" or "DuckDuckGo".
    pub source: String,
}

/// Everything the pipeline gathered for one activist in one run.
///
/// One of these is produced per activist and the full collection is written
/// as the run's output artifact, which the external classification service
/// consumes to derive a status verdict. Not mutated after creation.
///
/// # Invariants
///
/// * `newsResults` is deduplicated by url (first occurrence wins)
/// * `newsResults.len()` never exceeds the per-activist result cap
/// * `searchQueries` lists only the queries that were actually attempted
#[allow(non_snake_case)]
#[derive(Debug, Deserialize, Serialize)]
pub struct ActivistSearchResult {
    /// Identity key of the activist, copied from the input record.
    pub activistId: String,
    /// Display name of the activist.
    pub activistName: String,
    /// Nationality of the activist.
    pub nationality: String,
    /// Name of the associated vessel.
    pub boatName: String,
    /// Deduplicated, truncated, relevance-filtered results.
    pub newsResults: Vec<NewsResult>,
    /// The queries attempted for this activist, in order.
    pub searchQueries: Vec<String>,
}

impl ActivistSearchResult {
    /// Whether the run found any news for this activist.
    pub fn has_news(&self) -> bool {
        !self.newsResults.is_empty()
    }
}
