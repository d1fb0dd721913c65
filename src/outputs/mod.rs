//! Output artifact generation.
//!
//! One run produces a single JSON artifact holding every
//! [`ActivistSearchResult`](crate::models::ActivistSearchResult), named for
//! the run date:
//!
//! ```text
//! output_dir/
//! └── scraped-news-2025-10-06.json
//! ```
//!
//! The artifact is the hand-off point to the downstream classification
//! service, which reads it and derives per-activist status verdicts from
//! the gathered evidence.

pub mod json;
