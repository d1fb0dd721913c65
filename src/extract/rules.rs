//! Extraction rules: selector priority orders, stripped-element lists, and
//! boilerplate filters.
//!
//! Everything here is data. The extractor walks these lists in order and
//! silently skips entries that fail to parse as selectors, so a bad entry
//! degrades coverage instead of breaking extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Elements removed from the rendered DOM before any text is read.
pub const UNWANTED_SELECTORS: &[&str] = &[
    "script",
    "style",
    "nav",
    "header",
    "footer",
    ".advertisement",
    ".ads",
    ".sidebar",
    ".comments",
    ".social-share",
    ".newsletter",
    ".cookie-banner",
    "[class*=\"ad-\"]",
    "[id*=\"ad-\"]",
    "[class*=\"popup\"]",
    "[class*=\"modal\"]",
    "[class*=\"overlay\"]",
];

/// Consent and cookie-wall containers, removed separately so pages that
/// render their article underneath an overlay still extract.
pub const CONSENT_SELECTORS: &[&str] = &[
    "[class*=\"cookie\"]",
    "[id*=\"cookie\"]",
    "[class*=\"consent\"]",
    "[id*=\"consent\"]",
    "[class*=\"gdpr\"]",
];

/// Content containers, most specific layouts first.
pub const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".content",
    ".story-content",
    ".article-body",
    ".post-body",
    ".entry-body",
];

/// Title candidates.
pub const TITLE_SELECTORS: &[&str] = &[
    "h1",
    ".article-title",
    ".post-title",
    ".entry-title",
    ".headline",
    "title",
];

/// Byline candidates.
pub const AUTHOR_SELECTORS: &[&str] = &[
    ".author",
    ".byline",
    ".article-author",
    ".post-author",
    "[rel=\"author\"]",
    "[class*=\"author\"]",
];

/// Publication-date candidates. `time[datetime]` is preferred because the
/// attribute is machine-readable.
pub const DATE_SELECTORS: &[&str] = &[
    "time[datetime]",
    ".published-date",
    ".post-date",
    ".article-date",
    "[class*=\"date\"]",
    "[class*=\"time\"]",
];

/// Phrases that mark a text block as chrome rather than article prose.
/// Matched case-insensitively against each candidate block.
pub const BOILERPLATE_PHRASES: &[&str] = &[
    "cookie",
    "privacy",
    "consent",
    "subscribe",
    "newsletter",
    "terms of service",
    "advertising",
    "personalized",
    "tracking",
    "data protection",
    "gdpr",
    "accept all",
    "manage preferences",
    "help us verify",
    "automated access",
    "commercial use",
    "follow us",
    "share this",
    "advertisement",
    "function",
    "var ",
    "javascript",
    "enable javascript",
    "browser",
    "microsoft cares",
    "news group newspapers",
    "automated means",
];

/// Containers tried first on the raw-HTML path.
pub const RAW_CONTAINER_SELECTORS: &[&str] = &[
    "article",
    "main",
    "div[class*=\"article\"]",
    "div[id*=\"article\"]",
    "div[class*=\"content\"]",
    "div[id*=\"content\"]",
    "div[class*=\"post\"]",
    "div[id*=\"post\"]",
    "div[class*=\"entry\"]",
    "div[id*=\"entry\"]",
    "div[class*=\"story\"]",
    "div[id*=\"story\"]",
];

/// Elements stripped before the raw-HTML strategies run.
pub const RAW_STRIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

/// Markers that disqualify a raw-HTML text block (inlined script bodies,
/// legal boilerplate, subscription prompts).
pub const RAW_TEXT_BAD_MARKERS: &[&str] = &[
    "function",
    "var ",
    "=>",
    "async",
    "await",
    "cookie",
    "privacy",
    "terms of service",
    "subscribe",
    "newsletter",
];

/// Blocks that are nothing but code punctuation.
pub static CODE_FRAGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[{}();\s]*$").unwrap());

/// Minimum block length on the paragraph strategies.
pub const MIN_BLOCK_LEN: usize = 20;

/// Minimum block length on the loose div/span fallback strategy.
pub const MIN_FALLBACK_BLOCK_LEN: usize = 30;

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_every_selector_list_parses() {
        let lists: [&[&str]; 7] = [
            UNWANTED_SELECTORS,
            CONSENT_SELECTORS,
            CONTENT_SELECTORS,
            TITLE_SELECTORS,
            AUTHOR_SELECTORS,
            DATE_SELECTORS,
            RAW_CONTAINER_SELECTORS,
        ];
        for list in lists {
            for raw in list {
                assert!(Selector::parse(raw).is_ok(), "selector failed to parse: {raw}");
            }
        }
    }

    #[test]
    fn test_code_fragment_pattern() {
        assert!(CODE_FRAGMENT.is_match("{ } ( ) ;"));
        assert!(CODE_FRAGMENT.is_match(""));
        assert!(!CODE_FRAGMENT.is_match("Actual prose, with words."));
    }
}
