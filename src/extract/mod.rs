//! Best-effort article text extraction.
//!
//! Given a result URL, the extractor tries three strategies in order, each
//! only when the previous one produced too little content:
//!
//! | Stage | Strategy | Sufficient when |
//! |-------|----------|-----------------|
//! | 1 | Rendered DOM via headless browser, overlay/chrome stripped, first content container | > 100 chars |
//! | 2 | Raw HTML GET, paragraph ladder over known containers, then all paragraphs, then loose blocks | > 50 chars |
//! | 3 | `meta[name="description"]` content | > 50 chars |
//!
//! Extraction never fails: a URL nothing can be read from yields an
//! all-empty result. Site layouts vary too much for guarantees; the selector
//! lists in [`rules`] encode the layouts seen in practice.
//!
//! Content is normalized to single-space whitespace and truncated to
//! [`MAX_CONTENT_CHARS`] with a `...` marker; the word count is taken from
//! the final content.

pub mod render;
pub mod rules;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

use crate::utils::{collapse_whitespace, truncate_content, word_count};
use render::ChromeRenderer;

/// Longest article body carried into the output artifact.
pub const MAX_CONTENT_CHARS: usize = 5000;

/// Rendered-DOM content below this length falls through to the raw stage.
const MIN_RENDERED_CONTENT_LEN: usize = 100;

/// Raw-HTML content below this length is discarded entirely.
const MIN_RAW_CONTENT_LEN: usize = 50;

/// Meta descriptions below this length are not worth keeping.
const MIN_META_DESCRIPTION_LEN: usize = 50;

static BLOCK_ELEMENTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, h1, h2, h3, h4, h5, h6, div, span").unwrap());
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static FALLBACK_BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div, span, section, h1, h2, h3, h4, h5, h6").unwrap());
static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());

/// What one extraction attempt produced. All fields may be empty.
#[derive(Debug, Default)]
pub struct ExtractedArticle {
    /// Best-effort headline.
    pub title: String,
    /// Normalized, bounded article text.
    pub content: String,
    /// Byline, when the page exposes one.
    pub author: Option<String>,
    /// Publication date string, when the page exposes one.
    pub published_date: Option<String>,
    /// Whitespace-separated word count of `content`.
    pub word_count: usize,
}

/// The layered extraction pipeline.
pub struct ArticleExtractor {
    client: reqwest::Client,
    renderer: ChromeRenderer,
}

impl ArticleExtractor {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            renderer: ChromeRenderer::from_env(),
        }
    }

    /// Extract the article behind `url`, falling through the stages.
    #[instrument(level = "debug", skip(self))]
    pub async fn extract(&self, url: &str) -> ExtractedArticle {
        if let Some(dom) = self.renderer.render(url).await {
            let rendered = rendered_article(&dom);
            if rendered.content.chars().count() > MIN_RENDERED_CONTENT_LEN {
                return finalize(rendered);
            }
            debug!(url, "rendered DOM carried too little content, trying raw fetch");
        }

        match self.fetch_raw(url).await {
            Ok(html) => article_from_raw_html(&html),
            Err(e) => {
                warn!(url, error = %e, "raw fetch failed");
                ExtractedArticle::default()
            }
        }
    }

    async fn fetch_raw(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}

/// Stage-1 extraction over a rendered DOM.
fn rendered_article(html: &str) -> ExtractedArticle {
    let mut document = Html::parse_document(html);
    strip_matching(&mut document, rules::CONSENT_SELECTORS);
    strip_matching(&mut document, rules::UNWANTED_SELECTORS);

    let title = first_text(&document, rules::TITLE_SELECTORS).unwrap_or_default();
    let author = first_text(&document, rules::AUTHOR_SELECTORS);
    let published_date = first_date(&document);

    let mut content = String::new();
    for raw_selector in rules::CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        let Some(container) = document.select(&selector).next() else {
            continue;
        };
        let parts: Vec<String> = container
            .select(&BLOCK_ELEMENTS)
            .filter_map(|block| {
                let text = collapse_whitespace(&block.text().collect::<String>());
                keeps_rendered_block(&text).then_some(text)
            })
            .collect();
        if !parts.is_empty() {
            content = parts.join(" ");
            break;
        }
    }

    // No recognizable container: fall back to everything the page says.
    if content.is_empty() {
        content = collapse_whitespace(&document.root_element().text().collect::<String>());
    }

    ExtractedArticle {
        title,
        content,
        author,
        published_date,
        word_count: 0,
    }
}

/// Stages 2 and 3 over fetched raw HTML.
fn article_from_raw_html(html: &str) -> ExtractedArticle {
    let mut content = raw_article_content(html);
    if content.is_empty() {
        content = meta_description(html).unwrap_or_default();
    }
    if content.chars().count() > MIN_RAW_CONTENT_LEN {
        finalize(ExtractedArticle {
            content,
            ..Default::default()
        })
    } else {
        ExtractedArticle::default()
    }
}

/// The raw-HTML strategy ladder.
fn raw_article_content(html: &str) -> String {
    let mut document = Html::parse_document(html);
    strip_matching(&mut document, rules::RAW_STRIPPED_TAGS);

    // Paragraphs inside a known content container.
    for raw_selector in rules::RAW_CONTAINER_SELECTORS {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        for container in document.select(&selector) {
            let parts = collect_blocks(container.select(&PARAGRAPHS), rules::MIN_BLOCK_LEN);
            if !parts.is_empty() {
                return parts.join(" ");
            }
        }
    }

    // Every paragraph in the document.
    let parts = collect_blocks(document.select(&PARAGRAPHS), rules::MIN_BLOCK_LEN);
    if !parts.is_empty() {
        return parts.join(" ");
    }

    // Loose text holders, longer minimum to skip navigation fragments.
    collect_blocks(document.select(&FALLBACK_BLOCKS), rules::MIN_FALLBACK_BLOCK_LEN).join(" ")
}

fn collect_blocks<'a>(
    elements: impl Iterator<Item = scraper::ElementRef<'a>>,
    min_len: usize,
) -> Vec<String> {
    elements
        .filter_map(|block| {
            let text = collapse_whitespace(&block.text().collect::<String>());
            keeps_raw_block(&text, min_len).then_some(text)
        })
        .collect()
}

/// The page's meta description, when long enough to be useful.
fn meta_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let element = document.select(&META_DESCRIPTION).next()?;
    let description = collapse_whitespace(element.value().attr("content")?);
    (description.chars().count() > MIN_META_DESCRIPTION_LEN).then_some(description)
}

fn keeps_rendered_block(text: &str) -> bool {
    if text.chars().count() <= rules::MIN_BLOCK_LEN {
        return false;
    }
    let lower = text.to_lowercase();
    if rules::BOILERPLATE_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }
    if rules::CODE_FRAGMENT.is_match(text) {
        return false;
    }
    // Prose has sentences; fragments and labels don't.
    text.split('.').count() >= 2
}

fn keeps_raw_block(text: &str, min_len: usize) -> bool {
    if text.chars().count() <= min_len {
        return false;
    }
    let lower = text.to_lowercase();
    if rules::RAW_TEXT_BAD_MARKERS.iter().any(|m| lower.contains(m)) {
        return false;
    }
    !rules::CODE_FRAGMENT.is_match(text)
}

/// Detach every element matching any of `selectors` from the tree.
fn strip_matching(document: &mut Html, selectors: &[&str]) {
    let mut doomed = Vec::new();
    for raw_selector in selectors {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        doomed.extend(document.select(&selector).map(|element| element.id()));
    }
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// First selector whose first match carries text.
fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw_selector in selectors {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = collapse_whitespace(&element.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Publication date, preferring the machine-readable `datetime` attribute.
fn first_date(document: &Html) -> Option<String> {
    for raw_selector in rules::DATE_SELECTORS {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let value = match element.value().attr("datetime") {
                Some(datetime) => datetime.to_string(),
                None => collapse_whitespace(&element.text().collect::<String>()),
            };
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Normalize, bound, and count the final content.
fn finalize(mut article: ExtractedArticle) -> ExtractedArticle {
    article.content = truncate_content(&collapse_whitespace(&article.content), MAX_CONTENT_CHARS);
    article.word_count = word_count(&article.content);
    article.title = collapse_whitespace(&article.title);
    article.author = article
        .author
        .map(|a| collapse_whitespace(&a))
        .filter(|a| !a.is_empty());
    article.published_date = article
        .published_date
        .map(|d| collapse_whitespace(&d))
        .filter(|d| !d.is_empty());
    article
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_PAGE: &str = r#"
        <html><head><title>Page title</title></head><body>
        <nav>Site navigation links that should never appear in output.</nav>
        <div class="cookie-banner">We value your privacy. Accept all to continue.</div>
        <article>
            <h1>Crew of the Hope detained at sea</h1>
            <p class="byline author">Jane Reporter</p>
            <time datetime="2025-10-05T08:00:00Z">October 5</time>
            <p>The crew of the vessel was stopped overnight. Officials confirmed the boarding on Sunday.</p>
            <p>Supporters gathered at the harbour. A statement is expected later today.</p>
            <script>var tracking = { enabled: true };</script>
        </article>
        </body></html>
    "#;

    #[test]
    fn test_rendered_article_extracts_container_text() {
        let article = rendered_article(ARTICLE_PAGE);
        assert!(article.content.contains("stopped overnight"));
        assert!(article.content.contains("harbour"));
        assert!(!article.content.contains("navigation links"));
        assert!(!article.content.contains("tracking"));
        assert!(!article.content.contains("Accept all"));
    }

    #[test]
    fn test_rendered_article_picks_title_author_date() {
        let article = rendered_article(ARTICLE_PAGE);
        assert_eq!(article.title, "Crew of the Hope detained at sea");
        assert_eq!(article.author.as_deref(), Some("Jane Reporter"));
        assert_eq!(article.published_date.as_deref(), Some("2025-10-05T08:00:00Z"));
    }

    #[test]
    fn test_rendered_article_body_fallback_without_container() {
        let html = "<html><body><div>Short page. It has no article element at all.</div></body></html>";
        let article = rendered_article(html);
        assert!(article.content.contains("no article element"));
    }

    #[test]
    fn test_raw_content_prefers_known_containers() {
        let html = r#"
            <html><body>
            <p>Stray paragraph outside any container, quite long enough to pass.</p>
            <div class="article-body">
                <p>Inside paragraph one, carrying enough words to pass the filter.</p>
                <p>Inside paragraph two, also long enough to be kept here.</p>
            </div>
            </body></html>
        "#;
        let content = raw_article_content(html);
        assert!(content.contains("Inside paragraph one"));
        assert!(content.contains("Inside paragraph two"));
        assert!(!content.contains("Stray paragraph"));
    }

    #[test]
    fn test_raw_content_falls_back_to_all_paragraphs() {
        let html = r#"
            <html><body>
            <p>First loose paragraph with plenty of readable words in it.</p>
            <p>Second loose paragraph, also comfortably past the minimum.</p>
            </body></html>
        "#;
        let content = raw_article_content(html);
        assert!(content.contains("First loose paragraph"));
        assert!(content.contains("Second loose paragraph"));
    }

    #[test]
    fn test_raw_content_filters_script_remnants_and_boilerplate() {
        let html = r#"
            <html><body>
            <p>function init() { window.dataLayer = window.dataLayer || []; }</p>
            <p>Please subscribe to our newsletter for more updates and offers.</p>
            <p>Actual story text that survives the filtering and is long enough.</p>
            </body></html>
        "#;
        let content = raw_article_content(html);
        assert!(content.contains("Actual story text"));
        assert!(!content.contains("function init"));
        assert!(!content.contains("newsletter"));
    }

    #[test]
    fn test_meta_description_fallback() {
        let html = r#"
            <html><head>
            <meta name="description" content="An aid vessel was intercepted and its crew taken to port for questioning.">
            </head><body><div>nav</div></body></html>
        "#;
        let article = article_from_raw_html(html);
        assert_eq!(
            article.content,
            "An aid vessel was intercepted and its crew taken to port for questioning."
        );
        assert!(article.word_count > 0);
    }

    #[test]
    fn test_short_meta_description_is_discarded() {
        let html = r#"<html><head><meta name="description" content="Too short."></head><body></body></html>"#;
        let article = article_from_raw_html(html);
        assert!(article.content.is_empty());
        assert_eq!(article.word_count, 0);
    }

    #[test]
    fn test_finalize_truncates_and_counts() {
        let long = "word ".repeat(2000);
        let article = finalize(ExtractedArticle {
            content: long,
            ..Default::default()
        });
        assert!(article.content.chars().count() <= MAX_CONTENT_CHARS + 3);
        assert!(article.content.ends_with("..."));
        assert!(article.word_count > 0);
    }

    fn extractor_without_browser() -> ArticleExtractor {
        ArticleExtractor {
            client: crate::backends::http_client(),
            renderer: ChromeRenderer::with_binary("/nonexistent/chromium".to_string()),
        }
    }

    #[tokio::test]
    async fn test_extract_reaches_meta_description_when_render_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/article")
            .with_status(200)
            .with_body(
                r#"<html><head><meta name="description" content="An aid vessel was intercepted and its crew taken to port for questioning."></head><body><div>nav</div></body></html>"#,
            )
            .create_async()
            .await;

        let article = extractor_without_browser()
            .extract(&format!("{}/article", server.url()))
            .await;

        assert!(article.content.starts_with("An aid vessel"));
        assert!(article.word_count > 0);
    }

    #[tokio::test]
    async fn test_extract_never_fails_on_unreachable_pages() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let article = extractor_without_browser()
            .extract(&format!("{}/gone", server.url()))
            .await;

        assert!(article.content.is_empty());
        assert_eq!(article.word_count, 0);
    }
}
