//! JSON artifact writing for the classifier hand-off.
//!
//! The whole run is serialized as one pretty-printed JSON array so the
//! classification service (and anyone debugging a run) can read it without
//! tooling.

use crate::models::ActivistSearchResult;
use chrono::Local;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write the run's results as a pretty-printed JSON artifact.
///
/// The filename carries the run date, `scraped-news-YYYY-MM-DD.json`, so a
/// re-run on the same day replaces the earlier artifact. The output
/// directory must already exist.
///
/// # Arguments
///
/// * `results` - One entry per processed activist
/// * `output_dir` - Directory the artifact is written into
///
/// # Returns
///
/// The path of the written artifact, or an error if serialization fails or
/// the file cannot be written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_results(
    results: &[ActivistSearchResult],
    output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(results)?;
    let filename = format!("scraped-news-{}.json", Local::now().format("%Y-%m-%d"));
    let path = Path::new(output_dir).join(filename);
    let path_display = path.display().to_string();

    if let Err(e) = fs::write(&path, json).await {
        error!(path = %path_display, error = %e, "Failed to write results artifact");
        return Err(e.into());
    }
    info!(path = %path_display, results = results.len(), "Wrote results artifact");

    Ok(path_display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsResult;

    fn sample_result(id: &str) -> ActivistSearchResult {
        ActivistSearchResult {
            activistId: id.to_string(),
            activistName: "Maria Walsh".to_string(),
            nationality: "Irish".to_string(),
            boatName: "Hope".to_string(),
            newsResults: vec![NewsResult {
                title: "Activist released".to_string(),
                description: "Released after three days".to_string(),
                url: "https://example.com/story".to_string(),
                publishedAt: "2025-10-06T12:00:00Z".to_string(),
                source: "Reuters".to_string(),
            }],
            searchQueries: vec!["\"Maria Walsh\" detained released flotilla Gaza".to_string()],
        }
    }

    async fn temp_output_dir(tag: &str) -> String {
        let dir = std::env::temp_dir().join(format!(
            "flotilla-watch-json-{tag}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).await.unwrap();
        dir.display().to_string()
    }

    #[tokio::test]
    async fn test_write_results_creates_dated_artifact() {
        let dir = temp_output_dir("dated").await;

        let path = write_results(&[sample_result("act-1")], &dir).await.unwrap();

        assert!(path.contains("scraped-news-"));
        assert!(path.ends_with(".json"));
        let raw = fs::read_to_string(&path).await.unwrap();
        // Pretty-printed, not a single line.
        assert!(raw.contains('\n'));
        let parsed: Vec<ActivistSearchResult> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].activistId, "act-1");
        assert_eq!(parsed[0].newsResults[0].source, "Reuters");
    }

    #[tokio::test]
    async fn test_write_results_with_empty_run_still_writes_artifact() {
        let dir = temp_output_dir("empty").await;

        let path = write_results(&[], &dir).await.unwrap();

        let raw = fs::read_to_string(&path).await.unwrap();
        let parsed: Vec<ActivistSearchResult> = serde_json::from_str(&raw).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn test_write_results_fails_when_directory_is_missing() {
        let result = write_results(&[sample_result("act-1")], "/nonexistent/flotilla-watch").await;
        assert!(result.is_err());
    }
}
