//! Headless-browser rendering for pages that only produce their article
//! text after scripts run.
//!
//! Each render is a short-lived `chromium --dump-dom` subprocess: spawn,
//! await with a hard timeout, read the serialized DOM from stdout. The
//! process is killed if the timeout fires, and a one-permit semaphore keeps
//! renders strictly serialized, so no browser handle can outlive or overlap
//! an extraction.

use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

/// Wall-clock ceiling for one page render.
const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Virtual-time budget given to the page so network activity can settle
/// before the DOM is dumped.
const SETTLE_BUDGET_MS: u32 = 5000;

/// Serialized access to a headless Chromium binary.
pub struct ChromeRenderer {
    binary: String,
    permit: Semaphore,
}

impl ChromeRenderer {
    /// Build a renderer using `CHROME_BIN` or the `chromium` on PATH.
    ///
    /// The binary is not probed here; a missing binary surfaces as a failed
    /// spawn on first use and the extractor falls through to its next stage.
    pub fn from_env() -> Self {
        let binary = std::env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string());
        Self::with_binary(binary)
    }

    pub(crate) fn with_binary(binary: String) -> Self {
        Self {
            binary,
            permit: Semaphore::new(1),
        }
    }

    /// Render `url` and return the post-script DOM, or `None` on any failure.
    pub async fn render(&self, url: &str) -> Option<String> {
        // Only http(s) targets may reach the browser command line.
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            _ => {
                debug!(url, "refusing to render non-http url");
                return None;
            }
        }

        let _permit = self.permit.acquire().await.ok()?;

        let profile_dir =
            std::env::temp_dir().join(format!("flotilla-watch-render-{}", std::process::id()));
        let profile_flag = format!("--user-data-dir={}", profile_dir.display());
        let budget_flag = format!("--virtual-time-budget={SETTLE_BUDGET_MS}");

        let result = tokio::time::timeout(
            RENDER_TIMEOUT,
            tokio::process::Command::new(&self.binary)
                .args([
                    "--headless",
                    "--no-sandbox",
                    "--disable-gpu",
                    "--disable-dev-shm-usage",
                    profile_flag.as_str(),
                    budget_flag.as_str(),
                    "--dump-dom",
                    url,
                ])
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => {
                let dom = String::from_utf8_lossy(&output.stdout).into_owned();
                if dom.is_empty() {
                    warn!(url, "renderer produced an empty DOM");
                    None
                } else {
                    debug!(url, bytes = dom.len(), "rendered page");
                    Some(dom)
                }
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(url, %stderr, "renderer exited with error");
                None
            }
            Ok(Err(e)) => {
                // Typically a missing binary; the raw-HTML stage takes over.
                debug!(url, error = %e, "renderer failed to launch");
                None
            }
            Err(_) => {
                warn!(url, timeout_secs = RENDER_TIMEOUT.as_secs(), "render timed out");
                None
            }
        }
    }
}
