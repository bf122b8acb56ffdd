//! Blocking HTTP fetch for external stylesheets.

use std::time::Duration;

/// User-Agent header sent with stylesheet requests. Mimics a common desktop
/// browser so CDN-hosted stylesheets do not reject the request outright.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetch a stylesheet URL and return its body as text.
///
/// A hung remote server is bounded by `timeout`; non-success statuses are
/// treated as failures so an error page never ends up concatenated into the
/// collected CSS.
pub(crate) fn fetch_text(url: &str, timeout: Duration) -> Result<String, String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("failed to create HTTP client: {e}"))?;

    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .map_err(|e| format!("request failed: {e}"))?;

    if !response.status().is_success() {
        return Err(format!("HTTP error: {}", response.status()));
    }

    response
        .text()
        .map_err(|e| format!("failed to read response body: {e}"))
}

/// `true` when an href should be fetched over the network rather than read
/// from disk.
pub(crate) fn is_remote_href(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
