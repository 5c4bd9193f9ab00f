//! URL detection, permalink rewriting, and the preview pipeline driver.
//!
//! Channel messages without a command sentinel are scanned for URLs; each
//! one is rewritten if it is a micro-blog status permalink, pre-checked with
//! a plain title fetch when it points at a wire service, and otherwise run
//! through the isolated browser pipeline. Every URL resolves to exactly one
//! channel message.

use std::{path::PathBuf, sync::LazyLock, time::Duration};

use {regex::Regex, reqwest::Client, tracing::debug, url::Url};

use {
    unfurl_config::PreviewConfig,
    unfurl_format::strip_newlines,
    unfurl_preview::{ExtractOptions, PreviewRequest, PreviewResult, fetch, run_isolated},
};

use crate::error::DispatchError;

/// Budget for the wire-service title fetch, well under the browser budget.
const WIRE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// URL-shaped substrings inside a channel message.
static URL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"https?://[^\s]+").ok());

/// Micro-blog hostnames replaced by the fixed-up mirror.
static MIRROR_HOST_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:x|twitter|xcancel)\.com").ok());

/// Every URL in `text`, in order of appearance.
#[must_use]
pub fn scan_urls(text: &str) -> Vec<String> {
    let Some(re) = URL_RE.as_ref() else {
        return Vec::new();
    };
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Rewrite micro-blog status permalinks to the fixed-up mirror host.
///
/// `x.com`, `twitter.com` and `xcancel.com` links with `/status/` in the
/// path move to `fixupx.com`, which serves previewable Open Graph markup.
/// Everything else passes through unchanged.
#[must_use]
pub fn rewrite_permalink(url: &str) -> String {
    if !url.contains("/status/") || !is_micro_blog(url) {
        return url.to_string();
    }
    let Some(re) = MIRROR_HOST_RE.as_ref() else {
        return url.to_string();
    };
    re.replace_all(url, "fixupx.com")
        .replace("vxfixupx.com", "fixupx.com")
}

fn is_micro_blog(url: &str) -> bool {
    url.contains("twitter.com")
        || url.contains("xcancel.com")
        || url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .is_some_and(|rest| rest.starts_with("x.com"))
}

fn wire_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

/// [`ExtractOptions`] from the `[preview]` config section.
#[must_use]
pub fn extract_options(preview: &PreviewConfig) -> ExtractOptions {
    ExtractOptions {
        headless: preview.headless,
        chrome_path: preview.chrome_path.clone(),
        user_agent: preview.user_agent.clone(),
        locale: preview.locale.clone(),
        timezone: preview.timezone.clone(),
        nav_timeout: Duration::from_millis(preview.nav_timeout_ms),
        rule_wait: Duration::from_millis(preview.rule_wait_ms),
        artifact_dir: PathBuf::from(&preview.artifact_dir),
    }
}

/// Turns one detected URL into one channel message.
pub struct LinkPreviewer {
    options: ExtractOptions,
    budget: Duration,
    wire_client: Client,
    wire_hosts: Vec<String>,
}

impl LinkPreviewer {
    pub fn new(preview: &PreviewConfig) -> Result<Self, DispatchError> {
        let wire_client = fetch::client(&preview.user_agent, WIRE_FETCH_TIMEOUT)?;
        Ok(Self {
            options: extract_options(preview),
            budget: Duration::from_millis(preview.budget_ms),
            wire_client,
            wire_hosts: vec!["reuters.com".to_string()],
        })
    }

    /// Replace the wire-service host list. Tests point it at a local server.
    #[must_use]
    pub fn with_wire_hosts(mut self, hosts: Vec<String>) -> Self {
        self.wire_hosts = hosts;
        self
    }

    /// Produce the preview message for one URL.
    ///
    /// Wire-service pages are tried with a plain title fetch first; any
    /// pre-check failure falls through to the browser pipeline.
    pub async fn preview(&self, url: &str, origin_channel: &str) -> String {
        let url = rewrite_permalink(url);
        if self.wire_hosts.iter().any(|h| *h == wire_host(&url)) {
            match fetch::fetch_page_title(&self.wire_client, &url).await {
                Ok(Some(title)) => return format!("[ {title} ]"),
                Ok(None) => debug!(url = %url, "wire-service page had no title, using the browser"),
                Err(error) => {
                    debug!(%error, url = %url, "wire-service fetch failed, using the browser");
                },
            }
        }

        let request = PreviewRequest::new(url.clone(), origin_channel);
        let result = run_isolated(&request, self.options.clone(), self.budget).await;
        pipeline_message(&url, result)
    }
}

fn pipeline_message(url: &str, result: PreviewResult) -> String {
    match result {
        PreviewResult::Success { text } => strip_newlines(&text),
        PreviewResult::TimedOut => format!("Timeout processing {url}"),
        PreviewResult::Failed { reason } => format!("Error processing {url}: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn scan_finds_urls_in_order() {
        let urls = scan_urls("see https://a.example/one and http://b.example/two?q=1 now");
        assert_eq!(urls, vec![
            "https://a.example/one".to_string(),
            "http://b.example/two?q=1".to_string(),
        ]);
    }

    #[test]
    fn scan_ignores_plain_text() {
        assert!(scan_urls("nothing to see here").is_empty());
    }

    #[rstest]
    #[case(
        "https://x.com/user/status/123",
        "https://fixupx.com/user/status/123"
    )]
    #[case(
        "https://twitter.com/user/status/123",
        "https://fixupx.com/user/status/123"
    )]
    #[case(
        "https://www.twitter.com/user/status/123",
        "https://www.fixupx.com/user/status/123"
    )]
    #[case(
        "https://xcancel.com/user/status/9",
        "https://fixupx.com/user/status/9"
    )]
    #[case(
        "https://vxtwitter.com/user/status/1",
        "https://fixupx.com/user/status/1"
    )]
    #[case("http://x.com/a/status/1", "http://fixupx.com/a/status/1")]
    fn status_permalinks_move_to_the_mirror(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(rewrite_permalink(input), expected);
    }

    #[rstest]
    #[case("https://x.com/user")]
    #[case("https://twitter.com/user")]
    #[case("https://example.com/status/5")]
    #[case("https://maxcom.example/status/5")]
    fn other_links_pass_through(#[case] input: &str) {
        assert_eq!(rewrite_permalink(input), input);
    }

    #[test]
    fn wire_host_drops_scheme_port_and_www() {
        assert_eq!(wire_host("https://www.reuters.com/world/x/"), "reuters.com");
        assert_eq!(wire_host("http://127.0.0.1:8080/story"), "127.0.0.1");
        assert_eq!(wire_host("not a url"), "");
    }

    #[test]
    fn pipeline_outcomes_map_to_one_message() {
        assert_eq!(
            pipeline_message("https://a.example", PreviewResult::Success {
                text: "[ Title:\nrest ]".to_string()
            }),
            "[ Title:rest ]"
        );
        assert_eq!(
            pipeline_message("https://a.example", PreviewResult::TimedOut),
            "Timeout processing https://a.example"
        );
        assert_eq!(
            pipeline_message("https://a.example", PreviewResult::Failed {
                reason: "no browser".to_string()
            }),
            "Error processing https://a.example: no browser"
        );
    }

    #[tokio::test]
    async fn wire_service_link_resolves_without_a_browser() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/world/markets")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><head><title>Markets rally</title></head></html>")
            .create_async()
            .await;

        let previewer = LinkPreviewer::new(&PreviewConfig::default())
            .unwrap()
            .with_wire_hosts(vec!["127.0.0.1".to_string()]);
        let url = format!("{}/world/markets", server.url());

        assert_eq!(previewer.preview(&url, "#finance").await, "[ Markets rally ]");
    }
}
