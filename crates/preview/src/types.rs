//! Preview request/result types and worker tunables.

use std::{path::PathBuf, time::Duration};

/// Desktop Chrome user agent presented to every site the worker visits.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// One preview to produce: a URL and the channel that asked for it.
///
/// Created per detected URL, consumed once by the supervisor, then discarded.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub url: String,
    pub origin_channel: String,
}

impl PreviewRequest {
    #[must_use]
    pub fn new(url: impl Into<String>, origin_channel: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            origin_channel: origin_channel.into(),
        }
    }
}

/// Outcome of one preview request. Produced exactly once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewResult {
    Success { text: String },
    TimedOut,
    Failed { reason: String },
}

/// Tunables for a single extraction run.
///
/// Built from `[preview]` config by the caller; the defaults here match the
/// shipped config defaults so one-shot CLI runs work without a config file.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Explicit Chromium executable, overriding detection.
    pub chrome_path: Option<String>,
    /// User agent for both the browser and the raw-fetch fallback.
    pub user_agent: String,
    /// BCP 47 language tag advertised to pages.
    pub locale: String,
    /// IANA timezone the page clock reports.
    pub timezone: String,
    /// Budget for initial navigation before falling back to a raw fetch.
    pub nav_timeout: Duration,
    /// Budget for each site rule's selector wait.
    pub rule_wait: Duration,
    /// Where `screenshot.png` and `html.txt` are written after a success.
    pub artifact_dir: PathBuf,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            locale: "en-GB".to_string(),
            timezone: "Europe/Paris".to_string(),
            nav_timeout: Duration::from_secs(10),
            rule_wait: Duration::from_secs(15),
            artifact_dir: PathBuf::from("."),
        }
    }
}
