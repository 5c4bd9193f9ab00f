//! Extraction error types.

use {thiserror::Error, unfurl_common::FromMessage};

/// Errors that can occur while extracting a link preview.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("browser not available: Chrome/Chromium not found")]
    BrowserNotAvailable,

    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("navigation failed for {url}: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("selector did not appear within {0}ms")]
    SelectorTimeout(u64),

    #[error("JavaScript evaluation failed: {0}")]
    JsEvalFailed(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("document inspection failed: {0}")]
    Document(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExtractError {
    #[must_use]
    pub fn navigation(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NavigationFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

impl From<chromiumoxide::error::CdpError> for ExtractError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ExtractError::Cdp(err.to_string())
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        ExtractError::Fetch(err.to_string())
    }
}

// Plain-message failures land in `Document`; the probes in `document.rs`
// are the only producers.
impl FromMessage for ExtractError {
    fn from_message(message: String) -> Self {
        Self::Document(message)
    }
}

unfurl_common::impl_context!(ExtractError);
