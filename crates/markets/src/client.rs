//! Shared HTTP client for the financial handlers.
//!
//! Quote pages and news sites serve different markup (or a block page) to
//! obvious bots, so every request goes out under a desktop browser
//! user-agent. One client is built at startup and cloned into each handler;
//! `reqwest::Client` is an `Arc` internally.

use std::time::Duration;

use crate::error::MarketsError;

/// Desktop Chrome user-agent presented to quote and news sites.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

/// Per-request ceiling; a stuck upstream must not stall the command loop.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the browser-impersonating client used by all market handlers.
pub fn browser_client() -> Result<reqwest::Client, MarketsError> {
    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| MarketsError::Client(e.to_string()))
}
