//! Link-preview extraction pipeline.
//!
//! Given a URL, drive a fresh headless Chromium through navigation (with an
//! unrendered-fetch fallback), classify the content type, apply per-site
//! heuristics, and return one short preview message. The whole run happens
//! inside an isolated, hard-budgeted supervisor task so hangs and crashes in
//! the browser engine cost one reply, not the process.
//!
//! # Example
//!
//! ```ignore
//! use unfurl_preview::{ExtractOptions, PreviewRequest, run_isolated};
//!
//! let request = PreviewRequest::new("https://example.com", "#general");
//! let result = run_isolated(
//!     &request,
//!     ExtractOptions::default(),
//!     std::time::Duration::from_secs(60),
//! )
//! .await;
//! ```

pub mod detect;
pub mod document;
pub mod error;
pub mod fetch;
pub mod probe;
pub mod rules;
pub mod stealth;
pub mod supervisor;
pub mod types;
pub mod worker;

pub use {
    error::ExtractError,
    supervisor::{run_isolated, supervise},
    types::{DEFAULT_USER_AGENT, ExtractOptions, PreviewRequest, PreviewResult},
};
