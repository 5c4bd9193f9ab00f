/// Errors from the financial fetch-and-parse handlers.
///
/// Display strings surface directly in command replies, so they name the
/// upstream host and the symbol rather than internal detail.
#[derive(Debug, thiserror::Error)]
pub enum MarketsError {
    /// Upstream answered with a non-success status.
    #[error("{host} returned HTTP {status}")]
    Status { host: String, status: u16 },

    /// The request never completed (DNS, connect, timeout).
    #[error("request to {host} failed: {reason}")]
    Fetch { host: String, reason: String },

    /// The response arrived but did not contain what was asked for.
    #[error("no {field} data for {symbol}")]
    MissingData { symbol: String, field: String },

    /// The quote API reported a lookup failure of its own.
    #[error("{0}")]
    Api(String),

    /// `!convert` is unusable without a configured key.
    #[error("exchange rate API key not configured")]
    NoApiKey,

    /// Response body could not be decoded.
    #[error("malformed payload from {host}: {reason}")]
    Payload { host: String, reason: String },

    /// HTTP client construction failed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl MarketsError {
    #[must_use]
    pub fn status(host: impl Into<String>, status: u16) -> Self {
        Self::Status {
            host: host.into(),
            status,
        }
    }

    #[must_use]
    pub fn fetch(host: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn missing(symbol: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingData {
            symbol: symbol.into(),
            field: field.into(),
        }
    }

    #[must_use]
    pub fn payload(host: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Payload {
            host: host.into(),
            reason: reason.to_string(),
        }
    }
}
