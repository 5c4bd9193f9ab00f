use {thiserror::Error, unfurl_markets::MarketsError, unfurl_preview::ExtractError};

/// Failures wiring the router and the preview pipeline at startup.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Markets(#[from] MarketsError),

    #[error(transparent)]
    Preview(#[from] ExtractError),
}
