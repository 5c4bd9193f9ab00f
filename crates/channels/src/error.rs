use std::error::Error as StdError;

/// Crate-wide result type for transport operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Typed transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The payload exceeds the transport's line budget.
    #[error("message too long ({len} bytes)")]
    MessageTooLong { len: usize },

    /// The transport connection is gone.
    #[error("transport closed")]
    Closed,

    /// Delivery failed for a transport-specific reason.
    #[error("delivery failed: {context}: {source}")]
    Delivery {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ChannelError {
    #[must_use]
    pub fn delivery(
        context: impl std::fmt::Display,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Delivery {
            context: context.to_string(),
            source: Box::new(source),
        }
    }
}
