use async_trait::async_trait;

use crate::error::Result;

/// Capability to deliver text back through the transport.
///
/// `target` is a channel name (`#chan`) or a nickname for direct messages.
/// Callers are responsible for keeping `text` within the transport's payload
/// budget; long bodies are split before delivery, not here.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn deliver(&self, target: &str, text: &str) -> Result<()>;
}
