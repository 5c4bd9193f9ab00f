use serde::{Deserialize, Serialize};

/// Events the transport delivers to the agent.
///
/// The agent processes these one at a time, in arrival order; a slow handler
/// delays everything behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Public message in a joined channel.
    ChannelMessage {
        sender: String,
        channel: String,
        text: String,
    },
    /// Private notice from a service or user (NickServ and friends).
    PrivateNotice { sender: String, text: String },
}

impl InboundEvent {
    /// The nick that produced the event.
    pub fn sender(&self) -> &str {
        match self {
            Self::ChannelMessage { sender, .. } | Self::PrivateNotice { sender, .. } => sender,
        }
    }
}
