//! Trigger detection and the command dispatch table.
//!
//! The router owns an immutable map from trigger token to handler, built
//! once at startup. Lookup is exact and case-sensitive on the first
//! whitespace-delimited token; handler errors are contained here and turned
//! into a single error reply, never a crash.

use std::{collections::HashMap, sync::Arc};

use {
    async_trait::async_trait,
    tracing::{debug, error, warn},
};

/// One command invocation: who asked, where, and the text after the trigger.
#[derive(Debug, Clone, Copy)]
pub struct CommandRequest<'a> {
    pub sender: &'a str,
    pub channel: &'a str,
    /// Message text after the trigger token, trimmed.
    pub args: &'a str,
}

/// One outgoing message produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Deliver to the channel the command came from.
    Channel(String),
    /// Deliver directly to a nick (service queries).
    Direct { nick: String, text: String },
}

/// A command implementation behind a trigger token.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>>;
}

/// Trigger-to-handler dispatch table.
#[derive(Default)]
pub struct Router {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler>>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `trigger`. Re-registering a trigger replaces
    /// the previous handler.
    pub fn register(&mut self, trigger: &'static str, handler: Arc<dyn CommandHandler>) {
        if self.handlers.insert(trigger, handler).is_some() {
            warn!(trigger, "replacing existing handler registration");
        }
    }

    #[must_use]
    pub fn is_registered(&self, trigger: &str) -> bool {
        self.handlers.contains_key(trigger)
    }

    /// Handle `text` if it is command-shaped.
    ///
    /// `None` means the message carries no command sentinel and the caller
    /// may scan it for URLs instead. `Some(vec![])` means it was a command
    /// message that produced nothing to say, unknown triggers included.
    pub async fn dispatch(&self, sender: &str, channel: &str, text: &str) -> Option<Vec<Reply>> {
        let trigger = command_trigger(text)?;
        let Some(handler) = self.handlers.get(trigger) else {
            debug!(trigger, channel, "no handler registered for trigger");
            return Some(Vec::new());
        };
        let args = text[trigger.len()..].trim();
        let request = CommandRequest {
            sender,
            channel,
            args,
        };
        match handler.handle(request).await {
            Ok(replies) => Some(replies),
            Err(e) => {
                error!(trigger, channel, error = %e, "command handler failed");
                Some(vec![Reply::Channel(format!("Error processing command: {e}"))])
            },
        }
    }
}

/// The trigger token of a command-shaped message.
///
/// A message is command-shaped when it starts with `!`, or with a dot
/// followed by a lowercase letter. The trigger is its first
/// whitespace-delimited token.
#[must_use]
pub fn command_trigger(text: &str) -> Option<&str> {
    let bang = text.starts_with('!');
    let dot = text.starts_with('.') && text[1..].starts_with(|c: char| c.is_ascii_lowercase());
    if !bang && !dot {
        return None;
    }
    text.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    struct Echo;

    #[async_trait]
    impl CommandHandler for Echo {
        async fn handle(&self, request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
            Ok(vec![Reply::Channel(format!(
                "{}|{}|{}",
                request.sender, request.channel, request.args
            ))])
        }
    }

    struct Boom;

    #[async_trait]
    impl CommandHandler for Boom {
        async fn handle(&self, _request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
            anyhow::bail!("boom")
        }
    }

    fn router() -> Router {
        let mut router = Router::new();
        router.register("!echo", Arc::new(Echo));
        router.register(".echo", Arc::new(Echo));
        router.register("!boom", Arc::new(Boom));
        router
    }

    #[rstest]
    #[case("!time", Some("!time"))]
    #[case("!quote AAPL", Some("!quote"))]
    #[case(".q AAPL", Some(".q"))]
    #[case(".markets", Some(".markets"))]
    #[case("!", Some("!"))]
    #[case(".Q AAPL", None)]
    #[case(". q", None)]
    #[case(".", None)]
    #[case("hello there", None)]
    #[case("https://example.com/a", None)]
    #[case("mid !quote is not a command", None)]
    fn trigger_detection(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(command_trigger(text), expected);
    }

    #[tokio::test]
    async fn known_trigger_invokes_handler_with_remainder() {
        let replies = router()
            .dispatch("alice", "#rust", "!echo   spaced args ")
            .await
            .unwrap();
        assert_eq!(replies, vec![Reply::Channel(
            "alice|#rust|spaced args".to_string()
        )]);
    }

    #[tokio::test]
    async fn dot_trigger_dispatches_like_bang() {
        let replies = router().dispatch("bob", "#a", ".echo hi").await.unwrap();
        assert_eq!(replies, vec![Reply::Channel("bob|#a|hi".to_string())]);
    }

    #[tokio::test]
    async fn unknown_trigger_is_consumed_silently() {
        let replies = router().dispatch("alice", "#rust", "!nope").await;
        assert_eq!(replies, Some(Vec::new()));
    }

    #[tokio::test]
    async fn plain_message_is_not_dispatched() {
        assert!(router().dispatch("alice", "#rust", "hello").await.is_none());
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let replies = router().dispatch("alice", "#rust", "!ECHO hi").await;
        assert_eq!(replies, Some(Vec::new()));
    }

    #[tokio::test]
    async fn handler_error_becomes_error_reply() {
        let replies = router().dispatch("alice", "#rust", "!boom").await.unwrap();
        assert_eq!(replies, vec![Reply::Channel(
            "Error processing command: boom".to_string()
        )]);
    }

    #[tokio::test]
    async fn reregistration_replaces_handler() {
        let mut router = router();
        router.register("!boom", Arc::new(Echo));
        let replies = router.dispatch("alice", "#rust", "!boom now").await.unwrap();
        assert_eq!(replies, vec![Reply::Channel("alice|#rust|now".to_string())]);
    }
}
