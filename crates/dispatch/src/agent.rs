//! The agent event loop: inbound events in, channel messages out.
//!
//! One event is fully processed before the next is read, so a slow link
//! preview delays everything behind it; the isolation supervisor bounds how
//! long that can last. Messages with a command sentinel go to the router
//! and are never URL-scanned, even when the trigger is unknown.

use std::sync::Arc;

use {
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

use unfurl_channels::{ChannelError, InboundEvent, Outbound};

use crate::{
    router::{Reply, Router},
    seen::SeenTracker,
    urls::{LinkPreviewer, scan_urls},
};

/// The relay agent. Owns the dispatch table, the preview pipeline, and the
/// outbound side of the transport.
pub struct Agent {
    router: Router,
    links: LinkPreviewer,
    seen: Arc<SeenTracker>,
    outbound: Arc<dyn Outbound>,
}

impl Agent {
    #[must_use]
    pub fn new(
        router: Router,
        links: LinkPreviewer,
        seen: Arc<SeenTracker>,
        outbound: Arc<dyn Outbound>,
    ) -> Self {
        Self {
            router,
            links,
            seen,
            outbound,
        }
    }

    /// Drain inbound events until the transport closes the channel.
    pub async fn run(&self, mut events: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        debug!("inbound event channel closed");
    }

    /// Process one inbound event to completion.
    pub async fn handle_event(&self, event: InboundEvent) {
        match event {
            InboundEvent::ChannelMessage {
                sender,
                channel,
                text,
            } => self.on_channel_message(&sender, &channel, &text).await,
            InboundEvent::PrivateNotice { sender, text } => {
                self.on_private_notice(&sender, &text).await;
            },
        }
    }

    async fn on_channel_message(&self, sender: &str, channel: &str, text: &str) {
        if let Some(replies) = self.router.dispatch(sender, channel, text).await {
            for reply in replies {
                match reply {
                    Reply::Channel(text) => self.deliver(channel, &text).await,
                    Reply::Direct { nick, text } => self.deliver(&nick, &text).await,
                }
            }
            return;
        }

        for url in scan_urls(text) {
            let message = self.links.preview(&url, channel).await;
            self.deliver(channel, &message).await;
        }
    }

    /// NickServ notices resolve pending `!seen` lookups; everything else is
    /// ignored.
    async fn on_private_notice(&self, sender: &str, text: &str) {
        if !sender.eq_ignore_ascii_case("nickserv") {
            return;
        }
        if let Some(reply) = self.seen.resolve(text) {
            self.deliver(&reply.channel, &reply.text).await;
        }
    }

    async fn deliver(&self, target: &str, text: &str) {
        match self.outbound.deliver(target, text).await {
            Ok(()) => {},
            Err(ChannelError::MessageTooLong { len }) => {
                debug!(len, target, "reply exceeded the transport limit");
                let notice = format!("Message too long: {len} bytes");
                if let Err(error) = self.outbound.deliver(target, &notice).await {
                    warn!(%error, target, "failed to deliver oversize notice");
                }
            },
            Err(error) => warn!(%error, target, "failed to deliver reply"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use {
        async_trait::async_trait,
        unfurl_config::{MarketsConfig, PreviewConfig},
    };

    use {super::*, crate::commands::standard_router};

    #[derive(Default)]
    struct RecordingOutbound {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingOutbound {
        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Outbound for RecordingOutbound {
        async fn deliver(&self, target: &str, text: &str) -> unfurl_channels::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((target.to_string(), text.to_string()));
            Ok(())
        }
    }

    /// Rejects the first delivery as oversize, then records normally.
    #[derive(Default)]
    struct OversizeOnce {
        inner: RecordingOutbound,
        tripped: Mutex<bool>,
    }

    #[async_trait]
    impl Outbound for OversizeOnce {
        async fn deliver(&self, target: &str, text: &str) -> unfurl_channels::Result<()> {
            {
                let mut tripped = self.tripped.lock().unwrap();
                if !*tripped {
                    *tripped = true;
                    return Err(ChannelError::MessageTooLong { len: 480 });
                }
            }
            self.inner.deliver(target, text).await
        }
    }

    fn agent(outbound: Arc<dyn Outbound>) -> Agent {
        let tracker = Arc::new(SeenTracker::new());
        let router = standard_router(&MarketsConfig::default(), tracker.clone()).unwrap();
        let links = LinkPreviewer::new(&PreviewConfig::default()).unwrap();
        Agent::new(router, links, tracker, outbound)
    }

    fn message(text: &str) -> InboundEvent {
        InboundEvent::ChannelMessage {
            sender: "alice".to_string(),
            channel: "#finance".to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn command_reply_goes_to_the_origin_channel() {
        let outbound = Arc::new(RecordingOutbound::default());
        agent(outbound.clone()).handle_event(message("!time")).await;

        let sent = outbound.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "#finance");
        assert!(sent[0].1.starts_with("Current time: "), "{}", sent[0].1);
    }

    #[tokio::test]
    async fn seen_lookup_round_trips_through_nickserv() {
        let outbound = Arc::new(RecordingOutbound::default());
        let agent = agent(outbound.clone());

        agent.handle_event(message("!seen Bob")).await;
        assert_eq!(outbound.sent(), vec![(
            "NickServ".to_string(),
            "INFO Bob".to_string()
        )]);

        agent
            .handle_event(InboundEvent::PrivateNotice {
                sender: "NickServ".to_string(),
                text: "User seen  : Aug 22 09:15:00 2026 (4 days ago)".to_string(),
            })
            .await;
        let sent = outbound.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], (
            "#finance".to_string(),
            "alice: bob was last seen Aug 22 09:15:00 2026 4 days ago".to_string()
        ));
    }

    #[tokio::test]
    async fn notices_from_other_services_are_ignored() {
        let outbound = Arc::new(RecordingOutbound::default());
        agent(outbound.clone())
            .handle_event(InboundEvent::PrivateNotice {
                sender: "ChanServ".to_string(),
                text: "User seen  : yesterday".to_string(),
            })
            .await;
        assert!(outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_command_suppresses_url_scanning() {
        let outbound = Arc::new(RecordingOutbound::default());
        agent(outbound.clone())
            .handle_event(message("!nope check https://example.com/x"))
            .await;
        assert!(outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn plain_chatter_produces_nothing() {
        let outbound = Arc::new(RecordingOutbound::default());
        agent(outbound.clone())
            .handle_event(message("morning all"))
            .await;
        assert!(outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn wire_service_url_is_previewed_inline() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/world/story")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><head><title>Ceasefire holds</title></head></html>")
            .create_async()
            .await;

        let outbound = Arc::new(RecordingOutbound::default());
        let tracker = Arc::new(SeenTracker::new());
        let router = standard_router(&MarketsConfig::default(), tracker.clone()).unwrap();
        let links = LinkPreviewer::new(&PreviewConfig::default())
            .unwrap()
            .with_wire_hosts(vec!["127.0.0.1".to_string()]);
        let agent = Agent::new(router, links, tracker, outbound.clone());

        let url = format!("{}/world/story", server.url());
        agent.handle_event(message(&format!("read {url} later"))).await;

        assert_eq!(outbound.sent(), vec![(
            "#finance".to_string(),
            "[ Ceasefire holds ]".to_string()
        )]);
    }

    #[tokio::test]
    async fn oversize_reply_reports_its_length() {
        let outbound = Arc::new(OversizeOnce::default());
        agent(outbound.clone()).handle_event(message("!time")).await;

        assert_eq!(outbound.inner.sent(), vec![(
            "#finance".to_string(),
            "Message too long: 480 bytes".to_string()
        )]);
    }

    #[tokio::test]
    async fn run_drains_the_event_channel() {
        let outbound = Arc::new(RecordingOutbound::default());
        let agent = Arc::new(agent(outbound.clone()));
        let (tx, rx) = mpsc::channel(8);

        let worker = tokio::spawn({
            let agent = agent.clone();
            async move { agent.run(rx).await }
        });
        tx.send(message("!time")).await.unwrap();
        drop(tx);
        worker.await.unwrap();

        assert_eq!(outbound.sent().len(), 1);
    }
}
