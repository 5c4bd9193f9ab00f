//! Pending `!seen` lookups correlated with NickServ notices.
//!
//! `!seen` fires an `INFO <nick>` query at NickServ and the answer arrives
//! later as a private notice with no correlation token. Lookups wait in a
//! FIFO queue; the next matching notice resolves the oldest entry still
//! inside the expiry window, which lines up with NickServ answering queries
//! in the order they were made.

use std::{
    collections::VecDeque,
    sync::{LazyLock, Mutex},
    time::{Duration, Instant},
};

use {regex::Regex, tracing::debug};

/// How long a pending lookup stays eligible for a NickServ answer.
pub const LOOKUP_EXPIRY: Duration = Duration::from_secs(60);

/// The `User seen : <info>` line inside a NickServ INFO response.
static SEEN_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"User seen\s+:\s+(.+)").ok());

/// A resolved lookup: where to reply and what to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenReply {
    pub channel: String,
    pub text: String,
}

#[derive(Debug)]
struct PendingLookup {
    requester: String,
    channel: String,
    target: String,
    issued_at: Instant,
}

/// FIFO queue of outstanding `!seen` lookups.
///
/// Shared between the `!seen` handler and the notice path, so the queue
/// sits behind a `Mutex`; both sides only ever hold `&self`.
#[derive(Debug)]
pub struct SeenTracker {
    pending: Mutex<VecDeque<PendingLookup>>,
    expiry: Duration,
}

impl SeenTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_expiry(LOOKUP_EXPIRY)
    }

    #[must_use]
    pub fn with_expiry(expiry: Duration) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            expiry,
        }
    }

    /// Record a lookup issued on `target` so the next NickServ answer can be
    /// routed back to `requester` in `channel`.
    ///
    /// Targets are stored lowercased; that is how the reply names them.
    pub fn begin(&self, requester: &str, channel: &str, target: &str) {
        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        pending.push_back(PendingLookup {
            requester: requester.to_string(),
            channel: channel.to_string(),
            target: target.to_ascii_lowercase(),
            issued_at: Instant::now(),
        });
    }

    /// Match a NickServ notice against the oldest live lookup.
    ///
    /// Notices that are not `User seen` lines resolve nothing and leave the
    /// queue untouched. Expired entries are discarded before matching.
    pub fn resolve(&self, notice: &str) -> Option<SeenReply> {
        let info = parse_seen_info(notice)?;
        let mut pending = self.pending.lock().ok()?;
        while pending
            .front()
            .is_some_and(|lookup| lookup.issued_at.elapsed() > self.expiry)
        {
            if let Some(stale) = pending.pop_front() {
                debug!(nick = %stale.target, "dropping expired seen lookup");
            }
        }
        let lookup = pending.pop_front()?;
        Some(SeenReply {
            channel: lookup.channel,
            text: format!(
                "{}: {} was last seen {}",
                lookup.requester, lookup.target, info
            ),
        })
    }
}

impl Default for SeenTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// The seen info from a notice, parentheses removed.
fn parse_seen_info(notice: &str) -> Option<String> {
    let re = SEEN_RE.as_ref()?;
    let caps = re.captures(notice)?;
    Some(caps.get(1)?.as_str().replace(['(', ')'], ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTICE: &str = "User seen  : Aug 20 14:02:11 2026 (3 days, 4 hours ago)";

    #[test]
    fn resolves_oldest_pending_lookup() {
        let tracker = SeenTracker::new();
        tracker.begin("alice", "#rust", "SomeNick");

        let reply = tracker.resolve(NOTICE).unwrap();
        assert_eq!(reply.channel, "#rust");
        assert_eq!(
            reply.text,
            "alice: somenick was last seen Aug 20 14:02:11 2026 3 days, 4 hours ago"
        );
    }

    #[test]
    fn lookups_resolve_in_request_order() {
        let tracker = SeenTracker::new();
        tracker.begin("alice", "#a", "first");
        tracker.begin("bob", "#b", "second");

        let reply = tracker.resolve(NOTICE).unwrap();
        assert!(reply.text.starts_with("alice: first"));

        let reply = tracker.resolve(NOTICE).unwrap();
        assert_eq!(reply.channel, "#b");
        assert!(reply.text.starts_with("bob: second"));

        assert!(tracker.resolve(NOTICE).is_none());
    }

    #[test]
    fn unrelated_notice_leaves_queue_untouched() {
        let tracker = SeenTracker::new();
        tracker.begin("alice", "#rust", "nick");

        assert!(tracker.resolve("Registered : Jan 01 2020").is_none());
        assert!(tracker.resolve(NOTICE).is_some());
    }

    #[test]
    fn expired_lookups_are_dropped() {
        let tracker = SeenTracker::with_expiry(Duration::ZERO);
        tracker.begin("alice", "#rust", "nick");
        std::thread::sleep(Duration::from_millis(5));

        assert!(tracker.resolve(NOTICE).is_none());
    }

    #[test]
    fn empty_queue_resolves_nothing() {
        assert!(SeenTracker::new().resolve(NOTICE).is_none());
    }
}
