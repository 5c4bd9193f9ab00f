//! Command routing and the agent event loop.
//!
//! Inbound channel messages are either command-shaped (a `!` or dot trigger,
//! dispatched through the [`Router`] to a [`CommandHandler`]) or scanned for
//! URLs and fed one at a time to the link-preview pipeline. NickServ notices
//! resolve pending `!seen` lookups. The [`Agent`] ties the three paths to
//! the transport's outbound seam.

pub mod agent;
pub mod commands;
pub mod error;
pub mod router;
pub mod seen;
pub mod urls;

pub use {
    agent::Agent,
    commands::standard_router,
    error::DispatchError,
    router::{CommandHandler, CommandRequest, Reply, Router, command_trigger},
    seen::{SeenReply, SeenTracker},
    urls::{LinkPreviewer, extract_options, rewrite_permalink, scan_urls},
};
