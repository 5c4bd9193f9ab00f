//! Transport boundary for the agent.
//!
//! The messaging protocol itself (connection, SASL, channel join, keep-alive)
//! lives outside this workspace. A transport implements [`Outbound`] for
//! delivery and feeds the agent a stream of [`InboundEvent`]s; everything the
//! agent does is expressed against those two seams.

pub mod error;
pub mod events;
pub mod outbound;

pub use {
    error::{ChannelError, Result},
    events::InboundEvent,
    outbound::Outbound,
};
