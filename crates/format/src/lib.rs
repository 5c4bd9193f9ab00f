//! Outgoing-text shaping: mIRC color markup, byte-budget truncation and
//! splitting, compact number rendering.
//!
//! Everything here is pure string code; the transport's 512-byte line limit
//! (roughly 450 bytes of usable payload once the envelope is counted) drives
//! the byte budgets.

pub mod color;
pub mod number;
pub mod split;

pub use {
    color::{GREEN, RED, RESET, paint, paint_change, paint_change_strict, signed_colored},
    number::compact_number,
    split::{cap_with_ellipsis, split_message, strip_newlines, truncate_to_bytes},
};
