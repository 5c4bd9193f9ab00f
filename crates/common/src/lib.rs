//! Error-context plumbing shared by the unfurl crates.
//!
//! Each crate keeps its own error enum; implementing [`FromMessage`] for it
//! and invoking [`impl_context!`] in the same module yields a crate-local
//! `Context` trait for attaching messages to `Result` and `Option` chains.

pub mod error;

pub use error::FromMessage;
