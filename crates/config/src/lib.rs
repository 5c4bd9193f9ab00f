//! Configuration schema and loading for unfurl.
//!
//! Config is discovered from `unfurl.{toml,yaml,yml,json}` in the working
//! directory, then the user config directory. String values support
//! `${ENV_VAR}` substitution.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, find_or_default_config_path, load_config, save_config},
    schema::{MarketsConfig, PreviewConfig, TransportConfig, UnfurlConfig},
};
