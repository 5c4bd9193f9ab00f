//! Financial fetch-and-parse for the command handlers.
//!
//! Everything here is stateless request/scrape/format: CNBC quote strips for
//! the index, bond, oil and currency summaries, Yahoo Finance quoteSummary
//! for `!quote` and `.t`, the coinmarketcap front page for `.crypto`,
//! exchangerate-api.com for `!convert`, and finviz headlines (with an Ollama
//! summarizer behind the [`Summarizer`] trait) for `!news`.
//!
//! Handlers share one browser-impersonating [`reqwest::Client`]; each site
//! client takes an injectable base URL so tests run against a local server.

pub mod client;
pub mod cnbc;
pub mod convert;
pub mod crypto;
pub mod error;
pub mod news;
pub mod summarize;
pub mod yahoo;

pub use {
    client::{BROWSER_USER_AGENT, browser_client},
    cnbc::CnbcQuotes,
    convert::ExchangeRates,
    crypto::CoinMarketCap,
    error::MarketsError,
    news::{FinvizNews, NewsItem},
    summarize::{OllamaSummarizer, SUMMARY_PROMPT, Summarizer},
    yahoo::{TickerInfo, YahooFinance},
};
