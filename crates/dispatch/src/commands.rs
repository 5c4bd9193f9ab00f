//! Built-in command handlers and the standard trigger registry.
//!
//! Each handler owns the site client it needs; [`standard_router`] wires
//! them all to their triggers behind one shared browser-impersonating HTTP
//! client. Handlers reply through [`Reply`] values and signal failures with
//! `anyhow` errors, which the router turns into a single error line.

use std::sync::Arc;

use {anyhow::bail, async_trait::async_trait, secrecy::ExposeSecret, tracing::debug};

use {
    unfurl_config::MarketsConfig,
    unfurl_format::split_message,
    unfurl_markets::{
        CnbcQuotes, CoinMarketCap, ExchangeRates, FinvizNews, OllamaSummarizer, Summarizer,
        YahooFinance, browser_client,
    },
};

use crate::{
    error::DispatchError,
    router::{CommandHandler, CommandRequest, Reply, Router},
    seen::SeenTracker,
};

/// Transport payload ceiling for one part of a multi-part reply.
const MESSAGE_PART_BYTES: usize = 450;

/// First argument as a ticker symbol, tolerating a leading `$`.
fn ticker_arg(args: &str) -> anyhow::Result<&str> {
    let raw = args.split_whitespace().next().unwrap_or("");
    let ticker = raw.strip_prefix('$').unwrap_or(raw);
    if ticker.is_empty() {
        bail!("expected a ticker symbol");
    }
    Ok(ticker)
}

// ── Clock ───────────────────────────────────────────────────────────────────

/// `!time`: the agent host's wall clock.
pub struct TimeCommand;

#[async_trait]
impl CommandHandler for TimeCommand {
    async fn handle(&self, _request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        Ok(vec![Reply::Channel(format!("Current time: {now}"))])
    }
}

// ── NickServ lookups ────────────────────────────────────────────────────────

/// `!seen <nick>`: query NickServ and remember who asked.
pub struct SeenCommand {
    tracker: Arc<SeenTracker>,
}

impl SeenCommand {
    #[must_use]
    pub fn new(tracker: Arc<SeenTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl CommandHandler for SeenCommand {
    async fn handle(&self, request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
        let Some(target) = request.args.split_whitespace().next() else {
            bail!("expected a nickname");
        };
        self.tracker.begin(request.sender, request.channel, target);
        Ok(vec![Reply::Direct {
            nick: "NickServ".to_string(),
            text: format!("INFO {target}"),
        }])
    }
}

// ── Currency conversion ─────────────────────────────────────────────────────

/// `!convert <FROM> <TO>`: exchange-rate lookup.
pub struct ConvertCommand {
    rates: ExchangeRates,
}

impl ConvertCommand {
    #[must_use]
    pub fn new(rates: ExchangeRates) -> Self {
        Self { rates }
    }
}

#[async_trait]
impl CommandHandler for ConvertCommand {
    async fn handle(&self, request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
        let mut parts = request.args.split_whitespace();
        let (Some(from), Some(to)) = (parts.next(), parts.next()) else {
            bail!("expected <FROM> <TO> currency codes");
        };
        Ok(vec![Reply::Channel(self.rates.convert(from, to).await?)])
    }
}

// ── Ticker quotes ───────────────────────────────────────────────────────────

/// `!quote` / `.q <sym>`: one-line Yahoo Finance quote.
pub struct QuoteCommand {
    yahoo: YahooFinance,
}

impl QuoteCommand {
    #[must_use]
    pub fn new(yahoo: YahooFinance) -> Self {
        Self { yahoo }
    }
}

#[async_trait]
impl CommandHandler for QuoteCommand {
    async fn handle(&self, request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
        let ticker = ticker_arg(request.args)?;
        Ok(vec![Reply::Channel(self.yahoo.quote_line(ticker).await?)])
    }
}

/// `.t <sym>`: long business summary, split for the transport.
pub struct TickerSummaryCommand {
    yahoo: YahooFinance,
}

impl TickerSummaryCommand {
    #[must_use]
    pub fn new(yahoo: YahooFinance) -> Self {
        Self { yahoo }
    }
}

#[async_trait]
impl CommandHandler for TickerSummaryCommand {
    async fn handle(&self, request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
        let ticker = ticker_arg(request.args)?;
        let summary = self.yahoo.business_summary(ticker).await?;
        Ok(split_message(&summary, MESSAGE_PART_BYTES)
            .into_iter()
            .map(Reply::Channel)
            .collect())
    }
}

// ── CNBC quote strips ───────────────────────────────────────────────────────

/// Which CNBC quote set a trigger renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    Indices,
    Bonds,
    Oil,
    Currencies,
}

/// `.market` / `.bond` / `.oil` / `.currency`: one-line market boards.
pub struct BoardCommand {
    quotes: CnbcQuotes,
    board: Board,
}

impl BoardCommand {
    #[must_use]
    pub fn new(quotes: CnbcQuotes, board: Board) -> Self {
        Self { quotes, board }
    }
}

#[async_trait]
impl CommandHandler for BoardCommand {
    async fn handle(&self, _request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
        let summary = match self.board {
            Board::Indices => self.quotes.market_summary().await,
            Board::Bonds => self.quotes.bond_summary().await,
            Board::Oil => self.quotes.oil_summary().await,
            Board::Currencies => self.quotes.currency_summary().await,
        };
        if summary.is_empty() {
            debug!(board = ?self.board, "quote strip produced nothing");
            return Ok(Vec::new());
        }
        Ok(vec![Reply::Channel(summary)])
    }
}

// ── Crypto ──────────────────────────────────────────────────────────────────

/// `.crypto` / `.c <sym>`: coinmarketcap front-page row.
pub struct CryptoCommand {
    coins: CoinMarketCap,
}

impl CryptoCommand {
    #[must_use]
    pub fn new(coins: CoinMarketCap) -> Self {
        Self { coins }
    }
}

#[async_trait]
impl CommandHandler for CryptoCommand {
    async fn handle(&self, request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
        let ticker = ticker_arg(request.args)?;
        Ok(vec![Reply::Channel(self.coins.coin_line(ticker).await?)])
    }
}

// ── News ────────────────────────────────────────────────────────────────────

/// `!news <ticker>`: summarized finviz headlines, one message per item.
pub struct NewsCommand {
    news: FinvizNews,
    summarizer: Arc<dyn Summarizer>,
}

impl NewsCommand {
    #[must_use]
    pub fn new(news: FinvizNews, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { news, summarizer }
    }
}

#[async_trait]
impl CommandHandler for NewsCommand {
    async fn handle(&self, request: CommandRequest<'_>) -> anyhow::Result<Vec<Reply>> {
        let ticker = ticker_arg(request.args)?;
        let lines = self.news.report(ticker, self.summarizer.as_ref()).await?;
        Ok(lines.into_iter().map(Reply::Channel).collect())
    }
}

// ── Registry ────────────────────────────────────────────────────────────────

/// Build the full trigger registry backed by live site clients.
pub fn standard_router(
    markets: &MarketsConfig,
    tracker: Arc<SeenTracker>,
) -> Result<Router, DispatchError> {
    let client = browser_client()?;
    let yahoo = YahooFinance::new(client.clone());
    let cnbc = CnbcQuotes::new(client.clone());
    let api_key = markets
        .exchange_rate_api_key
        .as_ref()
        .map(|key| key.expose_secret().clone());
    let summarizer: Arc<dyn Summarizer> = Arc::new(OllamaSummarizer::new(
        client.clone(),
        markets.ollama_url.clone(),
        markets.ollama_model.clone(),
    ));

    let mut router = Router::new();
    router.register("!time", Arc::new(TimeCommand));
    router.register("!seen", Arc::new(SeenCommand::new(tracker)));
    router.register(
        "!convert",
        Arc::new(ConvertCommand::new(ExchangeRates::new(
            client.clone(),
            api_key,
        ))),
    );

    let quote = Arc::new(QuoteCommand::new(yahoo.clone()));
    router.register("!quote", quote.clone());
    router.register(".q", quote);
    router.register(".t", Arc::new(TickerSummaryCommand::new(yahoo)));

    let indices = Arc::new(BoardCommand::new(cnbc.clone(), Board::Indices));
    router.register(".market", indices.clone());
    router.register(".markets", indices);
    let bonds = Arc::new(BoardCommand::new(cnbc.clone(), Board::Bonds));
    for trigger in [".bond", ".bonds", ".yield", ".yields"] {
        router.register(trigger, bonds.clone());
    }
    router.register(".oil", Arc::new(BoardCommand::new(cnbc.clone(), Board::Oil)));
    router.register(
        ".currency",
        Arc::new(BoardCommand::new(cnbc, Board::Currencies)),
    );

    let crypto = Arc::new(CryptoCommand::new(CoinMarketCap::new(client.clone())));
    router.register(".crypto", crypto.clone());
    router.register(".c", crypto);

    router.register(
        "!news",
        Arc::new(NewsCommand::new(FinvizNews::new(client), summarizer)),
    );

    Ok(router)
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    fn request(args: &str) -> CommandRequest<'_> {
        CommandRequest {
            sender: "alice",
            channel: "#finance",
            args,
        }
    }

    #[test]
    fn ticker_arg_strips_dollar_prefix() {
        assert_eq!(ticker_arg("$AAPL rest ignored").unwrap(), "AAPL");
        assert_eq!(ticker_arg("msft").unwrap(), "msft");
        assert_eq!(
            ticker_arg("").unwrap_err().to_string(),
            "expected a ticker symbol"
        );
    }

    #[tokio::test]
    async fn time_reports_the_wall_clock() {
        let replies = TimeCommand.handle(request("")).await.unwrap();
        let Some(Reply::Channel(text)) = replies.first() else {
            panic!("expected one channel reply, got {replies:?}");
        };
        let shape = Regex::new(r"^Current time: \d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").unwrap();
        assert!(shape.is_match(text), "unexpected reply: {text}");
    }

    #[tokio::test]
    async fn convert_requires_both_codes() {
        let server = mockito::Server::new_async().await;
        let rates = ExchangeRates::with_base(
            browser_client().unwrap(),
            server.url(),
            Some("k".to_string()),
        );
        let err = ConvertCommand::new(rates)
            .handle(request("USD"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "expected <FROM> <TO> currency codes");
    }

    #[tokio::test]
    async fn convert_relays_the_rate_line() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v6/k/latest/USD")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result":"success","conversion_rates":{"EUR":0.92}}"#)
            .create_async()
            .await;

        let rates = ExchangeRates::with_base(
            browser_client().unwrap(),
            server.url(),
            Some("k".to_string()),
        );
        let replies = ConvertCommand::new(rates)
            .handle(request("USD EUR"))
            .await
            .unwrap();
        assert_eq!(replies, vec![Reply::Channel(
            "The exchange rate for USD to EUR is 0.92".to_string()
        )]);
    }

    #[tokio::test]
    async fn empty_board_summary_is_silent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex(".*".to_string()))
            .with_status(500)
            .create_async()
            .await;

        let quotes = CnbcQuotes::with_base(browser_client().unwrap(), server.url());
        let replies = BoardCommand::new(quotes, Board::Indices)
            .handle(request(""))
            .await
            .unwrap();
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn seen_command_queries_nickserv() {
        let tracker = Arc::new(SeenTracker::new());
        let replies = SeenCommand::new(tracker.clone())
            .handle(request("SomeNick"))
            .await
            .unwrap();
        assert_eq!(replies, vec![Reply::Direct {
            nick: "NickServ".to_string(),
            text: "INFO SomeNick".to_string(),
        }]);

        let reply = tracker
            .resolve("User seen  : Aug 20 11:00:00 2026 (6 days ago)")
            .unwrap();
        assert_eq!(reply.channel, "#finance");
        assert_eq!(
            reply.text,
            "alice: somenick was last seen Aug 20 11:00:00 2026 6 days ago"
        );
    }

    #[tokio::test]
    async fn seen_without_a_nick_is_an_error() {
        let err = SeenCommand::new(Arc::new(SeenTracker::new()))
            .handle(request(""))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "expected a nickname");
    }

    #[test]
    fn standard_registry_covers_every_trigger() {
        let router =
            standard_router(&MarketsConfig::default(), Arc::new(SeenTracker::new())).unwrap();
        for trigger in [
            "!time", "!seen", "!convert", "!quote", "!news", ".q", ".t", ".market", ".markets",
            ".bond", ".bonds", ".yield", ".yields", ".oil", ".currency", ".crypto", ".c",
        ] {
            assert!(router.is_registered(trigger), "missing trigger {trigger}");
        }
        assert!(!router.is_registered("!nope"));
    }
}
