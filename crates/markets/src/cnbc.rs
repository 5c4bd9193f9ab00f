//! CNBC quote-strip scraping behind `.market`, `.bond`, `.oil` and
//! `.currency`.
//!
//! Each instrument is one page fetch; a page that fails to load or no longer
//! carries the expected markup is skipped so the remaining instruments still
//! report. The summaries are therefore best-effort strings, empty in the
//! worst case, never errors.

use {
    reqwest::Client,
    scraper::{Html, Selector},
    tracing::debug,
};

use unfurl_format::{paint_change, paint_change_strict};

use crate::error::MarketsError;

/// Production endpoint; tests substitute a local server.
pub const DEFAULT_BASE: &str = "https://www.cnbc.com";

const PRICE_SELECTOR: &str = ".QuoteStrip-lastPrice";
const CHANGE_SELECTOR: &str = ".QuoteStrip-lastPriceStripContainer > *:last-child > *:last-child";
const STAT_PRICE_SELECTOR: &str =
    "h3.Summary-title + ul > li.Summary-stat:nth-child(5) > span.Summary-value";
const STAT_PREVIOUS_CLOSE_SELECTOR: &str =
    "h3.Summary-title + ul > li.Summary-stat:nth-child(8) > span.Summary-value";

/// A quoted instrument: CNBC symbol plus the label used in replies.
#[derive(Debug, Clone, Copy)]
pub struct Instrument {
    pub symbol: &'static str,
    pub label: &'static str,
}

const fn instrument(symbol: &'static str, label: &'static str) -> Instrument {
    Instrument { symbol, label }
}

/// Equity indices reported by `.market` / `.markets`.
pub const MARKET_INDICES: [Instrument; 5] = [
    instrument(".DJI", "Dow Jones"),
    instrument(".SPX", "S&P 500"),
    instrument(".RUT", "Russell 2000"),
    instrument(".IXIC", "NASDAQ Composite"),
    instrument(".VIX", "VIX"),
];

/// Energy futures reported by `.oil`.
pub const OIL_CONTRACTS: [Instrument; 4] = [
    instrument("@CL.1", "WTI Crude"),
    instrument("@LCO.1", "ICE Brent Crude"),
    instrument("@NG.1", "Nat Gas"),
    instrument("@RB.1", "RBOB Gas"),
];

/// FX pairs plus gold and spot bitcoin reported by `.currency`.
pub const CURRENCY_PAIRS: [Instrument; 8] = [
    instrument("GBP=", "GBPUSD"),
    instrument("JPY=X", "USDJPY"),
    instrument("EUR=X", "EURUSD"),
    instrument("CNY=", "USDCNY"),
    instrument("CAD=", "USDCAD"),
    instrument("MXN=", "USDMXN"),
    instrument("@GC.1", "GOLD"),
    instrument("BTC.CB=", "BTC-USD"),
];

/// Treasury maturities reported by `.bond` / `.yield`.
pub const BOND_MATURITIES: [Instrument; 5] = [
    instrument("US1Y", "1Y"),
    instrument("US2Y", "2Y"),
    instrument("US5Y", "5Y"),
    instrument("US10Y", "10Y"),
    instrument("US30Y", "30Y"),
];

/// Scraper for CNBC per-symbol quote pages.
#[derive(Debug, Clone)]
pub struct CnbcQuotes {
    client: Client,
    base: String,
}

impl CnbcQuotes {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base(client, DEFAULT_BASE)
    }

    #[must_use]
    pub fn with_base(client: Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }

    /// `.market` — index levels, green only on an explicit `+`.
    pub async fn market_summary(&self) -> String {
        self.strip_summary(&MARKET_INDICES, paint_change_strict)
            .await
    }

    /// `.oil` — energy futures, red on `-`.
    pub async fn oil_summary(&self) -> String {
        self.strip_summary(&OIL_CONTRACTS, paint_change).await
    }

    /// `.currency` — FX, gold and bitcoin, red on `-`.
    pub async fn currency_summary(&self) -> String {
        self.strip_summary(&CURRENCY_PAIRS, paint_change).await
    }

    /// `.bond` — treasury price, yield and a derived price change.
    ///
    /// CNBC's strip shows the yield; the percent change is computed from the
    /// price and previous-close key stats and floored to four decimals.
    pub async fn bond_summary(&self) -> String {
        let mut segments = Vec::new();
        for maturity in &BOND_MATURITIES {
            let body = match self.fetch_quote_page(maturity.symbol).await {
                Ok(body) => body,
                Err(e) => {
                    debug!(symbol = maturity.symbol, error = %e, "bond fetch failed, skipping");
                    continue;
                },
            };
            let Some(stats) = parse_bond_stats(&body) else {
                debug!(symbol = maturity.symbol, "key stats not present, skipping");
                continue;
            };
            let change = stats
                .price
                .parse::<f64>()
                .ok()
                .zip(stats.previous_close.parse::<f64>().ok())
                .and_then(|(current, previous)| floored_percent_change(current, previous));
            let Some(change) = change else {
                debug!(symbol = maturity.symbol, "unparseable key stats, skipping");
                continue;
            };
            segments.push(format!(
                "{}: {} (Price) {} (Yield) {} (Price Change)",
                maturity.label,
                stats.price,
                stats.current_yield,
                paint_change(&change)
            ));
        }
        segments.join(" ")
    }

    async fn strip_summary(
        &self,
        instruments: &[Instrument],
        colorize: fn(&str) -> String,
    ) -> String {
        let mut segments = Vec::new();
        for instrument in instruments {
            let body = match self.fetch_quote_page(instrument.symbol).await {
                Ok(body) => body,
                Err(e) => {
                    debug!(symbol = instrument.symbol, error = %e, "quote fetch failed, skipping");
                    continue;
                },
            };
            let Some(quote) = parse_quote_strip(&body) else {
                debug!(symbol = instrument.symbol, "quote strip not present, skipping");
                continue;
            };
            segments.push(format!(
                "{}: {} {}",
                instrument.label,
                quote.price,
                colorize(&quote.change)
            ));
        }
        segments.join(" ")
    }

    async fn fetch_quote_page(&self, symbol: &str) -> Result<String, MarketsError> {
        let url = format!("{}/quotes/{}", self.base, urlencoding::encode(symbol));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketsError::fetch("cnbc.com", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MarketsError::status("cnbc.com", status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| MarketsError::fetch("cnbc.com", e))
    }
}

struct QuoteStrip {
    price: String,
    change: String,
}

/// Pull price and change out of the quote strip; parentheses around the
/// change are dropped.
fn parse_quote_strip(body: &str) -> Option<QuoteStrip> {
    let document = Html::parse_document(body);
    let price_sel = Selector::parse(PRICE_SELECTOR).ok()?;
    let change_sel = Selector::parse(CHANGE_SELECTOR).ok()?;

    let price = document
        .select(&price_sel)
        .next()?
        .text()
        .collect::<String>();
    let change = document
        .select(&change_sel)
        .next()?
        .text()
        .collect::<String>();

    Some(QuoteStrip {
        price: price.trim().to_string(),
        change: change.trim().replace(['(', ')'], ""),
    })
}

struct BondStats {
    price: String,
    current_yield: String,
    previous_close: String,
}

/// Bond pages carry the traded price in the 5th key stat and the previous
/// close in the 8th; the strip itself shows the yield.
fn parse_bond_stats(body: &str) -> Option<BondStats> {
    let document = Html::parse_document(body);
    let price_sel = Selector::parse(STAT_PRICE_SELECTOR).ok()?;
    let previous_sel = Selector::parse(STAT_PREVIOUS_CLOSE_SELECTOR).ok()?;
    let yield_sel = Selector::parse(PRICE_SELECTOR).ok()?;

    let price = document
        .select(&price_sel)
        .next()?
        .text()
        .collect::<String>();
    let previous_close = document
        .select(&previous_sel)
        .next()?
        .text()
        .collect::<String>();
    let current_yield = document
        .select(&yield_sel)
        .next()?
        .text()
        .collect::<String>();

    Some(BondStats {
        price: price.trim().to_string(),
        current_yield: current_yield.trim().to_string(),
        previous_close: previous_close.trim().to_string(),
    })
}

/// Percent change versus the previous close, floored to four decimals.
///
/// Flooring (not rounding) matches how the figure has always been reported;
/// a zero or garbage previous close yields `None` and the instrument is
/// skipped.
fn floored_percent_change(current: f64, previous: f64) -> Option<String> {
    let difference = ((current - previous) / previous) * 100.0;
    if !difference.is_finite() {
        return None;
    }
    let floored = (difference * 10_000.0).floor() / 10_000.0;
    if floored.fract() == 0.0 {
        Some(format!("{floored:.1}%"))
    } else {
        Some(format!("{floored}%"))
    }
}

#[cfg(test)]
mod tests {
    use unfurl_format::{GREEN, RED, RESET};

    use super::*;
    use crate::client::browser_client;

    fn strip_page(price: &str, change: &str) -> String {
        format!(
            r#"<html><body>
            <div class="QuoteStrip-lastPriceStripContainer">
              <span class="QuoteStrip-lastPrice">{price}</span>
              <span><span>+12.00</span> <span>{change}</span></span>
            </div>
            </body></html>"#
        )
    }

    fn bond_page(yield_text: &str, price: &str, previous: &str) -> String {
        let mut stats = String::new();
        for n in 1..=8 {
            let value = match n {
                5 => price,
                8 => previous,
                _ => "0",
            };
            stats.push_str(&format!(
                r#"<li class="Summary-stat"><span class="Summary-label">stat {n}</span><span class="Summary-value">{value}</span></li>"#
            ));
        }
        format!(
            r#"<html><body>
            <span class="QuoteStrip-lastPrice">{yield_text}</span>
            <h3 class="Summary-title">KEY STATS</h3>
            <ul>{stats}</ul>
            </body></html>"#
        )
    }

    // --- pure parsing ---

    #[test]
    fn quote_strip_drops_parentheses() {
        let quote = parse_quote_strip(&strip_page("44,296.51", "(+1.05%)")).unwrap();
        assert_eq!(quote.price, "44,296.51");
        assert_eq!(quote.change, "+1.05%");
    }

    #[test]
    fn quote_strip_absent_markup() {
        assert!(parse_quote_strip("<html><body><p>blocked</p></body></html>").is_none());
    }

    #[test]
    fn bond_stats_take_fifth_and_eighth() {
        let stats = parse_bond_stats(&bond_page("4.327%", "98.53", "98.20")).unwrap();
        assert_eq!(stats.price, "98.53");
        assert_eq!(stats.previous_close, "98.20");
        assert_eq!(stats.current_yield, "4.327%");
    }

    #[test]
    fn percent_change_is_floored() {
        assert_eq!(
            floored_percent_change(98.53, 98.20).as_deref(),
            Some("0.336%")
        );
        assert_eq!(
            floored_percent_change(100.5, 100.0).as_deref(),
            Some("0.5%")
        );
        assert_eq!(
            floored_percent_change(99.5, 100.0).as_deref(),
            Some("-0.5%")
        );
        // Integral results keep one decimal.
        assert_eq!(
            floored_percent_change(100.0, 100.0).as_deref(),
            Some("0.0%")
        );
    }

    #[test]
    fn percent_change_rejects_zero_previous() {
        assert!(floored_percent_change(98.53, 0.0).is_none());
    }

    // --- fetch paths ---

    #[tokio::test]
    async fn market_summary_skips_failed_instruments() {
        let mut server = mockito::Server::new_async().await;
        let dow = server
            .mock("GET", "/quotes/.DJI")
            .with_status(200)
            .with_body(strip_page("44,296.51", "(+1.05%)"))
            .create_async()
            .await;
        let spx = server
            .mock("GET", "/quotes/.SPX")
            .with_status(500)
            .create_async()
            .await;

        let quotes = CnbcQuotes::with_base(browser_client().unwrap(), server.url());
        let summary = quotes.market_summary().await;

        assert!(summary.starts_with(&format!("Dow Jones: 44,296.51 {GREEN}+1.05%{RESET}")));
        assert!(!summary.contains("S&P 500"));
        dow.assert_async().await;
        spx.assert_async().await;
    }

    #[tokio::test]
    async fn market_polarity_requires_plus() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/quotes/.VIX")
            .with_status(200)
            .with_body(strip_page("18.90", "(UNCH)"))
            .create_async()
            .await;

        let quotes = CnbcQuotes::with_base(browser_client().unwrap(), server.url());
        let summary = quotes.market_summary().await;

        assert!(summary.contains(&format!("VIX: 18.90 {RED}UNCH{RESET}")));
    }

    #[tokio::test]
    async fn oil_polarity_requires_minus() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/quotes/%40CL.1")
            .with_status(200)
            .with_body(strip_page("63.18", "(-0.22%)"))
            .create_async()
            .await;
        server
            .mock("GET", "/quotes/%40NG.1")
            .with_status(200)
            .with_body(strip_page("2.91", "(UNCH)"))
            .create_async()
            .await;

        let quotes = CnbcQuotes::with_base(browser_client().unwrap(), server.url());
        let summary = quotes.oil_summary().await;

        assert!(summary.contains(&format!("WTI Crude: 63.18 {RED}-0.22%{RESET}")));
        // Unsigned reads green under the minus-is-red scheme.
        assert!(summary.contains(&format!("Nat Gas: 2.91 {GREEN}UNCH{RESET}")));
    }

    #[tokio::test]
    async fn bond_summary_reports_price_yield_and_change() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/quotes/US10Y")
            .with_status(200)
            .with_body(bond_page("4.327%", "98.53", "98.20"))
            .create_async()
            .await;

        let quotes = CnbcQuotes::with_base(browser_client().unwrap(), server.url());
        let summary = quotes.bond_summary().await;

        assert_eq!(
            summary,
            format!("10Y: 98.53 (Price) 4.327% (Yield) {GREEN}0.336%{RESET} (Price Change)")
        );
    }

    #[tokio::test]
    async fn everything_down_yields_empty_summary() {
        let server = mockito::Server::new_async().await;
        let quotes = CnbcQuotes::with_base(browser_client().unwrap(), server.url());
        assert!(quotes.currency_summary().await.is_empty());
    }
}
