//! Coinmarketcap front-page scrape behind `.crypto` / `.c`.
//!
//! There is no keyed lookup here: the front page lists the top coins in one
//! table, and the requested symbol is found by walking that table. Price and
//! one-hour change sit in the cells following the symbol cell; direction
//! comes from the caret icon class, since the rendered percent carries no
//! sign.

use {
    reqwest::Client,
    scraper::{ElementRef, Html, Selector},
    tracing::debug,
};

use unfurl_format::{GREEN, RED, paint};

use crate::error::MarketsError;

/// Production endpoint; tests substitute a local server.
pub const DEFAULT_BASE: &str = "https://coinmarketcap.com";

const FALLING_ICON: &str = "icon-Caret-down";

/// Front-page scraper for coin prices.
#[derive(Debug, Clone)]
pub struct CoinMarketCap {
    client: Client,
    base: String,
}

impl CoinMarketCap {
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

    /// The single-line `.crypto` reply for `ticker`.
    pub async fn coin_line(&self, ticker: &str) -> Result<String, MarketsError> {
        let symbol = ticker.trim().to_uppercase();
        debug!(symbol = %symbol, "looking up coin on the front page");

        let url = format!("{}/", self.base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketsError::fetch("coinmarketcap.com", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MarketsError::status("coinmarketcap.com", status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| MarketsError::fetch("coinmarketcap.com", e))?;

        let row = parse_coin_row(&body, &symbol)
            .ok_or_else(|| MarketsError::missing(&symbol, "front-page listing"))?;

        let color = if row.falling { RED } else { GREEN };
        Ok(format!(
            "{symbol}: {} | {} | {} (1hr)",
            row.name,
            row.price,
            paint(&row.change, color)
        ))
    }
}

struct CoinRow {
    name: String,
    price: String,
    change: String,
    falling: bool,
}

/// Walk the listing table: the symbol cell anchors the row, the name is the
/// sibling paragraph above it, price and change are the next two cells.
fn parse_coin_row(body: &str, symbol: &str) -> Option<CoinRow> {
    let document = Html::parse_document(body);
    let symbol_sel = Selector::parse("p.coin-item-symbol").ok()?;

    let symbol_el = document
        .select(&symbol_sel)
        .find(|el| el.text().collect::<String>().trim() == symbol)?;

    let name = symbol_el
        .parent()?
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "p")
        .map(|el| el.text().collect::<String>().trim().to_string())?;

    let symbol_cell = symbol_el
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")?;
    let mut following = symbol_cell
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td");
    let price_cell = following.next()?;
    let change_cell = following.next()?;

    Some(CoinRow {
        name,
        price: price_cell.text().collect::<String>().trim().to_string(),
        change: change_cell.text().collect::<String>().trim().to_string(),
        falling: change_cell.html().contains(FALLING_ICON),
    })
}
