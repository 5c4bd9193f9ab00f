//! Yahoo Finance quoteSummary lookups behind `!quote` / `.q` and `.t`.
//!
//! One GET per lookup, five modules in the query; the interesting figures
//! are flattened into [`TickerInfo`] and the reply lines are built from
//! that. Numeric fields arrive as `{"raw": .., "fmt": ".."}` objects and
//! missing ones as `{}`, so every leaf is optional.

use std::sync::LazyLock;

use {
    chrono::Datelike,
    regex::Regex,
    reqwest::Client,
    serde::Deserialize,
    tracing::debug,
};

use unfurl_format::{compact_number, signed_colored};

use crate::error::MarketsError;

/// Production endpoint; tests substitute a local server.
pub const DEFAULT_BASE: &str = "https://query2.finance.yahoo.com";

const MODULES: &str = "price,summaryDetail,assetProfile,financialData,defaultKeyStatistics";

/// Founding year as stated in business summaries ("was founded in 1984",
/// "incorporated on 1899").
static FOUNDED_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:founded|incorporated|established) (?:in|on) (\d+)").ok()
});

/// Quote client for the summary API.
#[derive(Debug, Clone)]
pub struct YahooFinance {
    client: Client,
    base: String,
}

impl YahooFinance {
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

    /// The single-line `!quote` reply.
    pub async fn quote_line(&self, ticker: &str) -> Result<String, MarketsError> {
        let info = self.info(ticker).await?;

        let price = info
            .price
            .ok_or_else(|| MarketsError::missing(ticker, "price"))?;
        let previous = info
            .previous_close
            .filter(|p| *p != 0.0)
            .ok_or_else(|| MarketsError::missing(ticker, "previous close"))?;

        let absolute = price - previous;
        let relative = ((price / previous) - 1.0) * 100.0;
        let after_hours = info.after_hours_change_percent;

        Ok(format!(
            "{ticker}: {price:.2} {} {} AH: {} | {} (Industry: {}) (Sector: {}) (Exchange: {}) \
             | Div: {} | P/E: {} | MCap: {} | 52WR: {} | V: {} | Year Founded: {}",
            signed_colored(absolute, format!("{absolute:.2}")),
            signed_colored(relative, format!("{relative:.2}%")),
            signed_colored(after_hours, format!("{after_hours:.2}%")),
            info.name.as_deref().unwrap_or("N/A"),
            info.industry.as_deref().unwrap_or("N/A"),
            info.sector.as_deref().unwrap_or("N/A"),
            info.exchange.as_deref().unwrap_or("N/A"),
            display_or_na(info.dividend_yield),
            display_or_na(info.forward_pe),
            compact_number(info.market_cap),
            info.fifty_two_week_range.as_deref().unwrap_or("N/A"),
            info.volume
                .map_or_else(|| "N/A".to_string(), |v| format!("{v:.0}")),
            info.year_founded
                .map_or_else(|| "N/A".to_string(), |y| y.to_string()),
        ))
    }

    /// The long business summary used by `.t`; the caller splits it into
    /// transport-sized parts.
    pub async fn business_summary(&self, ticker: &str) -> Result<String, MarketsError> {
        let info = self.info(ticker).await?;
        info.business_summary
            .ok_or_else(|| MarketsError::missing(ticker, "business summary"))
    }

    /// Fetch and flatten the five quoteSummary modules.
    pub async fn info(&self, ticker: &str) -> Result<TickerInfo, MarketsError> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={MODULES}",
            self.base,
            urlencoding::encode(ticker)
        );
        debug!(ticker, "fetching quote summary");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketsError::fetch("finance.yahoo.com", e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MarketsError::fetch("finance.yahoo.com", e))?;

        // Unknown symbols come back as a non-success status wrapping a JSON
        // error with a usable description; prefer that description.
        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(MarketsError::status("finance.yahoo.com", status.as_u16()));
            },
            Err(e) => return Err(MarketsError::payload("finance.yahoo.com", e)),
        };
        if let Some(error) = envelope.quote_summary.error {
            let description = error
                .description
                .or(error.code)
                .unwrap_or_else(|| "quote lookup failed".to_string());
            return Err(MarketsError::Api(description));
        }
        if !status.is_success() {
            return Err(MarketsError::status("finance.yahoo.com", status.as_u16()));
        }

        let modules = envelope
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| MarketsError::missing(ticker, "quote"))?;
        Ok(build_info(modules))
    }
}

/// The figures the reply lines draw from, already merged across modules.
#[derive(Debug, Default)]
pub struct TickerInfo {
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub exchange: Option<String>,
    pub dividend_yield: Option<f64>,
    pub forward_pe: Option<f64>,
    pub fifty_two_week_range: Option<String>,
    pub business_summary: Option<String>,
    /// Post-market change, falling back to pre-market, in percent units;
    /// zero when neither session reports.
    pub after_hours_change_percent: f64,
    pub year_founded: Option<i32>,
}

fn build_info(modules: ModuleSet) -> TickerInfo {
    let price = modules.price.unwrap_or_default();
    let detail = modules.summary_detail.unwrap_or_default();
    let profile = modules.asset_profile.unwrap_or_default();
    let financial = modules.financial_data.unwrap_or_default();
    let stats = modules.default_key_statistics.unwrap_or_default();

    let business_summary = profile
        .long_business_summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let year_founded = founding_year(
        business_summary.as_deref(),
        stats.fund_inception_date.raw,
    );

    TickerInfo {
        price: financial.current_price.raw.or(price.regular_market_price.raw),
        previous_close: price
            .regular_market_previous_close
            .raw
            .or(detail.previous_close.raw),
        volume: price.regular_market_volume.raw.or(detail.volume.raw),
        market_cap: price.market_cap.raw,
        name: price.long_name.or(price.short_name),
        industry: profile.industry.or(stats.category),
        sector: profile.sector.or(stats.legal_type),
        exchange: price.exchange_name,
        dividend_yield: detail.dividend_yield.raw,
        forward_pe: detail.forward_pe.raw,
        fifty_two_week_range: detail
            .fifty_two_week_low
            .raw
            .zip(detail.fifty_two_week_high.raw)
            .map(|(low, high)| format!("{low:.2} - {high:.2}")),
        business_summary,
        // The summary modules report percent fields as fractions.
        after_hours_change_percent: price
            .post_market_change_percent
            .raw
            .or(price.pre_market_change_percent.raw)
            .map_or(0.0, |f| f * 100.0),
        year_founded,
    }
}

/// Year the company was founded: stated in the business summary when it is,
/// otherwise the fund inception year for ETFs.
fn founding_year(summary: Option<&str>, inception_secs: Option<f64>) -> Option<i32> {
    if let Some(summary) = summary {
        let stated = FOUNDED_RE
            .as_ref()
            .and_then(|re| re.captures(summary))
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok());
        if stated.is_some() {
            return stated;
        }
    }
    let secs = inception_secs? as i64;
    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.year())
}

fn display_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

// ── Wire shapes ────────────────────────────────────────────────────────────

/// `{"raw": 12.3, "fmt": "12.30"}`, or `{}` when the figure is absent.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct Fmt {
    #[serde(default)]
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: Payload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Payload {
    result: Option<Vec<ModuleSet>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ModuleSet {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetailModule>,
    asset_profile: Option<AssetProfileModule>,
    financial_data: Option<FinancialDataModule>,
    default_key_statistics: Option<KeyStatisticsModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PriceModule {
    regular_market_price: Fmt,
    regular_market_previous_close: Fmt,
    regular_market_volume: Fmt,
    market_cap: Fmt,
    post_market_change_percent: Fmt,
    pre_market_change_percent: Fmt,
    long_name: Option<String>,
    short_name: Option<String>,
    exchange_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SummaryDetailModule {
    dividend_yield: Fmt,
    #[serde(rename = "forwardPE")]
    forward_pe: Fmt,
    fifty_two_week_low: Fmt,
    fifty_two_week_high: Fmt,
    volume: Fmt,
    previous_close: Fmt,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AssetProfileModule {
    industry: Option<String>,
    sector: Option<String>,
    long_business_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FinancialDataModule {
    current_price: Fmt,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct KeyStatisticsModule {
    category: Option<String>,
    legal_type: Option<String>,
    fund_inception_date: Fmt,
}
