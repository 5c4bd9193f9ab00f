//! Finviz headline report behind `!news`.
//!
//! The ticker's quote page carries a news table; the top rows become one
//! reply line each. Video and hard-paywall links are passed through as
//! `title (link)`, known article layouts are fetched and summarized, and a
//! single bad article degrades to its own error line without stopping the
//! rest.

use {
    reqwest::Client,
    scraper::{Html, Selector},
    tracing::debug,
};

use crate::{error::MarketsError, summarize::Summarizer};

/// Production endpoint; tests substitute a local server.
pub const DEFAULT_BASE: &str = "https://finviz.com";

const HEADLINE_LIMIT: usize = 5;

/// Bodies at or past this many chars are reported raw rather than spending
/// model context on them.
const SUMMARY_CHAR_LIMIT: usize = 4000;

/// One news-table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
}

impl NewsItem {
    /// `"<title> (<link>)"`, the line shape used when no summary is made.
    #[must_use]
    pub fn headline_line(&self) -> String {
        format!("{} ({})", self.title, self.link)
    }
}

/// Headline scraper and per-article reporter.
pub struct FinvizNews {
    client: Client,
    base: String,
}

impl FinvizNews {
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

    /// Top rows of the ticker's news table.
    pub async fn headlines(&self, ticker: &str) -> Result<Vec<NewsItem>, MarketsError> {
        let url = format!("{}/quote.ashx?t={}", self.base, urlencoding::encode(ticker));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketsError::fetch("finviz.com", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MarketsError::status("finviz.com", status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| MarketsError::fetch("finviz.com", e))?;
        Ok(parse_headlines(&body, HEADLINE_LIMIT))
    }

    /// One reply line per headline, in table order.
    pub async fn report(
        &self,
        ticker: &str,
        summarizer: &dyn Summarizer,
    ) -> Result<Vec<String>, MarketsError> {
        let items = self.headlines(ticker).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            lines.push(self.item_line(item, summarizer).await);
        }
        Ok(lines)
    }

    async fn item_line(&self, item: &NewsItem, summarizer: &dyn Summarizer) -> String {
        let default_line = item.headline_line();

        if item.link.contains("youtube.com") || item.link.contains("barrons.com") {
            return default_line;
        }

        // Finviz's own articles are linked site-relative.
        let link = if item.link.starts_with('/') {
            format!("{}{}", self.base, item.link)
        } else {
            item.link.clone()
        };

        let response = match self.client.get(&link).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(link = %link, error = %e, "article fetch failed");
                return format!("Error: unable to fetch {link}");
            },
        };
        let status = response.status();
        if !status.is_success() {
            return format!("Error: {} from {link}", status.as_u16());
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(link = %link, error = %e, "article read failed");
                return format!("Error: unable to fetch {link}");
            },
        };

        let Some(text) = article_text(&body, &item.link) else {
            return default_line;
        };
        if text.chars().count() >= SUMMARY_CHAR_LIMIT {
            return text;
        }
        summarizer.summarize(&text).await
    }
}

/// First `limit` table rows that carry an anchor.
fn parse_headlines(body: &str, limit: usize) -> Vec<NewsItem> {
    let document = Html::parse_document(body);
    let Ok(row_sel) = Selector::parse("#news-table tr") else {
        return Vec::new();
    };
    let Ok(anchor_sel) = Selector::parse("a") else {
        return Vec::new();
    };

    document
        .select(&row_sel)
        .take(limit)
        .filter_map(|row| {
            let anchor = row.select(&anchor_sel).next()?;
            Some(NewsItem {
                title: anchor.text().collect::<String>().trim().to_string(),
                link: anchor.value().attr("href")?.to_string(),
            })
        })
        .collect()
}

/// Body text for the article layouts worth summarizing; `None` for layouts
/// this report does not know.
fn article_text(body: &str, link: &str) -> Option<String> {
    let selector = if link.contains("finance.yahoo.com") {
        ".atoms-wrapper"
    } else if link.contains("finviz.com/news") || link.starts_with("/news") {
        ".news-content"
    } else {
        return None;
    };

    let document = Html::parse_document(body);
    let sel = Selector::parse(selector).ok()?;
    let text = document
        .select(&sel)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    if text.is_empty() { None } else { Some(text) }
}
