//! Currency conversion behind `!convert`, backed by exchangerate-api.com.
//!
//! The replies here are always user-facing text: a bad status or an
//! unconvertible pair comes back as `Ok` with the explanatory line, and only
//! transport or configuration problems surface as errors.

use std::collections::HashMap;

use {reqwest::Client, serde::Deserialize, tracing::debug};

use crate::error::MarketsError;

/// Production endpoint; tests substitute a local server.
pub const DEFAULT_BASE: &str = "https://v6.exchangerate-api.com";

/// Conversion client; unusable (but constructible) without an API key.
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    client: Client,
    base: String,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RatesPayload {
    result: String,
    conversion_rates: HashMap<String, serde_json::Number>,
}

impl ExchangeRates {
    #[must_use]
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self::with_base(client, DEFAULT_BASE, api_key)
    }

    #[must_use]
    pub fn with_base(client: Client, base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base: base.into(),
            api_key,
        }
    }

    /// The `!convert` reply for a `from`/`to` currency-code pair.
    pub async fn convert(&self, from: &str, to: &str) -> Result<String, MarketsError> {
        let key = self.api_key.as_deref().ok_or(MarketsError::NoApiKey)?;

        let url = format!(
            "{}/v6/{key}/latest/{}",
            self.base,
            urlencoding::encode(from)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketsError::fetch("exchangerate-api.com", e))?;
        let status = response.status();
        if !status.is_success() {
            return Ok(format!(
                "Error: {} from exchangerate-api.com",
                status.as_u16()
            ));
        }

        let payload: RatesPayload = response
            .json()
            .await
            .map_err(|e| MarketsError::payload("exchangerate-api.com", e))?;
        if payload.result != "success" {
            debug!(from, to, result = %payload.result, "conversion rejected");
            return Ok(format!("Unable to convert {from} to {to}"));
        }

        match payload.conversion_rates.get(to) {
            Some(rate) => Ok(format!(
                "The exchange rate for {from} to {to} is {rate}"
            )),
            None => Ok(format!("Unable to convert {from} to {to}")),
        }
    }
}
