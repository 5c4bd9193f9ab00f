//! Config schema types (transport, preview pipeline, market-data handlers).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Desktop Chrome user agent presented by the browser and the raw fetcher.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnfurlConfig {
    pub transport: TransportConfig,
    pub preview: PreviewConfig,
    pub markets: MarketsConfig,
}

/// Messaging-transport settings, consumed by the embedding transport layer.
///
/// The agent itself only sees the transport through the outbound/inbound
/// boundary; these settings exist so one config file can drive both halves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Server hostname.
    pub server: String,
    /// TLS port.
    pub port: u16,
    /// Nickname the agent registers as.
    pub nickname: String,
    /// SASL account name.
    pub sasl_username: String,
    /// SASL password.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub sasl_password: Option<Secret<String>>,
    /// Channels to join after registration.
    pub channels: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: 6697,
            nickname: "unfurl".into(),
            sasl_username: String::new(),
            sasl_password: None,
            channels: Vec::new(),
        }
    }
}

/// Link-preview pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Wall-clock ceiling for one URL's end-to-end extraction, in ms.
    pub budget_ms: u64,
    /// Navigation (network-idle) timeout, in ms.
    pub nav_timeout_ms: u64,
    /// Per-site-rule selector wait budget, in ms.
    pub rule_wait_ms: u64,
    /// Run the browser headless. Disable for local debugging.
    pub headless: bool,
    /// Explicit Chromium executable path. Auto-detected when unset.
    pub chrome_path: Option<String>,
    /// Directory receiving the `screenshot.png` / `html.txt` diagnostics.
    pub artifact_dir: String,
    /// User agent string.
    pub user_agent: String,
    /// Browser locale.
    pub locale: String,
    /// IANA timezone presented to fingerprinting scripts.
    pub timezone: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            budget_ms: 60_000,
            nav_timeout_ms: 10_000,
            rule_wait_ms: 15_000,
            headless: true,
            chrome_path: None,
            artifact_dir: ".".into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            locale: "en-GB".into(),
            timezone: "Europe/Paris".into(),
        }
    }
}

/// Market-data handler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketsConfig {
    /// exchangerate-api.com access key, used by `!convert`.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub exchange_rate_api_key: Option<Secret<String>>,
    /// Ollama generate endpoint used for news summaries.
    pub ollama_url: String,
    /// Ollama model used for news summaries.
    pub ollama_model: String,
}

impl Default for MarketsConfig {
    fn default() -> Self {
        Self {
            exchange_rate_api_key: None,
            ollama_url: "http://localhost:11434/api/generate".into(),
            ollama_model: "llama3.2".into(),
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let cfg = UnfurlConfig::default();
        assert_eq!(cfg.preview.budget_ms, 60_000);
        assert_eq!(cfg.preview.nav_timeout_ms, 10_000);
        assert_eq!(cfg.preview.rule_wait_ms, 15_000);
        assert!(cfg.preview.headless);
        assert_eq!(cfg.transport.port, 6697);
        assert!(cfg.markets.ollama_url.contains("11434"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: UnfurlConfig = toml::from_str(
            r##"
            [preview]
            budget_ms = 30000

            [transport]
            server = "irc.libera.chat"
            channels = ["#test"]
            "##,
        )
        .unwrap();
        assert_eq!(cfg.preview.budget_ms, 30_000);
        assert_eq!(cfg.preview.nav_timeout_ms, 10_000);
        assert_eq!(cfg.transport.server, "irc.libera.chat");
        assert_eq!(cfg.transport.nickname, "unfurl");
    }

    #[test]
    fn secret_fields_round_trip() {
        let cfg: UnfurlConfig = toml::from_str(
            r#"
            [transport]
            sasl_password = "hunter2"

            [markets]
            exchange_rate_api_key = "abc123"
            "#,
        )
        .unwrap();
        let pw = cfg.transport.sasl_password.as_ref().unwrap();
        assert_eq!(pw.expose_secret(), "hunter2");

        let out = toml::to_string(&cfg).unwrap();
        assert!(out.contains("hunter2"));
    }
}
