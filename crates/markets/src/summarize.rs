//! Article summarization for `!news`.
//!
//! The command loop treats summaries as reply text no matter what happened,
//! so the trait returns `String` in every case; a backend failure becomes an
//! explanatory line and the rest of the report still goes out.

use {
    async_trait::async_trait,
    reqwest::Client,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

/// Instruction prepended to the article text.
pub const SUMMARY_PROMPT: &str = "Summarise the following article in 256 characters or less:";

/// Local generate endpoint used when nothing is configured.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";

/// Model used when nothing is configured.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Boils article text down to a transport-sized reply.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> String;
}

/// Ollama `/api/generate` backend.
pub struct OllamaSummarizer {
    client: Client,
    url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    response: String,
}

impl OllamaSummarizer {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, text: &str) -> String {
        let request = GenerateRequest {
            model: &self.model,
            prompt: format!("{SUMMARY_PROMPT}\n\n{text}"),
            stream: false,
        };

        let response = match self.client.post(&self.url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => return format!("Error: Unable to reach Ollama server. {e}"),
        };
        let status = response.status();
        if !status.is_success() {
            return format!("Error: Server responded with {}.", status.as_u16());
        }
        match response.json::<GenerateResponse>().await {
            Ok(payload) => payload.response.trim().to_string(),
            Err(e) => {
                debug!(error = %e, "generate response did not decode");
                format!("Error: Unable to reach Ollama server. {e}")
            },
        }
    }
}
