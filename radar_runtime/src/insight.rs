//! Generative commentary for a single market item.

use std::env;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// Checked in order; the first non-empty value wins.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

const FAILURE_PREFIX: &str = "Failed to retrieve AI insight. Error: ";

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("missing API key (set GEMINI_API_KEY or API_KEY)")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("response contained no text")]
    EmptyResponse,
}

/// Anything that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError>;
}

pub fn insight_prompt(trend: &str) -> String {
    format!(
        "As a business strategist, provide a concise analysis of the following market trend.\n\
         Focus on the primary risks and opportunities for a technology consulting company.\n\
         Keep the response under 150 words and use bullet points for risks and opportunities.\n\
         Trend: \"{trend}\""
    )
}

/// Ask `generator` about `trend`. Never fails: errors become a readable placeholder.
pub async fn get_insight(generator: &dyn TextGenerator, trend: &str) -> String {
    match generator.generate(&insight_prompt(trend)).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(target: "market_radar::insight", error = %err, "insight.failed");
            format!("{FAILURE_PREFIX}{err}")
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            top_p: 1.0,
            top_k: 32,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        let api_key = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_default();
        Self::new(api_key)
    }
}

/// REST client for the `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, InsightError> {
        let http = reqwest::Client::builder()
            .user_agent("market-radar/0.1")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "topP": self.config.top_p,
                "topK": self.config.top_k,
            }
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
        if self.config.api_key.trim().is_empty() {
            return Err(InsightError::MissingApiKey);
        }
        tracing::debug!(
            target: "market_radar::insight",
            model = %self.config.model,
            "insight.request"
        );
        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        if !status.is_success() {
            return Err(InsightError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }
        response_text(body)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn response_text(body: serde_json::Value) -> Result<String, InsightError> {
    let response: GenerateResponse =
        serde_json::from_value(body).map_err(|_| InsightError::EmptyResponse)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(InsightError::EmptyResponse);
    }
    Ok(text)
}

fn api_error_message(body: &serde_json::Value) -> String {
    body.pointer("/error/message")
        .and_then(|message| message.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Result<&'static str, ()>);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
            assert!(prompt.contains("Trend: \""));
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(InsightError::Api {
                    status: 503,
                    message: "model overloaded".into(),
                }),
            }
        }
    }

    #[test]
    fn prompt_embeds_trend() {
        let prompt = insight_prompt("Cloud costs rise");
        assert!(prompt.starts_with("As a business strategist"));
        assert!(prompt.contains("under 150 words"));
        assert!(prompt.ends_with("Trend: \"Cloud costs rise\""));
    }

    #[tokio::test]
    async fn successful_generation_is_returned_verbatim() {
        let text = get_insight(&Canned(Ok("- Risk: churn")), "x").await;
        assert_eq!(text, "- Risk: churn");
    }

    #[tokio::test]
    async fn failures_become_placeholder() {
        let text = get_insight(&Canned(Err(())), "x").await;
        insta::assert_snapshot!(
            text,
            @"Failed to retrieve AI insight. Error: service returned 503: model overloaded"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(GeminiConfig::new("  ")).unwrap();
        let text = get_insight(&client, "x").await;
        assert!(text.starts_with(FAILURE_PREFIX));
        assert!(text.contains("missing API key"));
    }

    #[test]
    fn response_parts_are_concatenated() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "- Risk\n" }, { "text": "- Opportunity" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });
        assert_eq!(response_text(body).unwrap(), "- Risk\n- Opportunity");
        assert!(matches!(
            response_text(json!({ "candidates": [] })),
            Err(InsightError::EmptyResponse)
        ));
    }

    #[test]
    fn request_shape_and_endpoint() {
        let client = GeminiClient::new(
            GeminiConfig::new("k").with_base_url("http://localhost:9/"),
        )
        .unwrap();
        assert_eq!(
            client.config().endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
        let body = client.request_body("hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["topK"], 32);
        assert_eq!(body["generationConfig"]["topP"], 1.0);
        assert_eq!(
            api_error_message(&json!({ "error": { "message": "bad key" } })),
            "bad key"
        );
    }
}
