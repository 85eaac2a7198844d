use crate::core::error::StudioError;
use crate::core::model::AspectRatio;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_retry_count")]
    pub retry_count: usize,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_retry_count() -> usize {
    2
}
fn default_retry_delay() -> u64 {
    2
}
fn default_text_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl LlmConfig {
    /// Fills a missing Gemini API key from `GEMINI_API_KEY` or `API_KEY`.
    pub fn apply_env(&mut self) {
        let from_env = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());
        let Some(key) = from_env else {
            return;
        };
        let gemini = self.gemini.get_or_insert_with(|| GeminiConfig {
            text_model: default_text_model(),
            image_model: default_image_model(),
            base_url: default_base_url(),
            ..Default::default()
        });
        if gemini.api_key.is_empty() {
            gemini.api_key = key;
        }
    }
}

/// Raster payload returned by an image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64-encoded bytes, as delivered by the backend.
    pub data: String,
}

impl InlineImage {
    /// Fails with `NoImageData` unless `data` is non-empty, valid base64.
    pub fn verify(&self) -> Result<(), StudioError> {
        match base64::engine::general_purpose::STANDARD.decode(&self.data) {
            Ok(bytes) if !bytes.is_empty() => Ok(()),
            _ => Err(StudioError::NoImageData),
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextRequest<'a> {
    pub system: Option<&'a str>,
    pub user: &'a str,
    /// Requests `application/json` output, optionally constrained by a schema.
    pub json: bool,
    pub schema: Option<&'a Value>,
}

#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    async fn generate_text(&self, request: &TextRequest<'_>) -> Result<String>;
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<InlineImage>;
}

pub fn create_llm(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match config.provider.as_str() {
        "gemini" => {
            let cfg = config.gemini.as_ref().context("Gemini config missing")?;
            if cfg.api_key.is_empty() {
                anyhow::bail!("Gemini API key missing: set llm.gemini.api_key or GEMINI_API_KEY");
            }
            Ok(Box::new(GeminiClient::new(
                cfg,
                config.retry_count,
                Duration::from_secs(config.retry_delay_seconds),
            )?))
        }
        _ => Err(anyhow!("Unknown LLM provider: {}", config.provider)),
    }
}

// --- Gemini ---

#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    text_model: String,
    image_model: String,
    base_url: url::Url,
    retry_count: usize,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig, retry_count: usize, retry_delay: Duration) -> Result<Self> {
        let base = format!("{}/", cfg.base_url.trim_end_matches('/'));
        Ok(Self {
            api_key: cfg.api_key.clone(),
            text_model: cfg.text_model.clone(),
            image_model: cfg.image_model.clone(),
            base_url: url::Url::parse(&base).context("Invalid Gemini base_url")?,
            retry_count,
            retry_delay,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, model: &str) -> Result<url::Url> {
        let mut url = self
            .base_url
            .join(&format!("models/{}:generateContent", model))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn call(&self, model: &str, body: &GeminiRequest) -> Result<GeminiResponse> {
        let url = self.endpoint(model)?;
        let mut attempt = 0;
        loop {
            match self.call_once(&url, body).await {
                Ok(resp) => return Ok(resp),
                Err(CallError::Retryable(e)) if attempt < self.retry_count => {
                    attempt += 1;
                    warn!(
                        "Gemini call failed ({}), retrying {}/{}",
                        e, attempt, self.retry_count
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(CallError::Retryable(e)) | Err(CallError::Fatal(e)) => return Err(e),
            }
        }
    }

    async fn call_once(&self, url: &url::Url, body: &GeminiRequest) -> Result<GeminiResponse, CallError> {
        let resp = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| CallError::Retryable(e.into()))?;

        let status = resp.status();
        let response_text = resp
            .text()
            .await
            .map_err(|e| CallError::Retryable(e.into()))?;

        if !status.is_success() {
            let err = anyhow!("Gemini API error ({}): {}", status, response_text);
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                CallError::Retryable(err)
            } else {
                CallError::Fatal(err)
            });
        }

        let result: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            CallError::Fatal(anyhow!(
                "Failed to parse Gemini response: {}. Body: {}",
                e,
                response_text
            ))
        })?;
        if let Some(err) = &result.error {
            return Err(CallError::Fatal(anyhow!(
                "Gemini API returned error: {}",
                err.message
            )));
        }
        Ok(result)
    }
}

enum CallError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

fn user_content(text: &str) -> Vec<GeminiContent> {
    vec![GeminiContent {
        role: "user".to_string(),
        parts: vec![GeminiPart {
            text: text.to_string(),
        }],
    }]
}

fn first_candidate(response: &GeminiResponse) -> Result<&GeminiCandidate> {
    response
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .ok_or_else(|| anyhow!("Gemini response format unexpected or empty"))
}

fn extract_text(response: &GeminiResponse) -> Result<String> {
    let candidate = first_candidate(response)?;
    let text: String = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
        .unwrap_or_default();
    if text.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("UNKNOWN");
        return Err(anyhow!("Gemini response empty. Finish reason: {}", reason));
    }
    Ok(text)
}

fn extract_image(response: &GeminiResponse) -> Result<InlineImage> {
    let candidate = first_candidate(response)?;
    let image = candidate
        .content
        .as_ref()
        .and_then(|c| {
            c.parts
                .iter()
                .filter_map(|p| p.inline_data.as_ref())
                .find(|d| !d.data.is_empty())
        })
        .map(|d| InlineImage {
            mime_type: d.mime_type.clone(),
            data: d.data.clone(),
        })
        .ok_or(StudioError::NoImageData)?;
    image.verify()?;
    Ok(image)
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_text(&self, request: &TextRequest<'_>) -> Result<String> {
        let body = GeminiRequest {
            contents: user_content(request.user),
            system_instruction: request.system.map(|s| GeminiSystemInstruction {
                parts: vec![GeminiPart { text: s.to_string() }],
            }),
            generation_config: request.json.then(|| GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: request.schema.cloned(),
                ..Default::default()
            }),
        };
        debug!("Gemini text request to {}", self.text_model);
        let response = self.call(&self.text_model, &body).await?;
        extract_text(&response)
    }

    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<InlineImage> {
        let body = GeminiRequest {
            contents: user_content(prompt),
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: aspect_ratio.as_str().to_string(),
                }),
                ..Default::default()
            }),
        };
        debug!("Gemini image request to {} ({})", self.image_model, aspect_ratio);
        let response = self.call(&self.image_model, &body).await?;
        extract_image(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_response_parsing_safety_block() {
        let json = r#"{
            "candidates": [
                {
                    "finishReason": "SAFETY",
                    "index": 0
                }
            ]
        }"#;

        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = extract_text(&result).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_gemini_response_parsing_text() {
        let json = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [ { "text": "{\"topic\":" }, { "text": " \"x\"}" } ],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }
            ]
        }"#;

        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_text(&result).unwrap(), "{\"topic\": \"x\"}");
    }

    #[test]
    fn test_gemini_response_parsing_inline_image() {
        let json = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "Here is your image" },
                            { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                        ]
                    }
                }
            ]
        }"#;

        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let image = extract_image(&result).unwrap();
        assert_eq!(image.to_data_uri(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_gemini_response_without_image_fails() {
        let json = r#"{ "candidates": [ { "content": { "parts": [ { "text": "sorry" } ] } } ] }"#;
        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(extract_image(&result).is_err());
    }

    #[test]
    fn test_gemini_response_with_corrupt_image_fails() {
        let json = r#"{ "candidates": [ { "content": { "parts": [
            { "inlineData": { "mimeType": "image/png", "data": "%%%" } }
        ] } } ] }"#;
        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = extract_image(&result).unwrap_err();
        assert_eq!(err.downcast_ref::<StudioError>(), Some(&StudioError::NoImageData));
    }

    #[test]
    fn test_request_serialization() {
        let schema = serde_json::json!({ "type": "OBJECT" });
        let body = GeminiRequest {
            contents: user_content("hi"),
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema),
                image_config: None,
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert!(json.get("systemInstruction").is_none());
        assert!(json["generationConfig"].get("imageConfig").is_none());
    }

    #[test]
    fn test_endpoint_carries_model_and_key() {
        let cfg = GeminiConfig {
            api_key: "k".to_string(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            base_url: default_base_url(),
        };
        let client = GeminiClient::new(&cfg, 0, Duration::ZERO).unwrap();
        let url = client.endpoint("gemini-2.5-flash-image").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent?key=k"
        );
    }
}
