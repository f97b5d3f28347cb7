//! Text-generation collaborator interface and the Ollama-backed client.
//!
//! The core sends two kinds of prompts (jurisdiction research and selector
//! discovery) and gets raw text back. All JSON handling and fallback logic
//! lives with the callers; this module only moves prompts and text.

use crate::error::{FilingError, Result};
use crate::settings::Settings;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Prompt-in, text-out collaborator used by research and selector discovery
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a raw text completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Extract the outermost JSON object from a model reply.
///
/// Models regularly wrap JSON in markdown fences or prose. This takes the
/// slice from the first `{` to the last `}`; the caller still decides
/// whether that slice parses.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Non-streaming response body from the Ollama generate endpoint
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Text generator backed by a local Ollama daemon
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OllamaClient {
    /// Build a client from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| FilingError::ModelRequestFailed(e.to_string()))?;

        Ok(Self {
            http,
            host: settings.ollama_host.trim_end_matches('/').to_string(),
            model: settings.ollama_model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    /// Check that the daemon is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self.http.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Reassemble a streaming (NDJSON) body the daemon returned despite
    /// `stream: false`, one `response` chunk per line.
    fn parse_streamed(body: &str) -> Result<String> {
        let mut full_response = String::new();
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let chunk: serde_json::Value = serde_json::from_str(line)
                .map_err(|e| FilingError::ModelRequestFailed(format!("bad response chunk: {}", e)))?;
            if let Some(text) = chunk.get("response").and_then(|v| v.as_str()) {
                full_response.push_str(text);
            }
        }
        Ok(full_response.trim().to_string())
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.host);
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens,
            }
        });

        log::debug!("sending generate request to {} ({} chars)", url, prompt.len());

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FilingError::ModelRequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FilingError::ModelRequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(FilingError::ModelRequestFailed(format!(
                "endpoint returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        match serde_json::from_str::<GenerateResponse>(&body) {
            Ok(parsed) => Ok(parsed.response.trim().to_string()),
            // Some daemon versions stream anyway; fall back to line-by-line
            Err(_) => Self::parse_streamed(&body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_streamed() {
        let body = "{\"response\":\"Hello\"}\n{\"response\":\" world\"}\n{\"done\":true}\n";
        assert_eq!(OllamaClient::parse_streamed(body).unwrap(), "Hello world");
    }

    #[test]
    fn test_parse_streamed_rejects_garbage() {
        assert!(OllamaClient::parse_streamed("not json at all").is_err());
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object("{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(
            extract_json_object("Here you go:\n```json\n{\"a\":1}\n```"),
            Some("{\"a\":1}")
        );
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_client_from_settings() {
        let settings = Settings::new().ollama_host("http://localhost:11434/");
        let client = OllamaClient::new(&settings).unwrap();
        assert_eq!(client.host, "http://localhost:11434");
        assert_eq!(client.model, "llama3.1:latest");
    }
}
