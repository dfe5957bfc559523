//! # Chat completion client
//!
//! Implements [`CompletionClient`] against an OpenAI-compatible
//! `POST {base_url}/chat/completions` endpoint with bearer authentication.
//! Only the first choice's message content is returned; streaming is not used.

use async_trait::async_trait;
use figma_rag_core::config::LlmSettings;
use figma_rag_core::contract::{CompletionClient, CompletionRequest};
use figma_rag_core::error::Error;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(settings: &LlmSettings, api_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let endpoint = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));
        tracing::info!(
            endpoint = %endpoint,
            model = %settings.model,
            api_key_set = !api_key.is_empty(),
            "Initialized chat completion client"
        );
        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, Error> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, endpoint = %self.endpoint, "Failed to reach model API");
                Error::Transport(format!("Failed to reach model API: {e}"))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read model API response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("Model API request failed with status {status}"));
            tracing::error!(status = %status, message = %message, "Model API returned error");
            return Err(Error::Remote {
                status: status.as_u16(),
                message,
                body: Some(text),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::InvalidResponse(format!("Model API response is not valid JSON: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::InvalidResponse("Model API response has no message content".into()))
    }
}
