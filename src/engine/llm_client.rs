use std::io::{BufRead, BufReader, Read};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::CompletionError;

/// Anything that turns a prompt into generated text.
pub trait CompletionService: Send + Sync {
    /// `false` when no credentials are available; callers skip the request.
    fn is_configured(&self) -> bool;

    fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    pub content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// Gemini through its OpenAI-compatible chat-completions endpoint.
pub struct GeminiClient {
    http: Client,
    config: ModelConfig,
}

impl GeminiClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::blocking::Response, CompletionError> {
        let req = ChatCompletionRequest {
            model: &self.config.name,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            stream,
        };

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&req)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp)
    }
}

impl CompletionService for GeminiClient {
    fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        tracing::debug!(model = %self.config.name, stream = self.config.stream, chars = prompt.len(), "sending prompt");

        if self.config.stream {
            let resp = self.send(prompt, true)?;
            return collect_stream(resp);
        }

        let resp = self.send(prompt, false)?.json::<ChatCompletionResponse>()?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

/// Concatenates the `delta.content` of every server-sent event until `[DONE]`.
pub fn collect_stream(source: impl Read) -> Result<String, CompletionError> {
    let reader = BufReader::new(source);
    let mut text = String::new();

    for line in reader.lines() {
        let line = line.map_err(|e| CompletionError::Stream(e.to_string()))?;
        let Some(data) = line.trim().strip_prefix("data:") else {
            continue;
        };

        let data = data.trim();
        if data == "[DONE]" {
            break;
        }
        if data.is_empty() {
            continue;
        }

        let chunk: StreamChunk =
            serde_json::from_str(data).map_err(|e| CompletionError::Stream(e.to_string()))?;
        for choice in chunk.choices {
            if let Some(piece) = choice.delta.content {
                text.push_str(&piece);
            }
        }
    }

    if text.is_empty() {
        return Err(CompletionError::EmptyResponse);
    }

    Ok(text)
}
