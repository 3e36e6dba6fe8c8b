//! OpenAI chat-completions client.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{LlmClient, SummariseError};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Chat-completions backed [`LlmClient`].
///
/// The API key is not part of the client; it arrives per call so one client
/// serves both server-keyed and user-keyed jobs.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into(),
            model: model.into(),
        }
    }
}

impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        credential: &str,
        prompt: &str,
        max_units: usize,
    ) -> Result<String, SummariseError> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {credential}"))
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                max_tokens: max_units,
            })
            .send()
            .await
            .map_err(|e| SummariseError::Llm(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(SummariseError::Llm(format!(
                "chat completion failed: {status} {body}"
            )));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummariseError::Llm(format!("response parse error: {e}")))?;
        let content = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SummariseError::Llm("empty choices array".to_string()))?
            .message
            .content;
        Ok(content.trim().to_string())
    }
}
