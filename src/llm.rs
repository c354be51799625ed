use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::TARGET_LLM_REQUEST;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed")]
    Request(#[from] reqwest::Error),
    #[error("completion endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),
}

/// The seam between the orchestrator and the remote model. Implemented by the
/// real OpenRouter client below and by scripted fakes in tests.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends a (system role, user prompt) pair to the completion endpoint and
    /// returns the trimmed text of the first completion choice.
    async fn complete(&self, system_role: &str, user_prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

fn first_choice_content(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|err| LlmError::MalformedResponse(err.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::MalformedResponse("no completion choices returned".to_string()))?;

    Ok(choice.message.content.trim().to_string())
}

/// Chat-completion client for the OpenRouter API.
#[derive(Clone, Debug)]
pub struct OpenRouterClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    request_timeout: Duration,
}

impl OpenRouterClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, system_role: &str, user_prompt: &str) -> Result<String, LlmError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_role },
                { "role": "user", "content": user_prompt }
            ]
        });

        debug!(target: TARGET_LLM_REQUEST, model = %self.model, "sending completion request");

        let exchange = async {
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!(target: TARGET_LLM_REQUEST, %status, "completion endpoint returned an error");
                return Err(LlmError::Status { status, body });
            }

            let body = response.text().await?;
            first_choice_content(&body)
        };

        match timeout(self.request_timeout, exchange).await {
            Ok(result) => {
                if result.is_ok() {
                    debug!(target: TARGET_LLM_REQUEST, "completion response received");
                }
                result
            }
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, "completion request timed out");
                Err(LlmError::Timeout(self.request_timeout))
            }
        }
    }
}
