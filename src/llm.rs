//! Model Caller
//!
//! `ModelCaller` is the seam between the workflow and the language model.
//! `AzureChatClient` talks to an Azure OpenAI chat-completions deployment.

use crate::agent::state::ChatMessage;
use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Errors from a model round trip
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model client not configured: {0}")]
    NotConfigured(String),

    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model API error {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Model returned no content")]
    EmptyResponse,
}

/// Anything that can turn an ordered list of messages into generated text
#[async_trait]
pub trait ModelCaller: Send + Sync {
    /// Model identifier for logging
    fn name(&self) -> &str;

    /// Generate a reply for the given conversation
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Chat-completions response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

/// Azure OpenAI chat-completions client
#[derive(Clone)]
pub struct AzureChatClient {
    client: Client,
    endpoint: Option<String>,
    deployment: Option<String>,
    api_version: String,
    api_key: Option<String>,
    model: String,
}

impl AzureChatClient {
    /// Create from config
    pub fn from_config(config: &Config) -> Result<Self, ModelError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.model_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: config.azure_endpoint.clone(),
            deployment: config.azure_deployment.clone(),
            api_version: config.azure_api_version.clone(),
            api_key: config.azure_api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Check if endpoint, deployment and key are all present
    pub fn is_available(&self) -> bool {
        self.endpoint.is_some() && self.deployment.is_some() && self.api_key.is_some()
    }

    /// Full chat-completions URL for the configured deployment
    fn completions_url(&self) -> Result<String, ModelError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| ModelError::NotConfigured("AZURE_OPENAI_ENDPOINT not set".into()))?;
        let deployment = self
            .deployment
            .as_deref()
            .ok_or_else(|| ModelError::NotConfigured("AZURE_OPENAI_DEPLOYMENT not set".into()))?;

        Ok(format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            self.api_version
        ))
    }
}

#[async_trait]
impl ModelCaller for AzureChatClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let url = self.completions_url()?;
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ModelError::NotConfigured("AZURE_OPENAI_KEY not set".into()))?;

        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        debug!(
            "Calling Azure OpenAI: model={}, messages={}, prompt_len={}",
            self.model,
            messages.len(),
            messages.iter().map(|m| m.content.len()).sum::<usize>()
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(ModelError::Api { status, body });
        }

        let result: ChatResponse = response.json().await?;

        if let Some(usage) = &result.usage {
            info!(
                "Model response: model={}, in={}, out={}",
                self.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ModelError::EmptyResponse)
    }
}
