// HTTP client for the OpenAI API

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::retry::{with_retry, RetryPolicy};
use super::types::{ChatMessage, ChatRequest, ChatResponse, ModerationRequest, ModerationVerdict};
use super::{CompletionProvider, ModerationProvider, OpenAiError};
use crate::config::OpenAiConfig;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const MODERATIONS_PATH: &str = "/v1/moderations";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    moderation_model: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            moderation_model: config.moderation_model.clone(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, OpenAiError> {
        self.api_key.as_deref().ok_or(OpenAiError::MissingApiKey)
    }

    /// POST `body` to `path` with retry on transient failures
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, OpenAiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let api_key = self.api_key()?;
        let url = format!("{}{}", self.base_url, path);
        with_retry(self.retry, OpenAiError::is_transient, || {
            self.post_once(&url, api_key, body)
        })
        .await
    }

    /// Send a single request (no retry)
    async fn post_once<B, R>(&self, url: &str, api_key: &str, body: &B) -> Result<R, OpenAiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        tracing::debug!(url, "Sending request to OpenAI API");

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| OpenAiError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ModerationProvider for OpenAiClient {
    async fn classify(&self, text: &str) -> Result<ModerationVerdict, OpenAiError> {
        let request = ModerationRequest {
            model: &self.moderation_model,
            input: text,
        };
        let body: Value = self.post(MODERATIONS_PATH, &request).await?;
        ModerationVerdict::from_response(&body)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, instructions: &str, prompt: &str) -> Result<String, OpenAiError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(instructions), ChatMessage::user(prompt)],
        };
        let response: ChatResponse = self.post(CHAT_COMPLETIONS_PATH, &request).await?;
        response
            .text()
            .ok_or_else(|| OpenAiError::Malformed("completion returned no text".into()))
    }
}
