// OpenAI API support
//
// Two capabilities are consumed: content classification (moderation) and
// text completion (prompt / roast / summarize / analyze). Both sit behind
// traits so the pipeline and commands can be exercised with fakes.

pub mod client;
pub mod retry;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::OpenAiClient;
pub use retry::RetryPolicy;
pub use types::ModerationVerdict;

/// Instructions sent with every completion unless a command supplies its own
pub const DEFAULT_INSTRUCTIONS: &str = "You are an AI assistant.";

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("OpenAI API key is not configured.")]
    MissingApiKey,

    #[error("request to OpenAI failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected OpenAI response: {0}")]
    Malformed(String),
}

impl OpenAiError {
    /// Network failures, rate limits and server errors are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            OpenAiError::Http(_) => true,
            OpenAiError::Status { status, .. } => *status == 429 || *status >= 500,
            OpenAiError::MissingApiKey | OpenAiError::Malformed(_) => false,
        }
    }

    /// Text shown in chat when a request fails
    pub fn user_message(&self) -> &'static str {
        match self {
            OpenAiError::MissingApiKey => "OpenAI API key is not configured.",
            _ => "Sorry, something went wrong processing your request.",
        }
    }
}

/// Content classifier
#[async_trait]
pub trait ModerationProvider: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ModerationVerdict, OpenAiError>;
}

/// Text completion
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, instructions: &str, prompt: &str) -> Result<String, OpenAiError>;
}
