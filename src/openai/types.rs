// OpenAI API request/response types
//
// The moderation body is read as untyped JSON and normalized into
// `ModerationVerdict`, so a schema drift on the classifier side shows up as
// a `Malformed` error instead of a panic or a silently empty verdict.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::OpenAiError;

#[derive(Debug, Clone, Serialize)]
pub struct ModerationRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

/// Classifier result in the one shape the rest of the crate understands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationVerdict {
    pub flagged: bool,
    /// Categories marked true, in stable (sorted) order
    pub categories: Vec<String>,
}

impl ModerationVerdict {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn flagged(categories: &[&str]) -> Self {
        Self {
            flagged: !categories.is_empty(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Normalize a moderation response body.
    ///
    /// Accepts `categories` either as a map of name → bool (`null` and
    /// non-bool values count as not flagged) or as a list of names. The
    /// verdict is flagged when the body says so or any category is set.
    pub fn from_response(body: &Value) -> Result<Self, OpenAiError> {
        let result = body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .ok_or_else(|| OpenAiError::Malformed("moderation response has no results".into()))?;

        let mut categories: Vec<String> = match result.get("categories") {
            Some(Value::Object(map)) => map
                .iter()
                .filter(|(_, v)| v.as_bool() == Some(true))
                .map(|(k, _)| k.clone())
                .collect(),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(OpenAiError::Malformed(format!(
                    "moderation categories has unexpected shape: {}",
                    other
                )))
            }
        };
        categories.sort();
        categories.dedup();

        let flagged = result
            .get("flagged")
            .and_then(Value::as_bool)
            .unwrap_or(false)
            || !categories.is_empty();

        Ok(Self {
            flagged,
            categories,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, trimmed
    pub fn text(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}
