use serde::{Deserialize, Serialize};

pub const EMPTY_REPLY_FALLBACK: &str = "I couldn't generate a response.";
pub const THINKING_BUDGET: u32 = 32768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_thinking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding_urls: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            text: text.into(),
            is_thinking: None,
            grounding_urls: None,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Model,
            text: text.into(),
            is_thinking: None,
            grounding_urls: None,
        }
    }
}

/// Per-call mode. Search grounding and extended reasoning never combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatMode {
    #[default]
    Reasoning,
    Grounded,
}

impl ChatMode {
    pub fn model_id(&self) -> &'static str {
        match self {
            ChatMode::Reasoning => "gemini-3-pro-preview",
            ChatMode::Grounded => "gemini-2.5-flash",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub text: String,
    pub grounding_urls: Vec<String>,
}
