use std::sync::Arc;

use serde_json::{json, Value};

use super::transport::GeminiTransport;
use crate::{
    error::{Result, StudioError},
    models::{
        ChatMessage, ChatMode, ChatReply, Content, GenerateContentResponse, EMPTY_REPLY_FALLBACK,
        THINKING_BUDGET,
    },
};

#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn GeminiTransport>,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn GeminiTransport>) -> Self {
        Self { transport }
    }

    /// Send `message` after the full prior `history`. No server-side session
    /// is assumed: every call carries every turn.
    pub async fn send(
        &self,
        history: &[ChatMessage],
        message: &str,
        mode: ChatMode,
    ) -> Result<ChatReply> {
        if message.trim().is_empty() {
            return Err(StudioError::InvalidRequest("message is empty".into()));
        }

        let model_id = mode.model_id();
        let payload = build_payload(history, message, mode);

        log::info!(
            "Sending chat turn {} to {} ({:?})",
            history.len() + 1,
            model_id,
            mode
        );

        let value = self
            .transport
            .post(&format!("models/{}:generateContent", model_id), &payload)
            .await?;
        let response: GenerateContentResponse = serde_json::from_value(value)
            .map_err(|e| StudioError::SchemaViolation(format!("malformed chat response: {}", e)))?;

        let grounding_urls = response.grounding_urls();
        let text = response.text().unwrap_or_else(|| {
            log::warn!("Chat response from {} carried no text", model_id);
            EMPTY_REPLY_FALLBACK.to_string()
        });

        Ok(ChatReply {
            text,
            grounding_urls,
        })
    }
}

fn build_payload(history: &[ChatMessage], message: &str, mode: ChatMode) -> Value {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|turn| Content::with_role(turn.role.as_str(), turn.text.clone()))
        .collect();
    contents.push(Content::with_role("user", message));

    let mut payload = json!({ "contents": contents });
    match mode {
        ChatMode::Grounded => {
            payload["tools"] = json!([{ "googleSearch": {} }]);
        }
        ChatMode::Reasoning => {
            payload["generationConfig"] = json!({
                "thinkingConfig": { "thinkingBudget": THINKING_BUDGET }
            });
        }
    }
    payload
}

/// Append-only conversation history.
///
/// A turn is recorded only once the model has answered; a failed exchange
/// leaves the history untouched.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub async fn send(
        &mut self,
        client: &ChatClient,
        message: &str,
        mode: ChatMode,
    ) -> Result<&ChatMessage> {
        let reply = client.send(&self.history, message, mode).await?;

        self.history.push(ChatMessage::user(message));
        let mut answer = ChatMessage::model(reply.text);
        answer.is_thinking = Some(mode == ChatMode::Reasoning);
        if !reply.grounding_urls.is_empty() {
            answer.grounding_urls = Some(reply.grounding_urls);
        }
        self.history.push(answer);

        Ok(&self.history[self.history.len() - 1])
    }
}
