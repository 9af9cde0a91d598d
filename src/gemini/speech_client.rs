use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

use super::transport::GeminiTransport;
use crate::{
    error::{Result, StudioError},
    models::{Content, GenerateContentResponse, Part, SpeechAudio, DEFAULT_SPEECH_MODEL, DEFAULT_VOICE},
};

#[derive(Clone)]
pub struct SpeechClient {
    transport: Arc<dyn GeminiTransport>,
    model: String,
    voice: String,
}

impl SpeechClient {
    pub fn new(transport: Arc<dyn GeminiTransport>) -> Self {
        Self {
            transport,
            model: DEFAULT_SPEECH_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        if text.trim().is_empty() {
            return Err(StudioError::InvalidRequest("nothing to synthesize".into()));
        }

        let contents = vec![Content {
            role: None,
            parts: vec![Part::text(text)],
        }];
        let payload = json!({
            "contents": contents,
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.voice }
                    }
                }
            }
        });

        log::info!("Synthesizing speech with {} (voice {})", self.model, self.voice);

        let value = self
            .transport
            .post(&format!("models/{}:generateContent", self.model), &payload)
            .await?;
        let response: GenerateContentResponse = serde_json::from_value(value)?;

        let inline = response
            .first_inline_data()
            .ok_or_else(|| StudioError::EmptyResult("No audio generated".into()))?;
        let data = STANDARD.decode(inline.data.as_bytes())?;
        if data.is_empty() {
            return Err(StudioError::EmptyResult("No audio generated".into()));
        }

        log::debug!("Received {} bytes of {}", data.len(), inline.mime_type);
        Ok(SpeechAudio {
            data,
            mime_type: inline.mime_type.clone(),
        })
    }
}
