use serde::{Deserialize, Serialize};

use super::{AnalysisModel, ChatMode, DEFAULT_SPEECH_MODEL};
use crate::config::DEFAULT_VIDEO_MODEL;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub category: ModelCategory,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ModelCategory {
    Vision,
    Speech,
    Chat,
    Video,
}

fn info(id: &str, name: &str, category: ModelCategory, description: &str) -> ModelInfo {
    ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        category,
        description: description.to_string(),
    }
}

/// Models the clients call by default.
pub fn default_models() -> Vec<ModelInfo> {
    vec![
        info(
            AnalysisModel::Fast.model_id(),
            "Flash Lite",
            ModelCategory::Vision,
            "Fast face and expression analysis",
        ),
        info(
            AnalysisModel::Detailed.model_id(),
            "Pro",
            ModelCategory::Vision,
            "Detailed face and expression analysis",
        ),
        info(
            DEFAULT_SPEECH_MODEL,
            "Flash TTS",
            ModelCategory::Speech,
            "Text to speech, raw PCM output",
        ),
        info(
            ChatMode::Reasoning.model_id(),
            "Pro Thinking",
            ModelCategory::Chat,
            "Chat with an extended reasoning budget",
        ),
        info(
            ChatMode::Grounded.model_id(),
            "Flash + Search",
            ModelCategory::Chat,
            "Chat grounded in live web search",
        ),
        info(
            DEFAULT_VIDEO_MODEL,
            "Veo Fast",
            ModelCategory::Video,
            "Text and image to video, long-running operation",
        ),
    ]
}
