use std::sync::Arc;

use serde_json::json;

use super::transport::GeminiTransport;
use crate::{
    error::{Result, StudioError},
    models::{
        response_schema, AnalysisModel, AnalysisResult, Content, GenerateContentResponse,
        ImageInput, Part, ANALYSIS_INSTRUCTION, ANALYSIS_TEMPERATURE,
    },
};

#[derive(Clone)]
pub struct AnalysisClient {
    transport: Arc<dyn GeminiTransport>,
}

impl AnalysisClient {
    pub fn new(transport: Arc<dyn GeminiTransport>) -> Self {
        Self { transport }
    }

    /// Estimate age, gender and expression of the person in `image`.
    ///
    /// The service enforces the four-field schema; anything that still does
    /// not parse strictly is a `SchemaViolation`.
    pub async fn analyze_face(
        &self,
        image: &ImageInput,
        model: AnalysisModel,
    ) -> Result<AnalysisResult> {
        if image.data.is_empty() {
            return Err(StudioError::InvalidRequest("image is empty".into()));
        }

        let model_id = model.model_id();
        let contents = vec![Content::user(vec![
            Part::inline(image.mime_type.clone(), &image.data),
            Part::text(ANALYSIS_INSTRUCTION),
        ])];
        let payload = json!({
            "contents": contents,
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
                "temperature": ANALYSIS_TEMPERATURE
            }
        });

        log::info!("Analyzing face with model: {}", model_id);

        let value = self
            .transport
            .post(&format!("models/{}:generateContent", model_id), &payload)
            .await?;
        let response: GenerateContentResponse = serde_json::from_value(value)?;

        let text = response
            .text()
            .ok_or_else(|| StudioError::SchemaViolation("No response from model".into()))?;
        log::debug!("Analysis raw response: {}", text);

        serde_json::from_str::<AnalysisResult>(text.trim()).map_err(|e| {
            StudioError::SchemaViolation(format!("analysis response does not match schema: {}", e))
        })
    }
}
