use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const ANALYSIS_INSTRUCTION: &str = "Analyze the person in this image. Identify their estimated age, gender, and facial expression. Be concise.";
pub const ANALYSIS_TEMPERATURE: f32 = 0.4;

/// Which remote model variant runs the inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisModel {
    /// Low latency, lower accuracy.
    #[default]
    Fast,
    /// Slower, more detailed.
    Detailed,
}

impl AnalysisModel {
    pub fn model_id(&self) -> &'static str {
        match self {
            AnalysisModel::Fast => "gemini-2.5-flash-lite",
            AnalysisModel::Detailed => "gemini-3-pro-preview",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisResult {
    pub age: String,
    pub gender: String,
    pub expression: String,
    pub summary: String,
}

impl AnalysisResult {
    /// Short sentence describing the result, meant to be read aloud.
    pub fn spoken_summary(&self) -> String {
        format!(
            "I see a {} around {} years old. They look {}.",
            self.gender, self.age, self.expression
        )
    }
}

/// JSON schema the service enforces on the structured answer.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "age": { "type": "STRING", "description": "Estimated age or age range" },
            "gender": { "type": "STRING", "description": "Estimated gender" },
            "expression": { "type": "STRING", "description": "Facial expression/emotion" },
            "summary": {
                "type": "STRING",
                "description": "A brief personality or mood summary based on visual cues"
            }
        },
        "required": ["age", "gender", "expression", "summary"]
    })
}
