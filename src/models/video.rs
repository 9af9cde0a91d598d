use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, StudioError};

pub const IMAGE_ONLY_PROMPT: &str = "Animate this image";
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Landscape
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Resolution {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "720p" | "720" => Ok(Resolution::P720),
            "1080p" | "1080" => Ok(Resolution::P1080),
            other => Err(StudioError::InvalidRequest(format!(
                "unsupported resolution: {}",
                other
            ))),
        }
    }
}

/// Raw image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(data: Vec<u8>) -> Self {
        Self::new(data, DEFAULT_IMAGE_MIME)
    }

    /// Guess the MIME type from a file extension, defaulting to JPEG.
    pub fn from_path_bytes(path: &str, data: Vec<u8>) -> Self {
        let lower = path.to_ascii_lowercase();
        let mime = if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".webp") {
            "image/webp"
        } else {
            DEFAULT_IMAGE_MIME
        };
        Self::new(data, mime)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: Option<String>,
    pub image: Option<ImageInput>,
    pub aspect_ratio: AspectRatio,
    /// Explicit output tier; see [`GenerationRequest::effective_resolution`].
    pub resolution: Option<Resolution>,
}

impl GenerationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    fn prompt_text(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt_text().is_none() && self.image.is_none() {
            return Err(StudioError::InvalidRequest(
                "a prompt or a reference image is required".into(),
            ));
        }
        if let Some(image) = &self.image {
            if image.data.is_empty() {
                return Err(StudioError::InvalidRequest(
                    "reference image is empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Image seeded jobs run on the cheaper 720p tier, pure text jobs on 1080p.
    pub fn effective_resolution(&self) -> Resolution {
        self.resolution.unwrap_or(if self.image.is_some() {
            Resolution::P720
        } else {
            Resolution::P1080
        })
    }

    /// Body for `models/{model}:predictLongRunning`.
    pub fn to_payload(&self) -> Value {
        let prompt = self.prompt_text().unwrap_or(IMAGE_ONLY_PROMPT);
        let mut instance = json!({ "prompt": prompt });
        if let Some(image) = &self.image {
            instance["image"] = json!({
                "bytesBase64Encoded": image.to_base64(),
                "mimeType": image.mime_type,
            });
        }

        json!({
            "instances": [instance],
            "parameters": {
                "aspectRatio": self.aspect_ratio.as_str(),
                "resolution": self.effective_resolution().as_str(),
                "sampleCount": 1
            }
        })
    }
}

/// Remote long-running job, as returned by submit and by every refresh.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub response: Option<OperationResponse>,
    pub error: Option<OperationStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratedSample {
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoRef {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationStatus {
    pub code: Option<i32>,
    pub message: Option<String>,
}

impl Operation {
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
    }

    pub fn filtered_reasons(&self) -> &[String] {
        self.response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .map(|r| r.rai_media_filtered_reasons.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    /// Directly playable locator; carries the credential as a query parameter.
    pub media_uri: String,
    pub operation_name: String,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub status_checks: u32,
}

/// Lifecycle of one video job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitting,
    Polling,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Submitting, JobState::Polling)
                | (JobState::Submitting, JobState::Failed)
                | (JobState::Polling, JobState::Polling)
                | (JobState::Polling, JobState::Succeeded)
                | (JobState::Polling, JobState::Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Submitting => "SUBMITTING",
            JobState::Polling => "POLLING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}
