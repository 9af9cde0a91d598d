pub mod analysis_client;
pub mod chat_client;
pub mod speech_client;
pub mod transport;
pub mod video_client;

#[cfg(test)]
pub(crate) mod mock;

use crate::{
    config::GeminiConfig,
    error::Result,
    models::{AnalysisModel, AnalysisResult, ImageInput, SpeechAudio},
};
use std::sync::Arc;

pub use analysis_client::AnalysisClient;
pub use chat_client::{ChatClient, ChatSession};
pub use speech_client::SpeechClient;
pub use transport::{GeminiTransport, HttpTransport};
pub use video_client::VideoClient;

#[derive(Clone)]
pub struct GeminiClient {
    analysis_client: AnalysisClient,
    speech_client: SpeechClient,
    chat_client: ChatClient,
    video_client: VideoClient,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(transport, config)
    }

    /// Build the sub-clients on top of any transport, e.g. a recorded one in tests.
    pub fn with_transport(transport: Arc<dyn GeminiTransport>, config: GeminiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        log::info!(
            "Gemini client ready (base {}, video model {})",
            config.base_url(),
            config.video.model
        );

        Ok(Self {
            analysis_client: AnalysisClient::new(transport.clone()),
            speech_client: SpeechClient::new(transport.clone()),
            chat_client: ChatClient::new(transport.clone()),
            video_client: VideoClient::new(transport, api_key, config.video),
        })
    }

    pub fn analysis(&self) -> &AnalysisClient {
        &self.analysis_client
    }

    pub fn speech(&self) -> &SpeechClient {
        &self.speech_client
    }

    pub fn chat(&self) -> &ChatClient {
        &self.chat_client
    }

    pub fn video(&self) -> &VideoClient {
        &self.video_client
    }

    /// Analyze a face, then read the result aloud.
    pub async fn describe_and_speak(
        &self,
        image: &ImageInput,
        model: AnalysisModel,
    ) -> Result<(AnalysisResult, SpeechAudio)> {
        let analysis = self.analysis_client.analyze_face(image, model).await?;
        let audio = self
            .speech_client
            .synthesize(&analysis.spoken_summary())
            .await?;
        Ok((analysis, audio))
    }
}
