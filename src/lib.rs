//! Async client for Gemini media generation: face analysis, speech,
//! chat and Veo video jobs driven over long-running operations.

pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;

pub use config::{Config, GeminiConfig, PollRetryConfig, VideoConfig};
pub use error::{Result, StudioError};
pub use gemini::{
    AnalysisClient, ChatClient, ChatSession, GeminiClient, GeminiTransport, HttpTransport,
    SpeechClient, VideoClient,
};
pub use models::*;
pub use tokio_util::sync::CancellationToken;
