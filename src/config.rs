use std::env;
use std::time::Duration;

use crate::error::{Result, StudioError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub request_timeout: Option<Duration>,
    pub video: VideoConfig,
}

#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub model: String,
    pub poll_interval: Duration,
    /// Upper bound on status refreshes; `None` polls until the job finishes.
    pub max_status_checks: Option<u32>,
    /// Upper bound on the whole job, submission included.
    pub max_wait: Option<Duration>,
    pub poll_retry: PollRetryConfig,
}

/// Retry policy for failed status refreshes.
///
/// The default performs no retries: a failed refresh ends the job.
#[derive(Debug, Clone, PartialEq)]
pub struct PollRetryConfig {
    pub max_retries: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gemini: GeminiConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            base_url: None,
            request_timeout: None,
            video: VideoConfig::default(),
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url = env::var("GEMINI_BASE_URL").ok();

        GeminiConfig {
            api_key,
            base_url,
            request_timeout: None,
            video: VideoConfig::from_env(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_video(mut self, video: VideoConfig) -> Self {
        self.video = video;
        self
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                StudioError::ConfigError(
                    "Gemini API key is required (set GEMINI_API_KEY or API_KEY)".into(),
                )
            })
    }

    /// Base URL normalized to end with a slash.
    pub fn base_url(&self) -> String {
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        VideoConfig {
            model: DEFAULT_VIDEO_MODEL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_status_checks: None,
            max_wait: None,
            poll_retry: PollRetryConfig::default(),
        }
    }
}

impl VideoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let model = env::var("VEO_MODEL").unwrap_or(defaults.model);
        let poll_interval = positive_secs(env::var("VEO_POLL_INTERVAL_SECS").ok())
            .unwrap_or(defaults.poll_interval);
        let max_status_checks = env::var("VEO_MAX_STATUS_CHECKS")
            .ok()
            .and_then(|s| s.parse().ok());
        let max_wait = positive_secs(env::var("VEO_MAX_WAIT_SECS").ok());
        let poll_retry = match env::var("VEO_POLL_RETRIES").ok().and_then(|s| s.parse().ok()) {
            Some(retries) => PollRetryConfig::network().with_max_retries(retries),
            None => defaults.poll_retry,
        };

        VideoConfig {
            model,
            poll_interval,
            max_status_checks,
            max_wait,
            poll_retry,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_status_checks(mut self, max: u32) -> Self {
        self.max_status_checks = Some(max);
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn with_poll_retry(mut self, retry: PollRetryConfig) -> Self {
        self.poll_retry = retry;
        self
    }
}

/// Whole seconds greater than zero; anything else is treated as unset.
fn positive_secs(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

impl Default for PollRetryConfig {
    fn default() -> Self {
        PollRetryConfig {
            max_retries: 0,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl PollRetryConfig {
    pub fn none() -> Self {
        Self::default()
    }

    /// Retry transient refresh failures a few times (1s initial, 30s max, 3 retries).
    pub fn network() -> Self {
        PollRetryConfig {
            max_retries: 3,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_intervals(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_interval = initial;
        self.max_interval = max;
        self
    }

    /// Backoff before retry number `attempt` (1-based), capped at `max_interval`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = (self.initial_interval.as_millis() as f64 * factor) as u64;
        Duration::from_millis(millis).min(self.max_interval)
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            gemini: GeminiConfig::from_env(),
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }
}
