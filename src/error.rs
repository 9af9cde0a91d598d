use thiserror::Error;

const AUTH_RESELECT_MESSAGE: &str =
    "API Key authorization failed. Please try again and select a valid project.";
const VIDEO_FAILED_MESSAGE: &str =
    "Video generation failed. Ensure your project has Veo access enabled.";

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connection, timeout or other transport level failure.
    #[error("Request error: {0}")]
    RequestError(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// The remote service rejected the credential or the project behind it.
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// The response could not be read into the expected structured shape.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Submission error: {0}")]
    SubmissionError(Box<StudioError>),

    #[error("Polling error after {status_checks} status checks: {source}")]
    PollingError {
        status_checks: u32,
        #[source]
        source: Box<StudioError>,
    },

    /// The remote call completed but produced nothing usable.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Operation {operation} failed remotely: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("Operation {operation} timed out after {status_checks} status checks")]
    Timeout {
        operation: String,
        status_checks: u32,
    },

    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl StudioError {
    /// Whether retrying the same call later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StudioError::RequestError(_) => true,
            StudioError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_authorization(&self) -> bool {
        match self {
            StudioError::AuthorizationError(_) => true,
            StudioError::SubmissionError(inner) => inner.is_authorization(),
            _ => false,
        }
    }

    /// Message suitable for showing to an end user of the video workflow.
    pub fn user_message(&self) -> String {
        if self.is_authorization() {
            return AUTH_RESELECT_MESSAGE.to_string();
        }
        match self {
            StudioError::InvalidRequest(msg) | StudioError::ConfigError(msg) => msg.clone(),
            StudioError::Cancelled(_) => "Video generation was cancelled.".to_string(),
            StudioError::Timeout { .. } => {
                "Video generation is taking too long. Please try again later.".to_string()
            }
            _ => VIDEO_FAILED_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => StudioError::ApiError {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None if e.is_decode() => StudioError::SchemaViolation(e.to_string()),
            None => StudioError::RequestError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(e: serde_json::Error) -> Self {
        StudioError::SchemaViolation(e.to_string())
    }
}

impl From<base64::DecodeError> for StudioError {
    fn from(e: base64::DecodeError) -> Self {
        StudioError::SchemaViolation(format!("invalid base64 payload: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StudioError::RequestError("reset".into()).is_transient());
        assert!(StudioError::ApiError {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());
        assert!(StudioError::ApiError {
            status: 429,
            message: "quota".into()
        }
        .is_transient());
        assert!(!StudioError::ApiError {
            status: 400,
            message: "bad".into()
        }
        .is_transient());
        assert!(!StudioError::AuthorizationError("denied".into()).is_transient());
    }

    #[test]
    fn test_authorization_through_submission() {
        let err = StudioError::SubmissionError(Box::new(StudioError::AuthorizationError(
            "Requested entity was not found.".into(),
        )));
        assert!(err.is_authorization());
        assert_eq!(err.user_message(), AUTH_RESELECT_MESSAGE);

        let other = StudioError::SubmissionError(Box::new(StudioError::ApiError {
            status: 400,
            message: "bad prompt".into(),
        }));
        assert!(!other.is_authorization());
        assert_eq!(other.user_message(), VIDEO_FAILED_MESSAGE);
    }

    #[test]
    fn test_polling_error_display_keeps_source() {
        let err = StudioError::PollingError {
            status_checks: 3,
            source: Box::new(StudioError::RequestError("connection reset".into())),
        };
        let text = err.to_string();
        assert!(text.contains("3 status checks"));
        assert!(text.contains("connection reset"));
    }
}
