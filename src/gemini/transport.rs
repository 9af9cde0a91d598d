use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::{
    config::GeminiConfig,
    error::{Result, StudioError},
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

/// JSON request/response seam between the clients and the REST API.
///
/// Paths are relative to the API base, e.g. `models/gemini-2.5-flash:generateContent`
/// or an operation name such as `models/veo/operations/abc`.
#[async_trait]
pub trait GeminiTransport: Send + Sync {
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;

    async fn get(&self, path: &str) -> Result<Value>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| StudioError::ConfigError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_response(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if status.is_success() {
            return response.json::<Value>().await.map_err(StudioError::from);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        log::error!("Gemini API returned {}: {}", status, message);
        Err(classify_status(status, message))
    }
}

/// Pull `error.message` out of a Google API error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

fn classify_status(status: StatusCode, message: String) -> StudioError {
    let unauthorized = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || (status == StatusCode::NOT_FOUND && message.contains(ENTITY_NOT_FOUND));
    if unauthorized {
        StudioError::AuthorizationError(message)
    } else {
        StudioError::ApiError {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl GeminiTransport for HttpTransport {
    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("POST {} failed: {}", path, e)))?;

        Self::read_response(response).await
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("GET {} failed: {}", path, e)))?;

        Self::read_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport_for(server: &MockServer) -> HttpTransport {
        let config = GeminiConfig::new()
            .with_api_key("test-key")
            .with_base_url(format!("{}/v1beta", server.uri()));
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            HttpTransport::new(&GeminiConfig::new()),
            Err(StudioError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_post_sends_key_header_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/veo:predictLongRunning"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(json!({ "instances": [] })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "name": "operations/1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let value = transport_for(&server)
            .post("models/veo:predictLongRunning", &json!({ "instances": [] }))
            .await
            .unwrap();
        assert_eq!(value["name"], "operations/1");
    }

    #[tokio::test]
    async fn test_entity_not_found_is_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "code": 404,
                    "message": "Requested entity was not found.",
                    "status": "NOT_FOUND"
                }
            })))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .post("models/veo:predictLongRunning", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::AuthorizationError(ref m) if m.contains("Requested entity")));
    }

    #[tokio::test]
    async fn test_forbidden_is_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .get("models/veo/operations/1")
            .await
            .unwrap_err();
        assert!(err.is_authorization());
    }

    #[tokio::test]
    async fn test_server_error_is_transient_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models/veo/operations/1"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": { "code": 503, "message": "The service is currently unavailable." }
            })))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .get("models/veo/operations/1")
            .await
            .unwrap_err();
        match &err {
            StudioError::ApiError { status, message } => {
                assert_eq!(*status, 503);
                assert_eq!(message, "The service is currently unavailable.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_non_json_success_is_schema_violation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = transport_for(&server).get("anything").await.unwrap_err();
        assert!(matches!(err, StudioError::SchemaViolation(_)));
    }
}
