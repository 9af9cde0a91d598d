use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use genstudio::{
    AspectRatio, GeminiTransport, GenerationRequest, ImageInput, Resolution, StudioError,
    VideoClient, VideoConfig,
};
use serde_json::{json, Value};

const VIDEO_URI: &str = "https://generativelanguage.googleapis.com/v1beta/files/abc:download?alt=media";

/// Scripted Veo backend: every created operation reports done after a fixed
/// number of pending refreshes.
struct ScriptedVeo {
    pending_polls: u32,
    create_error: Option<fn() -> StudioError>,
    empty_result: bool,
    state: Mutex<ScriptState>,
}

#[derive(Default)]
struct ScriptState {
    creates: Vec<Value>,
    gets: Vec<String>,
    remaining: HashMap<String, u32>,
    next_id: u32,
}

impl ScriptedVeo {
    fn new(pending_polls: u32) -> Self {
        Self {
            pending_polls,
            create_error: None,
            empty_result: false,
            state: Mutex::new(ScriptState::default()),
        }
    }

    fn failing_create(mut self, error: fn() -> StudioError) -> Self {
        self.create_error = Some(error);
        self
    }

    fn without_samples(mut self) -> Self {
        self.empty_result = true;
        self
    }

    fn creates(&self) -> Vec<Value> {
        self.state.lock().unwrap().creates.clone()
    }

    fn gets(&self) -> Vec<String> {
        self.state.lock().unwrap().gets.clone()
    }

    fn finished(&self, name: &str) -> Value {
        let samples = if self.empty_result {
            json!([])
        } else {
            // Tag the URI with the operation so callers can be told apart.
            json!([{ "video": { "uri": format!("{}&op={}", VIDEO_URI, name.rsplit('/').next().unwrap()) } }])
        };
        json!({
            "name": name,
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": samples } }
        })
    }
}

#[async_trait]
impl GeminiTransport for ScriptedVeo {
    async fn post(&self, path: &str, body: &Value) -> genstudio::Result<Value> {
        assert!(path.ends_with(":predictLongRunning"), "unexpected POST {}", path);
        if let Some(error) = self.create_error {
            self.state.lock().unwrap().creates.push(body.clone());
            return Err(error());
        }

        let mut state = self.state.lock().unwrap();
        state.creates.push(body.clone());
        state.next_id += 1;
        let aspect = body["parameters"]["aspectRatio"]
            .as_str()
            .unwrap()
            .replace(':', "x");
        let name = format!("models/veo/operations/{}-{}", aspect, state.next_id);
        state.remaining.insert(name.clone(), self.pending_polls);
        Ok(json!({ "name": name }))
    }

    async fn get(&self, path: &str) -> genstudio::Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.gets.push(path.to_string());
        let remaining = state
            .remaining
            .get_mut(path)
            .unwrap_or_else(|| panic!("status check for unknown operation {}", path));
        if *remaining > 0 {
            *remaining -= 1;
            return Ok(json!({ "name": path, "done": false }));
        }
        drop(state);
        Ok(self.finished(path))
    }
}

fn video_client(backend: Arc<ScriptedVeo>) -> VideoClient {
    VideoClient::new(
        backend,
        "integration-key",
        VideoConfig::default().with_poll_interval(Duration::from_secs(5)),
    )
}

#[tokio::test(start_paused = true)]
async fn test_text_job_submits_once_and_polls_until_done() {
    let backend = Arc::new(ScriptedVeo::new(3));
    let client = video_client(backend.clone());

    let result = client
        .submit(GenerationRequest::new().with_prompt("a lighthouse at dusk"))
        .await
        .unwrap();

    assert_eq!(backend.creates().len(), 1);
    assert_eq!(backend.gets().len(), 4);
    assert_eq!(result.status_checks, 4);
    assert_eq!(result.resolution, Resolution::P1080);
    assert_eq!(result.aspect_ratio, AspectRatio::Landscape);
    assert!(result.media_uri.ends_with("&key=integration-key"));
    assert!(result.media_uri.contains("alt=media"));

    let body = &backend.creates()[0];
    assert_eq!(body["instances"][0]["prompt"], "a lighthouse at dusk");
    assert!(body["instances"][0].get("image").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_image_only_job_uses_default_prompt() {
    let backend = Arc::new(ScriptedVeo::new(0));
    let client = video_client(backend.clone());

    let result = client
        .submit(GenerationRequest::new().with_image(ImageInput::jpeg(vec![0xff, 0xd8, 0xff])))
        .await
        .unwrap();

    assert_eq!(result.resolution, Resolution::P720);
    assert_eq!(backend.gets().len(), 1);

    let body = &backend.creates()[0];
    assert_eq!(body["instances"][0]["prompt"], "Animate this image");
    assert_eq!(body["instances"][0]["image"]["bytesBase64Encoded"], "/9j/");
    assert_eq!(body["instances"][0]["image"]["mimeType"], "image/jpeg");
    assert_eq!(body["parameters"]["resolution"], "720p");
}

#[tokio::test(start_paused = true)]
async fn test_prompt_and_image_job_submits_once() {
    let backend = Arc::new(ScriptedVeo::new(1));
    let client = video_client(backend.clone());

    let result = client
        .submit(
            GenerationRequest::new()
                .with_prompt("wave")
                .with_image(ImageInput::jpeg(vec![0xff])),
        )
        .await
        .unwrap();

    let creates = backend.creates();
    assert_eq!(creates.len(), 1);
    assert_eq!(backend.gets().len(), 2);
    assert_eq!(result.resolution, Resolution::P720);
    assert!(result.media_uri.ends_with("&key=integration-key"));

    let instance = &creates[0]["instances"][0];
    assert_eq!(instance["prompt"], "wave");
    assert_eq!(instance["image"]["bytesBase64Encoded"], "/w==");
    assert_eq!(instance["image"]["mimeType"], "image/jpeg");
    assert_eq!(creates[0]["parameters"]["resolution"], "720p");
}

#[tokio::test(start_paused = true)]
async fn test_portrait_round_trip() {
    let backend = Arc::new(ScriptedVeo::new(1));
    let client = video_client(backend.clone());

    let result = client
        .submit(
            GenerationRequest::new()
                .with_prompt("rain on a window")
                .with_aspect_ratio(AspectRatio::Portrait),
        )
        .await
        .unwrap();

    assert_eq!(backend.creates()[0]["parameters"]["aspectRatio"], "9:16");
    assert_eq!(result.aspect_ratio, AspectRatio::Portrait);
    assert!(result.operation_name.contains("9x16"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_jobs_stay_isolated() {
    let backend = Arc::new(ScriptedVeo::new(2));
    let client = video_client(backend.clone());

    let (landscape, portrait) = tokio::join!(
        client.submit(GenerationRequest::new().with_prompt("wide shot")),
        client.submit(
            GenerationRequest::new()
                .with_prompt("tall shot")
                .with_aspect_ratio(AspectRatio::Portrait)
        ),
    );
    let landscape = landscape.unwrap();
    let portrait = portrait.unwrap();

    assert_eq!(backend.creates().len(), 2);
    assert_eq!(backend.gets().len(), 6);
    assert_ne!(landscape.operation_name, portrait.operation_name);
    assert_ne!(landscape.media_uri, portrait.media_uri);
    assert!(landscape.operation_name.contains("16x9"));
    assert!(portrait.operation_name.contains("9x16"));
    assert_eq!(landscape.status_checks, 3);
    assert_eq!(portrait.status_checks, 3);
}

#[tokio::test(start_paused = true)]
async fn test_finished_without_video_is_empty_result() {
    let backend = Arc::new(ScriptedVeo::new(0).without_samples());
    let client = video_client(backend.clone());

    let err = client
        .submit(GenerationRequest::new().with_prompt("nothing"))
        .await
        .unwrap_err();

    assert!(matches!(err, StudioError::EmptyResult(_)));
    assert_eq!(
        err.user_message(),
        StudioError::EmptyResult(String::new()).user_message()
    );
}

#[tokio::test(start_paused = true)]
async fn test_authorization_failure_never_polls() {
    let backend = Arc::new(ScriptedVeo::new(0).failing_create(|| {
        StudioError::AuthorizationError("Requested entity was not found.".into())
    }));
    let client = video_client(backend.clone());

    let err = client
        .submit(GenerationRequest::new().with_prompt("anything"))
        .await
        .unwrap_err();

    assert!(err.is_authorization());
    assert_eq!(
        err.user_message(),
        "API Key authorization failed. Please try again and select a valid project."
    );
    assert_eq!(backend.creates().len(), 1);
    assert!(backend.gets().is_empty());
}

#[tokio::test]
async fn test_invalid_request_is_rejected_locally() {
    let backend = Arc::new(ScriptedVeo::new(0));
    let client = video_client(backend.clone());

    let err = client
        .submit(GenerationRequest::new().with_prompt("   "))
        .await
        .unwrap_err();

    assert!(matches!(err, StudioError::InvalidRequest(_)));
    assert!(backend.creates().is_empty());
}
