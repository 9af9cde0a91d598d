use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::transport::GeminiTransport;
use crate::{
    config::VideoConfig,
    error::{Result, StudioError},
    logger,
    models::{AspectRatio, GenerationRequest, GenerationResult, JobState, Operation, Resolution},
};

const CREDENTIAL_PARAM: &str = "key";

/// Drives text/image to video jobs: submit, poll the long-running operation
/// until it reports done, then hand back a playable locator.
///
/// Every call owns its own operation; clones share only the transport and
/// the read-only credential.
#[derive(Clone)]
pub struct VideoClient {
    transport: Arc<dyn GeminiTransport>,
    api_key: String,
    config: VideoConfig,
}

/// Per-call bookkeeping for one job.
struct VideoJob {
    id: String,
    state: JobState,
    operation_name: Option<String>,
    status_checks: u32,
    aspect_ratio: AspectRatio,
    resolution: Resolution,
}

impl VideoJob {
    fn new(request: &GenerationRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: JobState::Submitting,
            operation_name: None,
            status_checks: 0,
            aspect_ratio: request.aspect_ratio,
            resolution: request.effective_resolution(),
        }
    }

    fn transition(&mut self, next: JobState) {
        if !self.state.can_transition_to(next) {
            log::warn!(
                "Video job {} ignored invalid transition {} -> {}",
                self.id,
                self.state,
                next
            );
            return;
        }
        if self.state != next {
            log::info!("Video job {}: {} -> {}", self.id, self.state, next);
        }
        self.state = next;
    }

    fn operation_label(&self) -> String {
        self.operation_name
            .clone()
            .unwrap_or_else(|| format!("<unsubmitted job {}>", self.id))
    }
}

impl VideoClient {
    pub fn new(
        transport: Arc<dyn GeminiTransport>,
        api_key: impl Into<String>,
        config: VideoConfig,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            config,
        }
    }

    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    pub async fn submit(&self, request: GenerationRequest) -> Result<GenerationResult> {
        self.submit_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Same as [`VideoClient::submit`], aborting with `Cancelled` as soon as
    /// `cancel` fires at any suspension point.
    pub async fn submit_with_cancel(
        &self,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        request.validate()?;

        let mut job = VideoJob::new(&request);
        let _timer = logger::timer(&format!("video job {}", job.id));
        log::info!(
            "Video job {} submitting to {} ({}, {}, image seed: {})",
            job.id,
            self.config.model,
            job.aspect_ratio,
            job.resolution,
            request.image.is_some()
        );

        let outcome = match self.config.max_wait {
            Some(limit) => {
                let timed = tokio::time::timeout(limit, self.run(&mut job, &request, cancel)).await;
                match timed {
                    Ok(outcome) => outcome,
                    Err(_) => Err(StudioError::Timeout {
                        operation: job.operation_label(),
                        status_checks: job.status_checks,
                    }),
                }
            }
            None => self.run(&mut job, &request, cancel).await,
        };

        match &outcome {
            Ok(result) => {
                job.transition(JobState::Succeeded);
                log::info!(
                    "Video job {} finished after {} status checks",
                    job.id,
                    result.status_checks
                );
            }
            Err(e) => {
                job.transition(JobState::Failed);
                log::error!("Video job {} failed: {}", job.id, e);
            }
        }
        outcome
    }

    async fn run(
        &self,
        job: &mut VideoJob,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        let operation = self.create_job(request, cancel).await?;
        job.operation_name = Some(operation.name.clone());
        job.transition(JobState::Polling);

        let operation = self.poll_until_done(job, operation, cancel).await?;
        let media_uri = self.playable_uri(&operation)?;

        Ok(GenerationResult {
            media_uri,
            operation_name: operation.name,
            aspect_ratio: job.aspect_ratio,
            resolution: job.resolution,
            status_checks: job.status_checks,
        })
    }

    async fn create_job(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Operation> {
        let path = format!("models/{}:predictLongRunning", self.config.model);
        let payload = request.to_payload();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(StudioError::Cancelled("video job cancelled during submission".into()));
            }
            response = self.transport.post(&path, &payload) => response,
        };

        let value = response.map_err(|e| {
            if e.is_authorization() {
                e
            } else {
                StudioError::SubmissionError(Box::new(e))
            }
        })?;

        let operation = parse_operation(value)?;
        if operation.name.is_empty() {
            return Err(StudioError::SchemaViolation(
                "create-job response carried no operation name".into(),
            ));
        }
        log::debug!("Video operation created: {}", operation.name);
        Ok(operation)
    }

    async fn poll_until_done(
        &self,
        job: &mut VideoJob,
        mut operation: Operation,
        cancel: &CancellationToken,
    ) -> Result<Operation> {
        while !operation.done {
            if let Some(max) = self.config.max_status_checks {
                if job.status_checks >= max {
                    return Err(StudioError::Timeout {
                        operation: operation.name,
                        status_checks: job.status_checks,
                    });
                }
            }

            pause(self.config.poll_interval, cancel, &operation.name).await?;
            job.status_checks += 1;
            job.transition(JobState::Polling);

            let refreshed = self
                .refresh(&operation.name, job.status_checks, cancel)
                .await?;
            log::debug!(
                "Operation {} status check {}: done={}",
                operation.name,
                job.status_checks,
                refreshed.done
            );
            operation = refreshed;
        }
        Ok(operation)
    }

    /// One status refresh, retried on transient failures per `poll_retry`.
    async fn refresh(
        &self,
        name: &str,
        status_checks: u32,
        cancel: &CancellationToken,
    ) -> Result<Operation> {
        let retry = &self.config.poll_retry;
        let mut attempt = 0u32;

        loop {
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(name)),
                response = self.transport.get(name) => response,
            };

            match response.and_then(parse_operation) {
                Ok(mut operation) => {
                    if operation.name.is_empty() {
                        operation.name = name.to_string();
                    }
                    return Ok(operation);
                }
                Err(err) => {
                    attempt += 1;
                    if !err.is_transient() || attempt > retry.max_retries {
                        return Err(StudioError::PollingError {
                            status_checks,
                            source: Box::new(err),
                        });
                    }
                    let delay = retry.backoff(attempt);
                    log::warn!(
                        "Status check {} for {} failed ({}), retry {}/{} in {:?}",
                        status_checks,
                        name,
                        err,
                        attempt,
                        retry.max_retries,
                        delay
                    );
                    pause(delay, cancel, name).await?;
                }
            }
        }
    }

    fn playable_uri(&self, operation: &Operation) -> Result<String> {
        if let Some(status) = &operation.error {
            return Err(StudioError::OperationFailed {
                operation: operation.name.clone(),
                message: status
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("error code {:?}", status.code)),
            });
        }

        let uri = operation.video_uri().ok_or_else(|| {
            let reasons = operation.filtered_reasons();
            let detail = if reasons.is_empty() {
                String::new()
            } else {
                format!(" (filtered: {})", reasons.join("; "))
            };
            StudioError::EmptyResult(format!(
                "operation {} finished without a video URI{}",
                operation.name, detail
            ))
        })?;

        log::info!("Video ready at {}", uri);
        append_credential(uri, &self.api_key)
    }
}

fn parse_operation(value: Value) -> Result<Operation> {
    serde_json::from_value(value)
        .map_err(|e| StudioError::SchemaViolation(format!("malformed operation: {}", e)))
}

fn cancelled(name: &str) -> StudioError {
    StudioError::Cancelled(format!("video job cancelled while waiting on {}", name))
}

async fn pause(delay: Duration, cancel: &CancellationToken, name: &str) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled(name)),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Set the API key as the `key` query parameter so the URI can be fetched
/// directly. A `key` already present is replaced; other pairs keep their order.
pub fn append_credential(uri: &str, api_key: &str) -> Result<String> {
    let mut url = Url::parse(uri)
        .map_err(|e| StudioError::SchemaViolation(format!("invalid media URI {}: {}", uri, e)))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != CREDENTIAL_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(CREDENTIAL_PARAM, api_key);
    Ok(url.to_string())
}
