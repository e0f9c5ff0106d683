use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::classify::{StatusProfile, classify_status, classify_transport};
use crate::core::error::{ConfigError, ErrorKind, GenerationFailure, PollError, TransportError};
use crate::core::traits::ProviderAdapter;
use crate::core::types::{
    AdapterContext, GenerationRequest, JobStatus, MediaOutput, ProviderConfig, ProviderId,
    ProviderJob,
};
use crate::poll::{JobPoller, JobStatusSource, PollPolicy};
use crate::providers::{
    authorize, fetch_output, resolve_api_key, sanitize_api_key, validated_base_url,
};
use crate::transport::http::{DEFAULT_REQUEST_TIMEOUT_MS, HttpTransport};
use crate::transport::{Transport, TransportRequest};

/// Adapter for backends with asynchronous generation: one POST creates a
/// job, repeated GETs report status until terminal. Polling runs against
/// the caller's deadline; a cycle that fails to yield a job document counts
/// against the poll policy's transient tolerance.
pub struct JobPollAdapter {
    transport: Arc<dyn Transport>,
    poller: JobPoller,
    base_url: String,
    api_key: Option<String>,
}

impl JobPollAdapter {
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        Self::with_poll_policy(config, PollPolicy::default())
    }

    pub fn with_poll_policy(
        config: ProviderConfig,
        policy: PollPolicy,
    ) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(DEFAULT_REQUEST_TIMEOUT_MS)?;
        Self::with_transport(config, policy, Arc::new(transport))
    }

    pub fn with_transport(
        config: ProviderConfig,
        policy: PollPolicy,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            transport,
            poller: JobPoller::new(policy)?,
            base_url: validated_base_url(ProviderId::JobPoll, &config.base_url)?,
            api_key: sanitize_api_key(config.api_key),
        })
    }

    fn jobs_url(&self) -> String {
        format!("{}/jobs", self.base_url)
    }

    fn job_status_url(&self, job_id: &str) -> String {
        format!("{}/jobs/{job_id}", self.base_url)
    }

    async fn create_job(
        &self,
        req: &GenerationRequest,
        api_key: Option<&str>,
    ) -> Result<ProviderJob, GenerationFailure> {
        let url = self.jobs_url();
        let request = authorize(
            TransportRequest::post_json(&url, encode_create_body(req)),
            api_key,
        );

        debug!(provider = %self.id().as_str(), url = %url, "creating generation job");
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|error| classify_transport(&error))?;

        if !response.is_success() {
            return Err(classify_status(
                StatusProfile::Standard,
                response.status,
                &response.body,
            ));
        }

        parse_job_document(&response.body)
    }
}

#[async_trait]
impl ProviderAdapter for JobPollAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::JobPoll
    }

    async fn generate(
        &self,
        req: &GenerationRequest,
        ctx: &AdapterContext,
    ) -> Result<MediaOutput, GenerationFailure> {
        let api_key = resolve_api_key(self.api_key.as_deref(), ctx);

        let initial = self.create_job(req, api_key.as_deref()).await?;
        debug!(
            provider = %self.id().as_str(),
            job_id = %initial.id,
            status = ?initial.status,
            "job created"
        );

        let source = RemoteJobStatusSource {
            adapter: self,
            api_key: api_key.clone(),
        };
        let terminal = self
            .poller
            .wait_for_terminal(initial, &source, ctx.deadline)
            .await
            .map_err(|error| match error {
                PollError::DeadlineExceeded { .. } => {
                    GenerationFailure::new(ErrorKind::TransportTimeout, error.to_string())
                }
                PollError::TransportExhausted { .. } => {
                    GenerationFailure::new(ErrorKind::TransportFailure, error.to_string())
                }
            })?;

        match terminal.status {
            JobStatus::Succeeded => {
                let output = terminal
                    .output
                    .as_deref()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| {
                        GenerationFailure::new(
                            ErrorKind::UnknownProviderError,
                            format!("succeeded job {} is missing an output reference", terminal.id),
                        )
                    })?;
                fetch_output(self.transport.as_ref(), output, api_key.as_deref()).await
            }
            JobStatus::Failed => {
                let detail = terminal
                    .error
                    .as_deref()
                    .unwrap_or("provider reported no failure detail");
                Err(GenerationFailure::new(
                    ErrorKind::UnknownProviderError,
                    format!("job {} failed: {detail}", terminal.id),
                ))
            }
            JobStatus::Starting | JobStatus::Processing => Err(GenerationFailure::new(
                ErrorKind::UnknownProviderError,
                format!("job {} left polling in a non-terminal state", terminal.id),
            )),
        }
    }
}

struct RemoteJobStatusSource<'a> {
    adapter: &'a JobPollAdapter,
    api_key: Option<String>,
}

#[async_trait]
impl JobStatusSource for RemoteJobStatusSource<'_> {
    async fn fetch_status(&self, job_id: &str) -> Result<ProviderJob, TransportError> {
        let request = authorize(
            TransportRequest::get(self.adapter.job_status_url(job_id)),
            self.api_key.as_deref(),
        );
        let response = self.adapter.transport.execute(request).await?;

        if !response.is_success() {
            return Err(TransportError::Failed {
                message: format!("job status endpoint returned {}", response.status),
            });
        }

        parse_job_document(&response.body).map_err(|failure| TransportError::Failed {
            message: failure.message,
        })
    }
}

fn encode_create_body(req: &GenerationRequest) -> Value {
    json!({
        "prompt": req.prompt,
        "parameters": req.parameters,
    })
}

fn parse_job_document(body: &[u8]) -> Result<ProviderJob, GenerationFailure> {
    let value: Value = serde_json::from_slice(body).map_err(|error| {
        GenerationFailure::new(
            ErrorKind::UnknownProviderError,
            format!("provider returned malformed job document: {error}"),
        )
    })?;

    let id = value
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            GenerationFailure::new(
                ErrorKind::UnknownProviderError,
                "job document is missing an id",
            )
        })?
        .to_string();

    let status = match value.get("status").and_then(Value::as_str) {
        None => JobStatus::Starting,
        Some(raw) => JobStatus::from_str(raw).ok_or_else(|| {
            GenerationFailure::new(
                ErrorKind::UnknownProviderError,
                format!("unrecognized job status: {raw}"),
            )
        })?,
    };

    Ok(ProviderJob {
        id,
        status,
        output: value
            .get("output")
            .and_then(Value::as_str)
            .map(str::to_string),
        error: value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}
