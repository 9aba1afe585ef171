use super::client::FreepikHttpClient;
use super::types::CreateTaskRequest;
use crate::ai::ImageProvider;
use crate::config::ProviderConfig;
use crate::error::{GenerationError, ValidationError};
use crate::models::{GenerationJob, JobStatus, ProviderKind};
use crate::prompts::{self, PromptStyle};
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, RetryIf};

/// Why a single status check did not end polling with a result.
#[derive(Debug)]
enum PollOutcome {
    Pending(JobStatus),
    Unreachable(String),
    Rejected,
}

/// Job-based image generation against Freepik: submit, poll, download.
pub struct FreepikImageClient {
    http: FreepikHttpClient,
    max_poll_attempts: u32,
    poll_interval: Duration,
}

impl FreepikImageClient {
    pub fn new_with_client(config: &ProviderConfig, client: reqwest::Client) -> Self {
        Self {
            http: FreepikHttpClient::new_with_client(
                config.credential.clone(),
                config.base_endpoint.clone(),
                config.request_timeout,
                client,
            ),
            max_poll_attempts: config.max_poll_attempts.max(1),
            poll_interval: config.poll_interval,
        }
    }

    async fn submit(
        &self,
        subject_name: &str,
        role: &str,
        reference_image: &[u8],
    ) -> Result<GenerationJob> {
        let request = CreateTaskRequest {
            prompt: prompts::build(subject_name, role, PromptStyle::Photorealistic),
            reference_images: vec![base64::engine::general_purpose::STANDARD.encode(reference_image)],
        };
        self.http.create_task(&request).await
    }

    async fn poll_once(
        &self,
        job: &GenerationJob,
        attempts: &AtomicU32,
    ) -> std::result::Result<String, PollOutcome> {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

        let data = match self.http.task_status(&job.job_id).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(
                    task_id = %job.job_id,
                    "Attempt {}/{} - error checking task status: {}",
                    attempt,
                    self.max_poll_attempts,
                    e
                );
                return Err(PollOutcome::Unreachable(e.to_string()));
            }
        };

        let raw_status = data.status.unwrap_or_default();
        let mut job = job.clone();
        job.update(JobStatus::parse(&raw_status), &data.generated);

        tracing::info!(
            task_id = %job.job_id,
            "Attempt {}/{} - Status: {}",
            attempt,
            self.max_poll_attempts,
            raw_status
        );

        if let Some(url) = job.completed_url() {
            return Ok(url.to_string());
        }

        match job.status {
            JobStatus::Failed => Err(PollOutcome::Rejected),
            JobStatus::Completed => {
                tracing::warn!(task_id = %job.job_id, "Task reported completion without output");
                Err(PollOutcome::Pending(job.status))
            }
            JobStatus::Unknown => {
                tracing::warn!(task_id = %job.job_id, "Unknown task status: {}", raw_status);
                Err(PollOutcome::Pending(job.status))
            }
            other => Err(PollOutcome::Pending(other)),
        }
    }

    /// Polls until the task reaches a terminal state or the attempt budget
    /// runs out, returning the first result URL.
    async fn wait_for_completion(&self, job: &GenerationJob) -> Result<String> {
        let attempts = AtomicU32::new(0);
        let retries = self.max_poll_attempts.saturating_sub(1) as usize;
        let strategy = FixedInterval::new(self.poll_interval).take(retries);

        let outcome = {
            let attempts = &attempts;
            RetryIf::start(
                strategy,
                move || self.poll_once(job, attempts),
                |outcome: &PollOutcome| !matches!(outcome, PollOutcome::Rejected),
            )
            .await
        };

        match outcome {
            Ok(url) => {
                tracing::info!(task_id = %job.job_id, "Task completed");
                Ok(url)
            }
            Err(PollOutcome::Rejected) => {
                tracing::error!(task_id = %job.job_id, "Task failed");
                Err(GenerationError::TaskFailed {
                    task_id: job.job_id.clone(),
                }
                .into())
            }
            Err(PollOutcome::Pending(status)) => {
                Err(Self::timed_out(job, &attempts, &format!("status {:?}", status)))
            }
            Err(PollOutcome::Unreachable(message)) => {
                Err(Self::timed_out(job, &attempts, &message))
            }
        }
    }

    fn timed_out(job: &GenerationJob, attempts: &AtomicU32, last: &str) -> crate::Error {
        let attempts = attempts.load(Ordering::SeqCst);
        tracing::error!(
            task_id = %job.job_id,
            "Task timed out after {} attempts (last: {})",
            attempts,
            last
        );
        GenerationError::Timeout {
            task_id: job.job_id.clone(),
            attempts,
        }
        .into()
    }
}

#[async_trait]
impl ImageProvider for FreepikImageClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Freepik
    }

    async fn generate(
        &self,
        subject_name: &str,
        role: &str,
        reference_image: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let reference_image = reference_image
            .filter(|bytes| !bytes.is_empty())
            .ok_or(ValidationError::ReferenceImageRequired)?;

        tracing::info!("Generating Freepik image for {} as {}", subject_name, role);

        let job = self.submit(subject_name, role, reference_image).await?;
        let url = self.wait_for_completion(&job).await?;
        self.http.download(&url).await
    }
}
