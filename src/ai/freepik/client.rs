use super::types::{CreateTaskRequest, TaskData, TaskEnvelope};
use crate::error::GenerationError;
use crate::models::{GenerationJob, JobStatus};
use crate::Result;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-freepik-api-key";

/// REST client for the Freepik task endpoints and result downloads.
pub struct FreepikHttpClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl FreepikHttpClient {
    pub fn new_with_client(
        api_key: SecretString,
        base_url: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .timeout(self.timeout)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
    }

    /// Sends `builder` and decodes a JSON body, flattening every failure
    /// into a message so each phase can wrap it in its own error kind.
    async fn send_json<Resp: DeserializeOwned>(
        builder: RequestBuilder,
    ) -> std::result::Result<Resp, String> {
        let response = builder.send().await.map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!(
                "Freepik API error (status {}): {}",
                status, error_text
            ));
        }

        let body = response.text().await.map_err(|e| e.to_string())?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!("Unparsable Freepik body: {}", body);
            format!("Failed to parse Freepik response: {}", e)
        })
    }

    /// Submits a generation task and returns the freshly created job.
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<GenerationJob> {
        let envelope: TaskEnvelope =
            Self::send_json(self.authorized(self.client.post(&self.base_url)).json(request))
                .await
                .map_err(|message| {
                    tracing::error!("Error creating Freepik task: {}", message);
                    GenerationError::TaskCreationFailed(message)
                })?;

        let TaskData {
            task_id, status, ..
        } = envelope.data;

        let task_id = task_id.filter(|id| !id.trim().is_empty()).ok_or_else(|| {
            tracing::error!("Freepik task response did not include a task id");
            GenerationError::TaskCreationFailed("response did not include a task id".to_string())
        })?;

        let status = status
            .as_deref()
            .map(JobStatus::parse)
            .unwrap_or(JobStatus::Created);

        tracing::info!(task_id = %task_id, "Freepik task created (status {:?})", status);
        Ok(GenerationJob::new(task_id, status))
    }

    /// Fetches the current state of a task.
    pub async fn task_status(&self, task_id: &str) -> Result<TaskData> {
        let url = format!("{}/{}", self.base_url, task_id);
        let envelope: TaskEnvelope = Self::send_json(self.authorized(self.client.get(&url)))
            .await
            .map_err(GenerationError::ProviderFailure)?;
        Ok(envelope.data)
    }

    /// Downloads a generated artifact. Result URLs are pre-signed, so no
    /// credential is attached.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!("Error downloading generated image: {}", e);
                GenerationError::DownloadFailed(e.to_string())
            })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::DownloadFailed(e.to_string()))?;

        if bytes.is_empty() {
            return Err(GenerationError::DownloadFailed("empty response body".to_string()).into());
        }

        tracing::info!("Image downloaded successfully ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }
}
