//! Data models and structures
//!
//! Defines the request/result types exchanged with callers and the job state
//! tracked while a Freepik task is in flight.

use crate::error::ConfigError;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mime type of every generated image handed back to callers.
pub const IMAGE_MIME_TYPE: &str = "image/png";

/// Generation backends. Gemini streams its answer; Freepik is job based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Freepik,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Freepik => "freepik",
        }
    }

    /// Environment variable holding this provider's credential.
    pub fn credential_env(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Freepik => "FREEPIK_API_KEY",
        }
    }

    pub fn requires_reference_image(&self) -> bool {
        matches!(self, ProviderKind::Freepik)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "freepik" => Ok(ProviderKind::Freepik),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// One image generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub subject_name: String,
    pub role: String,
    pub reference_image: Option<Vec<u8>>,
    /// `None` selects the configured default provider.
    pub provider: Option<ProviderKind>,
}

impl GenerationRequest {
    pub fn new(subject_name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            role: role.into(),
            reference_image: None,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_reference_image(mut self, bytes: Vec<u8>) -> Self {
        self.reference_image = Some(bytes);
        self
    }

    /// The reference image, treating an empty buffer as absent.
    pub fn reference_bytes(&self) -> Option<&[u8]> {
        self.reference_image
            .as_deref()
            .filter(|bytes| !bytes.is_empty())
    }
}

/// Lifecycle of a Freepik generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Created,
    Processing,
    Completed,
    Failed,
    Unknown,
}

impl JobStatus {
    /// Parses a wire status. Unrecognized values map to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CREATED" => JobStatus::Created,
            "PROCESSING" | "IN_PROGRESS" => JobStatus::Processing,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Unknown,
        }
    }
}

/// Snapshot of a Freepik task as of the latest status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub job_id: String,
    pub status: JobStatus,
    pub result_url: Option<String>,
}

impl GenerationJob {
    pub fn new(job_id: String, status: JobStatus) -> Self {
        Self {
            job_id,
            status,
            result_url: None,
        }
    }

    /// Applies one status check. The first generated URL becomes the result.
    pub fn update(&mut self, status: JobStatus, generated: &[String]) {
        self.status = status;
        self.result_url = generated.iter().find(|url| !url.is_empty()).cloned();
    }

    /// The result URL once the task completed with output.
    pub fn completed_url(&self) -> Option<&str> {
        match self.status {
            JobStatus::Completed => self.result_url.as_deref(),
            _ => None,
        }
    }
}

/// A finished image owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl GenerationResult {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: IMAGE_MIME_TYPE,
        }
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// String form of a [`GenerationResult`] for JSON consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub image_base64: String,
    pub content_type: String,
}

impl From<&GenerationResult> for EncodedImage {
    fn from(result: &GenerationResult) -> Self {
        Self {
            image_base64: result.to_base64(),
            content_type: result.mime_type.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_provider_kind_parsing_is_case_insensitive() {
        assert_eq!(
            "Gemini".parse::<ProviderKind>().unwrap(),
            ProviderKind::Gemini
        );
        assert_eq!(
            " FREEPIK ".parse::<ProviderKind>().unwrap(),
            ProviderKind::Freepik
        );
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let err = "dalle".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err, ConfigError::UnknownProvider("dalle".to_string()));
    }

    #[test]
    fn test_job_status_parsing() {
        assert_eq!(JobStatus::parse("CREATED"), JobStatus::Created);
        assert_eq!(JobStatus::parse("IN_PROGRESS"), JobStatus::Processing);
        assert_eq!(JobStatus::parse("completed"), JobStatus::Completed);
        assert_eq!(JobStatus::parse("FAILED"), JobStatus::Failed);
        assert_eq!(JobStatus::parse("QUEUED"), JobStatus::Unknown);
    }

    #[test]
    fn test_job_completed_without_output_has_no_url() {
        let mut job = GenerationJob::new("t1".to_string(), JobStatus::Created);
        job.update(JobStatus::Completed, &[]);
        assert_eq!(job.completed_url(), None);

        job.update(
            JobStatus::Completed,
            &["https://cdn.example.com/a.png".to_string()],
        );
        assert_eq!(job.completed_url(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_empty_reference_image_counts_as_missing() {
        let request = GenerationRequest::new("Emma", "Scientist").with_reference_image(vec![]);
        assert!(request.reference_bytes().is_none());
    }

    #[test]
    fn test_encoded_image_serialization() {
        let result = GenerationResult::new(vec![0x89, 0x50, 0x4E, 0x47]);
        let encoded = EncodedImage::from(&result);

        let json = serde_json::to_value(&encoded).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "image_base64": "iVBORw==", "content_type": "image/png" })
        );
    }
}
