//! Error handling and custom error types
//!
//! Errors are split by who has to act on them: configuration problems,
//! caller input problems, and failures while talking to a generation backend.
//! [`Error`] unifies the three so every public call returns one type.

use crate::models::ProviderKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{} missing for provider '{}'", .provider.credential_env(), .provider)]
    MissingCredential { provider: ProviderKind },

    #[error("Unknown AI provider '{0}'. Use 'gemini' or 'freepik'")]
    UnknownProvider(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("A reference image is required for the Freepik provider")]
    ReferenceImageRequired,

    #[error("Subject name and role must not be empty")]
    EmptySubjectOrRole,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Stream ended without producing an image")]
    NoImageProduced,

    #[error("Provider request failed: {0}")]
    ProviderFailure(String),

    #[error("Failed to create generation task: {0}")]
    TaskCreationFailed(String),

    #[error("Generation task {task_id} failed")]
    TaskFailed { task_id: String },

    #[error("Generation task {task_id} did not finish after {attempts} status checks")]
    Timeout { task_id: String, attempts: u32 },

    #[error("Failed to download generated image: {0}")]
    DownloadFailed(String),

    #[error("Generation was cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Stable, machine-readable kind for the boundary layer to map onto
    /// transport status codes.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(ConfigError::MissingCredential { .. }) => "missing_credential",
            Error::Config(ConfigError::UnknownProvider(_)) => "unknown_provider",
            Error::Config(ConfigError::InvalidValue { .. }) => "invalid_config",
            Error::Validation(ValidationError::ReferenceImageRequired) => {
                "reference_image_required"
            }
            Error::Validation(ValidationError::EmptySubjectOrRole) => "empty_subject_or_role",
            Error::Generation(GenerationError::NoImageProduced) => "no_image_produced",
            Error::Generation(GenerationError::ProviderFailure(_)) => "provider_failure",
            Error::Generation(GenerationError::TaskCreationFailed(_)) => "task_creation_failed",
            Error::Generation(GenerationError::TaskFailed { .. }) => "task_failed",
            Error::Generation(GenerationError::Timeout { .. }) => "timeout",
            Error::Generation(GenerationError::DownloadFailed(_)) => "download_failed",
            Error::Generation(GenerationError::Cancelled) => "cancelled",
            Error::Http(_) => "http",
        }
    }

    /// Whether resubmitting the same request has a reasonable chance of
    /// succeeding. Advisory only: nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Generation(
                GenerationError::Timeout { .. }
                    | GenerationError::ProviderFailure(_)
                    | GenerationError::DownloadFailed(_)
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
