//! Entry point tying configuration, input validation and the provider
//! backends together.

use crate::ai::{FreepikImageClient, GeminiImageClient, ImageProvider};
use crate::config::{Config, ConfigSummary};
use crate::error::{GenerationError, ValidationError};
use crate::models::{EncodedImage, GenerationRequest, GenerationResult, ProviderKind};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// One implementation per [`ProviderKind`].
pub struct Providers {
    pub gemini: Box<dyn ImageProvider>,
    pub freepik: Box<dyn ImageProvider>,
}

/// Turns a [`GenerationRequest`] into a finished image.
///
/// Holds no per-call state; share it behind an `Arc` and call it from as
/// many tasks as needed.
pub struct Orchestrator {
    config: Arc<Config>,
    providers: Providers,
}

impl Orchestrator {
    /// Build an orchestrator talking to the real backends.
    pub fn new(config: Config) -> Result<Self> {
        // Streams are bounded by the caller's deadline, so only connecting is
        // capped on the shared client; task calls set their own timeout.
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.gemini.request_timeout)
            .build()?;

        let providers = Providers {
            gemini: Box::new(GeminiImageClient::new_with_client(
                &config.gemini,
                &config.gemini_model,
                http_client.clone(),
            )),
            freepik: Box::new(FreepikImageClient::new_with_client(
                &config.freepik,
                http_client,
            )),
        };

        Ok(Self::with_providers(config, providers))
    }

    /// Build an orchestrator from injected providers.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_providers(config: Config, providers: Providers) -> Self {
        debug_assert_eq!(providers.gemini.kind(), ProviderKind::Gemini);
        debug_assert_eq!(providers.freepik.kind(), ProviderKind::Freepik);

        Self {
            config: Arc::new(config),
            providers,
        }
    }

    pub fn config_summary(&self) -> ConfigSummary {
        self.config.summary()
    }

    fn provider(&self, kind: ProviderKind) -> &dyn ImageProvider {
        match kind {
            ProviderKind::Gemini => self.providers.gemini.as_ref(),
            ProviderKind::Freepik => self.providers.freepik.as_ref(),
        }
    }

    fn validate_request(request: &GenerationRequest, provider: ProviderKind) -> Result<()> {
        if request.subject_name.trim().is_empty() || request.role.trim().is_empty() {
            return Err(ValidationError::EmptySubjectOrRole.into());
        }
        if provider.requires_reference_image() && request.reference_bytes().is_none() {
            return Err(ValidationError::ReferenceImageRequired.into());
        }
        Ok(())
    }

    /// Generate one image. Fails before any network call when configuration
    /// or input is invalid.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let kind = request.provider.unwrap_or(self.config.default_provider);
        self.config.validate(kind)?;
        Self::validate_request(request, kind)?;

        let GenerationRequest {
            subject_name, role, ..
        } = request;
        info!(provider = %kind, "Generating image for {} as {}", subject_name, role);

        let bytes = self
            .provider(kind)
            .generate(subject_name, role, request.reference_bytes())
            .await
            .map_err(|e| {
                error!(provider = %kind, code = e.code(), "Image generation failed: {}", e);
                e
            })?;

        info!(provider = %kind, "Image generated ({} bytes)", bytes.len());
        Ok(GenerationResult::new(bytes))
    }

    /// String-typed entry point for boundary layers: `provider_name` of
    /// `None` selects the configured default.
    pub async fn generate_named(
        &self,
        subject_name: &str,
        role: &str,
        provider_name: Option<&str>,
        reference_image: Option<Vec<u8>>,
    ) -> Result<GenerationResult> {
        let kind = self.config.validate_named(provider_name)?;

        let mut request = GenerationRequest::new(subject_name, role).with_provider(kind);
        request.reference_image = reference_image;
        self.generate(&request).await
    }

    /// Like [`Orchestrator::generate`], with the image base64-encoded.
    pub async fn generate_base64(&self, request: &GenerationRequest) -> Result<EncodedImage> {
        let result = self.generate(request).await?;
        Ok(EncodedImage::from(&result))
    }

    /// Generate, aborting with [`GenerationError::Cancelled`] as soon as
    /// `cancel` fires. The in-flight request or poll wait is dropped.
    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Generation cancelled by caller");
                Err(GenerationError::Cancelled.into())
            }
            result = self.generate(request) => result,
        }
    }

    /// Generate within `deadline`; expiry is reported as
    /// [`GenerationError::Cancelled`].
    pub async fn generate_with_deadline(
        &self,
        request: &GenerationRequest,
        deadline: Duration,
    ) -> Result<GenerationResult> {
        match tokio::time::timeout(deadline, self.generate(request)).await {
            Ok(result) => result,
            Err(_) => {
                info!("Generation exceeded deadline of {:?}", deadline);
                Err(GenerationError::Cancelled.into())
            }
        }
    }
}
