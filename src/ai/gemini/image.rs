use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, GenerationConfig, Part, StreamImageRequest};
use crate::ai::ImageProvider;
use crate::config::ProviderConfig;
use crate::error::GenerationError;
use crate::models::ProviderKind;
use crate::prompts::{self, PromptStyle};
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;
use futures_util::{Stream, StreamExt};

/// Streaming image generation against Gemini.
pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
    pub fn new_with_client(config: &ProviderConfig, model: &str, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                config.credential.clone(),
                model.to_string(),
                config.base_endpoint.clone(),
                client,
            ),
        }
    }

    fn build_request(prompt: String) -> StreamImageRequest {
        StreamImageRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        }
    }
}

/// Drains `chunks` until one carries an inline image and decodes it.
///
/// The first image wins: later chunks are never polled.
pub async fn first_inline_image<S>(mut chunks: S) -> Result<Vec<u8>>
where
    S: Stream<Item = Result<GenerateContentResponse>> + Unpin,
{
    let mut consumed = 0usize;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        consumed += 1;

        let Some(image) = chunk.inline_image() else {
            continue;
        };

        tracing::debug!(
            chunks = consumed,
            "Gemini returned image with mime_type: {}",
            image.mime_type
        );

        return base64::engine::general_purpose::STANDARD
            .decode(&image.data)
            .map_err(|e| {
                GenerationError::ProviderFailure(format!(
                    "Failed to decode Gemini base64 image: {}",
                    e
                ))
                .into()
            });
    }

    tracing::warn!(chunks = consumed, "Gemini stream ended without image data");
    Err(GenerationError::NoImageProduced.into())
}

#[async_trait]
impl ImageProvider for GeminiImageClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn generate(
        &self,
        subject_name: &str,
        role: &str,
        _reference_image: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let prompt = prompts::build(subject_name, role, PromptStyle::Illustrative);

        tracing::info!(
            model = self.http.model(),
            "Generating Gemini image for {} as {}",
            subject_name,
            role
        );

        let chunks = self
            .http
            .stream_generate_content(&Self::build_request(prompt))
            .await?;

        let image = first_inline_image(chunks).await?;
        tracing::info!("Gemini image received ({} bytes)", image.len());
        Ok(image)
    }
}
