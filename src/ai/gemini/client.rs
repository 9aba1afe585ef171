use super::sse;
use super::types::GenerateContentResponse;
use crate::error::GenerationError;
use crate::Result;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Decoded chunks of one streamed response, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<GenerateContentResponse>>;

/// Lightweight Gemini REST client for the streaming `generateContent` call.
pub struct GeminiHttpClient {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiHttpClient {
    /// `model` should be the bare model ID (for example `gemini-2.5-flash-image`);
    /// a leading `models/` segment is stripped.
    pub fn new_with_client(
        api_key: SecretString,
        model: String,
        base_url: String,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    /// Opens a streaming `generateContent` call.
    ///
    /// Only the handshake happens here; chunks are read as the returned stream
    /// is polled, and dropping it closes the connection.
    pub async fn stream_generate_content<Req: Serialize>(
        &self,
        request: &Req,
    ) -> Result<ChunkStream> {
        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                GenerationError::ProviderFailure(format!("Gemini request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(GenerationError::ProviderFailure(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            ))
            .into());
        }

        let chunks = sse::data_stream_from_response(response).map(|event| -> Result<_> {
            let data = event.map_err(|e| {
                tracing::error!("Gemini stream interrupted: {}", e);
                GenerationError::ProviderFailure(format!("Gemini stream interrupted: {}", e))
            })?;

            serde_json::from_str::<GenerateContentResponse>(&data).map_err(|e| {
                tracing::error!("Failed to parse Gemini chunk: {}\nData: {}", e, data);
                GenerationError::ProviderFailure(format!("Failed to parse Gemini chunk: {}", e))
                    .into()
            })
        });

        Ok(Box::pin(chunks))
    }
}
