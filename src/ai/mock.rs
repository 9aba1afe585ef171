use super::ImageProvider;
use crate::error::GenerationError;
use crate::models::ProviderKind;
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A tiny valid 1x1 PNG.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Arguments of one recorded `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub subject_name: String,
    pub role: String,
    pub reference_image: Option<Vec<u8>>,
}

/// In-memory [`ImageProvider`] for tests and local harnesses.
#[derive(Clone)]
pub struct MockImageProvider {
    kind: ProviderKind,
    image_responses: Arc<Mutex<Vec<Vec<u8>>>>,
    failure: Option<GenerationError>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockImageProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            image_responses: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.image_responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(response);
        self
    }

    /// Every call fails with `error`.
    pub fn with_failure(mut self, error: GenerationError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Every call waits `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(
        &self,
        subject_name: &str,
        role: &str,
        reference_image: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            calls.push(RecordedCall {
                subject_name: subject_name.to_string(),
                role: role.to_string(),
                reference_image: reference_image.map(<[u8]>::to_vec),
            });
            calls.len() - 1
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone().into());
        }

        let responses = self
            .image_responses
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if responses.is_empty() {
            Ok(TINY_PNG.to_vec())
        } else {
            Ok(responses[call_index % responses.len()].clone())
        }
    }
}
