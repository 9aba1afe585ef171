//! Image generation backends
//!
//! Every backend implements [`ImageProvider`]; the orchestrator only ever
//! talks to that trait.

pub mod freepik;
pub mod gemini;
pub mod mock;

pub use freepik::FreepikImageClient;
pub use gemini::GeminiImageClient;
pub use mock::MockImageProvider;

use crate::models::ProviderKind;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Produce raw image bytes showing `subject_name` as `role`.
    async fn generate(
        &self,
        subject_name: &str,
        role: &str,
        reference_image: Option<&[u8]>,
    ) -> Result<Vec<u8>>;
}
