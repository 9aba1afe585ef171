//! Career portrait generator - renders a child's name and dream job into an
//! image through interchangeable AI backends
//!
//! Gemini streams its answer over server-sent events; Freepik accepts a task
//! (with a reference photo) that is polled until the image can be downloaded.
//! [`Orchestrator`] hides the difference behind one call.

pub mod ai;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod prompts;

pub use config::{Config, ConfigSummary, ProviderConfig};
pub use error::{ConfigError, Error, GenerationError, Result, ValidationError};
pub use models::{EncodedImage, GenerationRequest, GenerationResult, ProviderKind};
pub use orchestrator::{Orchestrator, Providers};
