pub mod client;
pub mod image;
pub mod sse;
pub mod types;

pub use image::GeminiImageClient;
