//! Freepik task API payloads.

use serde::{Deserialize, Serialize};

/// Body of the task-creation `POST`.
#[derive(Debug, Serialize)]
pub struct CreateTaskRequest {
    pub prompt: String,
    /// Base64-encoded reference images.
    pub reference_images: Vec<String>,
}

/// `{"data": {...}}` envelope shared by creation and status responses.
#[derive(Debug, Default, Deserialize)]
pub struct TaskEnvelope {
    #[serde(default)]
    pub data: TaskData,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskData {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub generated: Vec<String>,
}
