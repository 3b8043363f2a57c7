//! Backend API contract.
//!
//! Defines the interface the client components use to reach the workspace
//! backend, decoupling session logic from the HTTP transport.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Body chunks of a streamed chat response, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;

/// Status string the backend uses for a healthy component.
pub const STATUS_OK: &str = "ok";

/// An entry of the workspace file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default)]
    pub full_path: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    /// Model runtime status.
    #[serde(default = "missing_status")]
    pub ollama: String,
    #[serde(default)]
    pub workspace: Option<bool>,
    #[serde(default)]
    pub generated_code: Option<bool>,
}

fn missing_status() -> String {
    "error".to_string()
}

impl HealthReport {
    /// Report used when the health request itself failed.
    pub fn unreachable() -> Self {
        Self {
            status: "error".to_string(),
            ollama: "error".to_string(),
            workspace: None,
            generated_code: None,
        }
    }

    pub fn server_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn runtime_ok(&self) -> bool {
        self.ollama == STATUS_OK
    }

    /// Both the backend and the model runtime report "ok".
    pub fn fully_ok(&self) -> bool {
        self.server_ok() && self.runtime_ok()
    }
}

/// Result of executing a file in the sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RunResult {
    /// True when the run wrote anything to stderr. The backend sends both
    /// fields on every run, so an empty string means no error.
    pub fn has_error(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|error| !error.trim().is_empty())
    }
}

/// Acknowledgement of a successful save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Backend-side record of one file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperationStatus {
    #[serde(rename = "type")]
    pub operation_type: String,
    pub path: String,
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub model: String,
}

/// The workspace backend as seen by the client.
///
/// Every method maps to one endpoint. Non-success responses are returned as
/// `GwenError::Backend` carrying the payload's `error` field; failures to
/// send or receive are `GwenError::Transport`.
#[async_trait]
pub trait WorkspaceBackend: Send + Sync {
    /// `GET /api/files`
    async fn list_files(&self) -> Result<Vec<FileEntry>>;

    /// `GET /api/files/{path}`: raw file content.
    async fn read_file(&self, path: &str) -> Result<String>;

    /// `POST /api/save`
    async fn save_file(&self, path: &str, content: &str) -> Result<SaveReceipt>;

    /// `POST /api/run`
    async fn run_file(&self, path: &str) -> Result<RunResult>;

    /// `GET /api/health`
    async fn health(&self) -> Result<HealthReport>;

    /// `GET /api/models`
    async fn models(&self) -> Result<Vec<String>>;

    /// `POST /api/chat`: the response body as a chunk stream.
    async fn chat(&self, request: &ChatRequest) -> Result<ChunkStream>;

    /// `GET /api/file-status`
    async fn file_status(&self) -> Result<Vec<FileOperationStatus>>;
}
