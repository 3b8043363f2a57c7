//! HttpWorkspaceBackend - `WorkspaceBackend` over the backend's REST API.
//!
//! Every call targets `{base_url}/api/...`. Non-success responses are decoded
//! from their `{"error": ...}` payload; bodies without that field fall back to
//! the generic failure message.

use async_trait::async_trait;
use futures::StreamExt;
use gwen_core::backend::{
    ChatRequest, ChunkStream, FileEntry, FileOperationStatus, HealthReport, RunResult,
    SaveReceipt, WorkspaceBackend,
};
use gwen_core::config::ClientConfig;
use gwen_core::error::{GwenError, Result};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

/// Upper bound for a single health probe when no request timeout is set.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SaveBody<'a> {
    path: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct RunBody<'a> {
    path: &'a str,
}

/// Backend client built on a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpWorkspaceBackend {
    client: Client,
    base_url: Url,
    request_timeout: Option<Duration>,
}

impl HttpWorkspaceBackend {
    /// Creates a backend client for `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GwenError::config(format!("invalid api_base_url {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GwenError::config(format!(
                "api_base_url {base_url} cannot be used as a base URL"
            )));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            request_timeout: None,
        })
    }

    /// Builds a client from the loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut backend = Self::new(&config.api_base_url)?;
        backend.request_timeout = config.request_timeout();
        Ok(backend)
    }

    /// Applies a timeout to every non-streaming request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `{base}/api/{segments...}`. Each segment is percent-encoded, so a
    /// workspace path like `src/my file.py` keeps its slashes as separators.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    fn with_timeout(&self, request: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|err| GwenError::transport(format!("{what} request failed: {err}")))?;
        ensure_success(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        tracing::debug!("[HttpBackend] GET {}", url);
        let response = self.send(self.with_timeout(self.client.get(url)), what).await?;
        decode_json(response, what).await
    }
}

/// Converts a non-success response into `GwenError::Backend`.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("[HttpBackend] {} {}", status, body);
    Err(backend_error(status.as_u16(), &body))
}

fn backend_error(status: u16, body: &str) -> GwenError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error);
    GwenError::backend(status, message)
}

async fn decode_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|err| GwenError::transport(format!("failed to read {what} response: {err}")))?;
    serde_json::from_str(&body)
        .map_err(|err| GwenError::protocol(format!("invalid {what} response: {err}")))
}

#[async_trait]
impl WorkspaceBackend for HttpWorkspaceBackend {
    async fn list_files(&self) -> Result<Vec<FileEntry>> {
        self.get_json(self.endpoint(["files"]), "file listing").await
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        let url = self.endpoint(std::iter::once("files").chain(path.split('/')));
        tracing::debug!("[HttpBackend] GET {}", url);
        let response = self
            .send(self.with_timeout(self.client.get(url)), "file read")
            .await?;
        response
            .text()
            .await
            .map_err(|err| GwenError::transport(format!("failed to read file body: {err}")))
    }

    async fn save_file(&self, path: &str, content: &str) -> Result<SaveReceipt> {
        let request = self
            .client
            .post(self.endpoint(["save"]))
            .json(&SaveBody { path, content });
        let response = self.send(self.with_timeout(request), "save").await?;
        let body = response.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            return Ok(SaveReceipt::default());
        }
        // The acknowledgement body is informational only.
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    async fn run_file(&self, path: &str) -> Result<RunResult> {
        let request = self
            .client
            .post(self.endpoint(["run"]))
            .json(&RunBody { path });
        let response = self.send(self.with_timeout(request), "run").await?;
        decode_json(response, "run").await
    }

    async fn health(&self) -> Result<HealthReport> {
        let url = self.endpoint(["health"]);
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout.unwrap_or(HEALTH_TIMEOUT))
            .send()
            .await
            .map_err(|err| GwenError::transport(format!("health request failed: {err}")))?;
        // An unhealthy backend answers 500 with a regular health payload.
        let body = response
            .text()
            .await
            .map_err(|err| GwenError::transport(format!("failed to read health response: {err}")))?;
        serde_json::from_str(&body)
            .map_err(|err| GwenError::protocol(format!("invalid health response: {err}")))
    }

    async fn models(&self) -> Result<Vec<String>> {
        self.get_json(self.endpoint(["models"]), "model catalog").await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChunkStream> {
        let url = self.endpoint(["chat"]);
        tracing::debug!("[HttpBackend] POST {} (model: {})", url, request.model);
        // No request timeout here: the body stays open for the whole turn.
        let response = self.send(self.client.post(url).json(request), "chat").await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|err| GwenError::transport(format!("chat stream failed: {err}")))
            })
            .boxed())
    }

    async fn file_status(&self) -> Result<Vec<FileOperationStatus>> {
        self.get_json(self.endpoint(["file-status"]), "file status")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwen_core::error::GENERIC_BACKEND_ERROR;

    #[test]
    fn test_endpoint_encodes_path_segments() {
        let backend = HttpWorkspaceBackend::new("http://127.0.0.1:5000").unwrap();
        let url = backend.endpoint(std::iter::once("files").chain("src/my file.py".split('/')));
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/api/files/src/my%20file.py");
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let backend = HttpWorkspaceBackend::new("http://localhost:8080/gwen/").unwrap();
        assert_eq!(
            backend.endpoint(["file-status"]).as_str(),
            "http://localhost:8080/gwen/api/file-status"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = HttpWorkspaceBackend::new("not a url").unwrap_err();
        assert!(matches!(err, GwenError::Config(_)));
        let err = HttpWorkspaceBackend::new("mailto:someone@example.com").unwrap_err();
        assert!(matches!(err, GwenError::Config(_)));
    }

    #[test]
    fn test_backend_error_uses_payload_message() {
        let err = backend_error(404, r#"{"error":"File not found"}"#);
        assert_eq!(
            err,
            GwenError::Backend {
                status: 404,
                message: "File not found".to_string()
            }
        );
    }

    #[test]
    fn test_backend_error_without_payload_is_generic() {
        for body in ["", "<html>oops</html>", r#"{"detail":"x"}"#] {
            let err = backend_error(500, body);
            assert_eq!(err.user_message(), GENERIC_BACKEND_ERROR);
        }
    }

    #[test]
    fn test_from_config_applies_timeout() {
        let config = ClientConfig {
            request_timeout_secs: Some(7),
            ..ClientConfig::default()
        };
        let backend = HttpWorkspaceBackend::from_config(&config).unwrap();
        assert_eq!(backend.request_timeout, Some(Duration::from_secs(7)));
        assert_eq!(backend.base_url().as_str(), "http://127.0.0.1:5000/");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let backend = HttpWorkspaceBackend::new("http://127.0.0.1:9")
            .unwrap()
            .with_request_timeout(Duration::from_secs(2));
        let err = backend.list_files().await.unwrap_err();
        assert!(err.is_transport());
    }
}
