//! HTTP client for the remote code-interpreter sandbox service.
//!
//! One `SandboxSession` is created per analyse action and torn down at the end
//! of that action, on success and failure paths alike.

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox request failed: {0}")]
    Transport(String),
    #[error("sandbox service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed sandbox response: {0}")]
    Malformed(String),
}

/// Captured output of one code execution.
#[derive(Debug, Default, Deserialize)]
pub struct Execution {
    #[serde(default)]
    pub results: Vec<RawResult>,
    #[serde(default)]
    pub error: Option<ExecError>,
    #[serde(default)]
    pub logs: Logs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecError {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub traceback: String,
}

impl ExecError {
    pub fn summary(&self) -> String {
        if self.value.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.name, self.value)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Logs {
    #[serde(default)]
    pub stdout: Vec<String>,
    #[serde(default)]
    pub stderr: Vec<String>,
}

impl Logs {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// One untyped result payload as the service reports it. The service does not
/// tag results with a kind; mapping these optional fields into a closed
/// variant set happens in `crate::results`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResult {
    /// Base64-encoded raster payload.
    #[serde(default)]
    pub png: Option<String>,
    /// Plotting-backend figure spec.
    #[serde(default)]
    pub figure: Option<serde_json::Value>,
    /// Interactive ("show"-capable) chart spec.
    #[serde(default)]
    pub chart: Option<serde_json::Value>,
    /// Structured value: table, column, list, or arbitrary JSON.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Plain-text representation of the value.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug)]
pub struct SandboxClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
}

impl SandboxClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_key = cfg
            .get("SANDBOX_API_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Missing SANDBOX_API_KEY. Set it in the environment or {}",
                    cfg.config_path.display()
                )
            })?;
        let base = cfg
            .get("SANDBOX_API_BASE")
            .unwrap_or_else(|| "https://api.e2b.dev".to_string());
        let timeout_secs = cfg
            .get("REQUEST_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(120);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { http, base, api_key })
    }

    /// Create one execution environment. The caller owns its teardown.
    pub async fn create(&self) -> Result<SandboxSession, SandboxError> {
        let url = format!("{}/sandboxes", self.base.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| SandboxError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SandboxError::Status { status, body });
        }

        #[derive(Deserialize)]
        struct Created {
            #[serde(rename = "sandboxID")]
            sandbox_id: String,
        }
        let created: Created = resp
            .json()
            .await
            .map_err(|e| SandboxError::Malformed(e.to_string()))?;
        debug!(id = %created.sandbox_id, "sandbox created");

        Ok(SandboxSession {
            http: self.http.clone(),
            base: self.base.clone(),
            api_key: self.api_key.clone(),
            id: created.sandbox_id,
        })
    }
}

#[derive(Debug)]
pub struct SandboxSession {
    http: reqwest::Client,
    base: String,
    api_key: String,
    id: String,
}

impl SandboxSession {
    /// Write the dataset bytes into the environment at `path`.
    pub async fn write_file(&self, path: &str, bytes: Vec<u8>) -> Result<(), SandboxError> {
        let url = format!("{}/sandboxes/{}/files", self.base.trim_end_matches('/'), self.id);
        debug!(%path, len = bytes.len(), "uploading file to sandbox");
        let resp = self
            .http
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .query(&[("path", path)])
            .body(bytes)
            .send()
            .await
            .map_err(|e| SandboxError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SandboxError::Status { status, body });
        }
        Ok(())
    }

    /// Submit code for execution and collect results, error, and logs.
    pub async fn run_code(&self, code: &str) -> Result<Execution, SandboxError> {
        let url = format!("{}/sandboxes/{}/code", self.base.trim_end_matches('/'), self.id);
        debug!(len = code.len(), "running code in sandbox");
        let resp = self
            .http
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await
            .map_err(|e| SandboxError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SandboxError::Status { status, body });
        }

        resp.json::<Execution>()
            .await
            .map_err(|e| SandboxError::Malformed(e.to_string()))
    }

    /// Best-effort teardown; failures are logged, never propagated.
    pub async fn close(self) {
        let url = format!("{}/sandboxes/{}", self.base.trim_end_matches('/'), self.id);
        match self
            .http
            .delete(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => debug!(id = %self.id, "sandbox closed"),
            Ok(resp) => warn!(id = %self.id, status = %resp.status(), "sandbox teardown refused"),
            Err(e) => warn!(id = %self.id, error = %e, "sandbox teardown failed"),
        }
    }
}
