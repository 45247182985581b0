//! Error types for pipeline operations

use chartpipe_core::CoreError;
use thiserror::Error;

/// Pipeline operation errors
#[derive(Debug, Error)]
pub enum CiError {
    // ============ Chart Errors ============
    #[error(transparent)]
    Chart(#[from] CoreError),

    #[error("Rendered output of {chart} is not valid YAML: {message}")]
    InvalidRender { chart: String, message: String },

    // ============ Tool Errors ============
    #[error("Unable to run '{tool}': {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed ({status})")]
    ToolFailed {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    // ============ Packaging Errors ============
    #[error("Package file not found: {path}")]
    PackageMissing { path: String },

    // ============ Registry Errors ============
    #[error("Failed to push {reference}")]
    PushFailed { reference: String, stderr: String },

    #[error("Registry login to {host} failed")]
    LoginFailed { host: String, stderr: String },

    #[error("Missing registry credential: {variable} is not set")]
    MissingCredential { variable: String },

    #[error("Invalid registry reference '{reference}': {reason}")]
    InvalidRegistry { reference: String, reason: String },

    #[error("No registry target configured")]
    NoRegistry,

    // ============ Notification Errors ============
    #[error("Webhook notification failed: {message}")]
    Webhook { message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CiError {
    /// Captured stderr of the failing tool, when there is one
    pub fn tool_stderr(&self) -> Option<&str> {
        match self {
            CiError::ToolFailed { stderr, .. }
            | CiError::PushFailed { stderr, .. }
            | CiError::LoginFailed { stderr, .. } => {
                let trimmed = stderr.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, CiError>;

impl From<reqwest::Error> for CiError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            "request timed out".to_string()
        } else if let Some(status) = e.status() {
            format!("HTTP {}: {}", status.as_u16(), e)
        } else {
            e.to_string()
        };
        CiError::Webhook { message }
    }
}
