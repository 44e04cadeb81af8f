//! Error taxonomy for the generation pipeline
//!
//! Each pipeline concern has its own `thiserror` enum; `ForgeError` is the
//! umbrella type library consumers see at the orchestration boundary.

use std::time::Duration;
use thiserror::Error;

/// Errors from the remote-call client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (connection, DNS, malformed payload on the wire)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Authentication failure against the remote endpoint (401/403, missing key)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Local request quota for the current rate window is exhausted.
    ///
    /// Never retried: the caller failed before any network attempt.
    #[error("Rate limit exceeded: {used}/{limit} requests in the current window")]
    RateLimited { used: u32, limit: u32 },

    /// Remote endpoint reported quota exhaustion (429)
    #[error("Upstream quota exceeded: {0}")]
    UpstreamQuota(String),

    /// Remote endpoint server error (5xx); retried with backoff
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The requested model is unavailable; triggers fallback rotation
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The bounded call timeout elapsed
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The response arrived but did not match the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Client construction or configuration problem
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

impl ClientError {
    /// Whether the attempt loop may retry after this error.
    ///
    /// Local rate limiting, auth failures, and misconfiguration are final;
    /// transport problems, upstream outages, and timeouts are transient.
    /// `ModelUnavailable` is retryable after rotating to a fallback model.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_)
            | Self::Upstream(_)
            | Self::UpstreamQuota(_)
            | Self::Timeout { .. }
            | Self::ModelUnavailable(_) => true,
            Self::Auth(_)
            | Self::RateLimited { .. }
            | Self::MalformedResponse(_)
            | Self::Misconfiguration(_) => false,
        }
    }
}

/// Errors from the static-analysis validator.
#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the multi-tool formatter.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Scratch file error: {0}")]
    Scratch(String),

    #[error("Formatter '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Formatter '{tool}' timed out after {duration:?}")]
    ToolTimeout { tool: String, duration: Duration },
}

/// Errors from the orchestrator and its collaborators.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Remote client error: {0}")]
    Client(#[from] ClientError),

    #[error("Generator for '{kind}' failed: {message}")]
    Generation { kind: String, message: String },

    #[error("Failed to integrate {path}: {reason}")]
    Integration { path: String, reason: String },

    #[error("Memory store error: {0}")]
    MemoryStore(String),

    #[error("Learning model error: {0}")]
    LearningModel(String),
}

/// Umbrella error for library consumers.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Validation error: {0}")]
    Validate(#[from] ValidateError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
