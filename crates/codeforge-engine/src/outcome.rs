//! Request and outcome types for the pipeline entry point

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable description of one incoming request. Created when the
/// pipeline starts and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub config: HashMap<String, serde_json::Value>,
    pub context: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>, context: HashMap<String, serde_json::Value>) -> Self {
        Self {
            prompt: prompt.into(),
            config: HashMap::new(),
            context,
            timestamp: Utc::now(),
        }
    }

    /// Short identifier for log correlation, derived from the prompt and
    /// timestamp.
    #[must_use]
    pub fn id(&self) -> String {
        let seed = format!("{}|{}", self.prompt, self.timestamp.timestamp_nanos_opt().unwrap_or(0));
        codeforge_utils::content_hash(&seed)[..12].to_string()
    }
}

/// One artifact that could not be written, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedArtifact {
    pub path: String,
    pub reason: String,
}

/// Filesystem outcome of the Integrate phase. Accumulated incrementally;
/// the final value is returned to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationResult {
    /// Project-relative paths written for the first time
    pub added: Vec<String>,
    /// Artifacts whose write failed
    pub skipped: Vec<SkippedArtifact>,
    /// Project-relative paths that already existed and were overwritten
    pub updated: Vec<String>,
}

impl IntegrationResult {
    #[must_use]
    pub fn written_count(&self) -> usize {
        self.added.len() + self.updated.len()
    }
}

/// Final result of one `process_request` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub results: Option<IntegrationResult>,
    pub error: Option<String>,
    pub message: String,
    /// Per-artifact generation failures that did not abort the batch
    pub errors: Vec<String>,
    /// Validation and integration advisories
    pub warnings: Vec<String>,
    /// True when the requirement analysis fell back to the conservative
    /// default instead of parsing the remote output
    pub degraded_analysis: bool,
}

impl ProcessOutcome {
    #[must_use]
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            results: None,
            message: format!("Generation failed: {error}"),
            error: Some(error),
            errors: Vec::new(),
            warnings: Vec::new(),
            degraded_analysis: false,
        }
    }
}
