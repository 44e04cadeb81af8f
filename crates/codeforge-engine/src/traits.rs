//! External collaborator seams
//!
//! The pipeline consumes a project-memory store, a prompt-learning model,
//! and one generator per artifact kind. All three are trait objects wired in
//! by the composition root; this crate implements none of them.

use crate::plan::ArtifactSpec;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use codeforge_utils::error::EngineError;
use codeforge_utils::ArtifactKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of the target project, as known to the memory store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectState {
    /// Top-level directory layout
    pub structure: Vec<String>,
    /// Names of artifacts already present
    pub existing_artifacts: Vec<String>,
    /// Declared technology stack
    pub tech_stack: Vec<String>,
}

/// A persisted record of one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub prompt: String,
    pub context: HashMap<String, serde_json::Value>,
    pub success: bool,
    /// Project-relative paths that were written
    pub artifacts: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// A persisted record of one pipeline failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    pub prompt: String,
    pub context: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate counters exposed by the memory store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub generations: u64,
    pub errors: u64,
}

/// Project-memory collaborator: state lookup, similarity search, and
/// durable generation history.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Current project state for the given type and stack.
    async fn get_project_state(
        &self,
        project_type: &str,
        stack: &[String],
    ) -> Result<ProjectState, EngineError>;

    /// Whether a declared dependency is already present in the project.
    async fn check_dependency(&self, name: &str) -> Result<bool, EngineError>;

    /// Past generations similar to the query, most similar first.
    async fn find_similar(&self, query: &str) -> Result<Vec<GenerationRecord>, EngineError>;

    /// Appends the record to the similarity history.
    async fn record_generation(&self, record: &GenerationRecord) -> Result<(), EngineError>;

    /// Persists the full record durably.
    async fn save_generation(&self, record: &GenerationRecord) -> Result<(), EngineError>;

    async fn get_stats(&self) -> Result<MemoryStats, EngineError>;
}

/// Prompt-learning collaborator.
#[async_trait]
pub trait LearningModel: Send + Sync {
    /// Rewrites a raw prompt using what past runs taught the model.
    async fn optimize_prompt(&self, prompt: &str) -> Result<String, EngineError>;

    /// Feeds the final outcome back for future optimization.
    async fn record_generation_result(
        &self,
        prompt: &str,
        success: bool,
    ) -> Result<(), EngineError>;

    /// Records a pipeline failure for future avoidance.
    async fn record_error(&self, record: &ErrorRecord) -> Result<(), EngineError>;
}

/// One generated unit of source, ready for validation.
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub name: String,
    pub kind: ArtifactKind,
    /// Project-relative destination
    pub path: Utf8PathBuf,
    pub code: String,
    pub language: String,
}

/// Context handed to every generator invocation.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    pub state: ProjectState,
    /// Declared dependencies the project does not have yet
    pub missing_dependencies: Vec<String>,
}

/// Per-kind artifact generator. One implementation is registered per
/// [`ArtifactKind`] at composition time.
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    fn kind(&self) -> ArtifactKind;

    async fn generate(
        &self,
        spec: &ArtifactSpec,
        project: &ProjectContext,
    ) -> Result<GeneratedArtifact, EngineError>;
}
