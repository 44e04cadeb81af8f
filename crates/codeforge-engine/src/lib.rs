//! Generation pipeline engine
//!
//! The orchestrator sequences seven phases per request: Understand,
//! LoadContext, Plan, Execute, Validate, Integrate, Document & Learn. The
//! memory store, learning model, and per-kind generators are external
//! collaborators injected at composition time.

pub mod orchestrator;
pub mod outcome;
pub mod plan;
pub mod registry;
pub mod traits;

pub use orchestrator::Orchestrator;
pub use outcome::{GenerationRequest, IntegrationResult, ProcessOutcome, SkippedArtifact};
pub use plan::{
    build_plan, parse_requirement, ArtifactSpec, GenerationPlan, PlanPriority,
    RequirementAnalysis, RequirementSpec,
};
pub use registry::GeneratorRegistry;
pub use traits::{
    ArtifactGenerator, ErrorRecord, GeneratedArtifact, GenerationRecord, LearningModel,
    MemoryStats, MemoryStore, ProjectContext, ProjectState,
};
