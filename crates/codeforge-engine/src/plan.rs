//! Requirement analysis and generation planning
//!
//! The Understand phase turns free-form remote output into a
//! [`RequirementAnalysis`]; the Plan phase orders the requested artifacts
//! and estimates the work.

use codeforge_client::strip_code_fences;
use codeforge_utils::ArtifactKind;
use serde::{Deserialize, Serialize};

/// One requested artifact, before generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    pub kind: ArtifactKind,
    /// Higher generates earlier; defaults to 0
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub description: String,
}

/// Structured requirement produced by the Understand phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementSpec {
    pub request_type: String,
    pub complexity: String,
    pub domain: String,
    /// Analysis confidence in `0.0..=1.0`
    pub confidence: f64,
    pub components: Vec<ArtifactSpec>,
    pub tests: Vec<ArtifactSpec>,
    pub stories: Vec<ArtifactSpec>,
    pub apis: Vec<ArtifactSpec>,
    /// Dependencies the request declares it needs
    pub dependencies: Vec<String>,
}

impl RequirementSpec {
    /// All requested artifacts, components first.
    #[must_use]
    pub fn all_artifacts(&self) -> Vec<ArtifactSpec> {
        let mut all = Vec::with_capacity(
            self.components.len() + self.tests.len() + self.stories.len() + self.apis.len(),
        );
        all.extend(self.components.iter().cloned());
        all.extend(self.tests.iter().cloned());
        all.extend(self.stories.iter().cloned());
        all.extend(self.apis.iter().cloned());
        all
    }
}

/// Tagged analysis result: callers can tell a confident parse from the
/// conservative default substituted when the remote output was malformed.
#[derive(Debug, Clone)]
pub enum RequirementAnalysis {
    Parsed(RequirementSpec),
    Fallback(RequirementSpec),
}

impl RequirementAnalysis {
    #[must_use]
    pub const fn spec(&self) -> &RequirementSpec {
        match self {
            Self::Parsed(spec) | Self::Fallback(spec) => spec,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Wire shape the remote endpoint is asked to produce. Kept separate from
/// [`RequirementSpec`] so missing fields default instead of failing.
#[derive(Debug, Deserialize)]
struct RequirementWire {
    #[serde(rename = "type", default = "default_request_type")]
    request_type: String,
    #[serde(default = "default_complexity")]
    complexity: String,
    #[serde(default = "default_domain")]
    domain: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default)]
    components: Vec<WireArtifact>,
    #[serde(default)]
    tests: Vec<WireArtifact>,
    #[serde(default)]
    stories: Vec<WireArtifact>,
    #[serde(default)]
    apis: Vec<WireArtifact>,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireArtifact {
    name: String,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    description: String,
}

fn default_request_type() -> String {
    "component".to_string()
}
fn default_complexity() -> String {
    "medium".to_string()
}
fn default_domain() -> String {
    "general".to_string()
}
const fn default_confidence() -> f64 {
    0.5
}

/// Parses remote analysis output, substituting a conservative default when
/// the payload is not valid JSON. The result is tagged so downstream code
/// can tell which path was taken.
#[must_use]
pub fn parse_requirement(raw: &str, prompt: &str) -> RequirementAnalysis {
    let stripped = strip_code_fences(raw);
    match serde_json::from_str::<RequirementWire>(&stripped) {
        Ok(wire) => RequirementAnalysis::Parsed(RequirementSpec {
            request_type: wire.request_type,
            complexity: wire.complexity,
            domain: wire.domain,
            confidence: wire.confidence.clamp(0.0, 1.0),
            components: convert(wire.components, ArtifactKind::Component),
            tests: convert(wire.tests, ArtifactKind::Test),
            stories: convert(wire.stories, ArtifactKind::Story),
            apis: convert(wire.apis, ArtifactKind::Api),
            dependencies: wire.dependencies,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed requirement analysis, using fallback");
            RequirementAnalysis::Fallback(fallback_spec(prompt))
        }
    }
}

fn convert(artifacts: Vec<WireArtifact>, kind: ArtifactKind) -> Vec<ArtifactSpec> {
    artifacts
        .into_iter()
        .map(|a| ArtifactSpec {
            name: a.name,
            kind,
            priority: a.priority,
            description: a.description,
        })
        .collect()
}

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "create", "make", "build", "add", "new", "generate", "write", "component",
    "for", "with", "please", "me",
];

/// Conservative default: one component whose name is derived from the
/// first meaningful prompt word.
fn fallback_spec(prompt: &str) -> RequirementSpec {
    let name = prompt
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .find(|w| !STOPWORDS.contains(&w.as_str()))
        .map_or_else(
            || "Generated".to_string(),
            |w| {
                let mut chars = w.chars();
                chars
                    .next()
                    .map_or_else(String::new, |f| f.to_uppercase().collect::<String>())
                    + chars.as_str()
            },
        );

    RequirementSpec {
        request_type: "component".to_string(),
        complexity: "low".to_string(),
        domain: "general".to_string(),
        confidence: 0.3,
        components: vec![ArtifactSpec {
            name,
            kind: ArtifactKind::Component,
            priority: 0,
            description: prompt.to_string(),
        }],
        tests: Vec::new(),
        stories: Vec::new(),
        apis: Vec::new(),
        dependencies: Vec::new(),
    }
}

/// Overall plan urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanPriority {
    Normal,
    High,
}

/// Ordered, time-estimated plan for one request. Produced once by the Plan
/// phase and not mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPlan {
    /// Artifacts in generation order
    pub artifacts: Vec<ArtifactSpec>,
    pub priority: PlanPriority,
    /// Estimated effort in minutes
    pub estimated_minutes: u32,
    pub dependencies: Vec<String>,
}

/// Estimated minutes per artifact kind.
const fn weight_for(kind: ArtifactKind) -> u32 {
    match kind {
        ArtifactKind::Component => 5,
        ArtifactKind::Api => 4,
        ArtifactKind::Test => 3,
        ArtifactKind::Story => 2,
    }
}

/// Estimate above which a plan is marked high priority.
const HIGH_PRIORITY_MINUTES: u32 = 20;

/// Builds the plan: stable-sorts artifacts by declared priority
/// (descending) and accumulates the time estimate from per-kind weights.
#[must_use]
pub fn build_plan(spec: &RequirementSpec) -> GenerationPlan {
    let mut artifacts = spec.all_artifacts();
    artifacts.sort_by_key(|a| std::cmp::Reverse(a.priority));

    let estimated_minutes = artifacts.iter().map(|a| weight_for(a.kind)).sum();
    let priority = if estimated_minutes > HIGH_PRIORITY_MINUTES {
        PlanPriority::High
    } else {
        PlanPriority::Normal
    };

    GenerationPlan {
        artifacts,
        priority,
        estimated_minutes,
        dependencies: spec.dependencies.clone(),
    }
}
