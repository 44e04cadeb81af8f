//! Seven-phase pipeline orchestrator
//!
//! Understand → LoadContext → Plan → Execute → Validate → Integrate →
//! Document & Learn. Each phase has its own input/output contract; a
//! failure generating or writing one artifact never blocks its siblings.
//! An unhandled error anywhere is recorded to the learning model once and
//! surfaced as a failed outcome.

use crate::outcome::{GenerationRequest, IntegrationResult, ProcessOutcome, SkippedArtifact};
use crate::plan::{build_plan, parse_requirement, GenerationPlan, RequirementAnalysis};
use crate::registry::GeneratorRegistry;
use crate::traits::{
    ErrorRecord, GeneratedArtifact, GenerationRecord, LearningModel, MemoryStore, ProjectContext,
};
use camino::Utf8PathBuf;
use chrono::Utc;
use codeforge_client::{Message, RequestClient};
use codeforge_format::Formatter;
use codeforge_utils::error::EngineError;
use codeforge_utils::logging::{log_phase_complete, log_phase_error, log_phase_start};
use codeforge_utils::{write_file_atomic, Severity};
use codeforge_validation::Validator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

const UNDERSTAND_SYSTEM_PROMPT: &str = "You are a requirement analyst for a code generation \
pipeline. Given a request and project context, respond with a single JSON object: \
{\"type\", \"complexity\", \"domain\", \"confidence\", \"components\": [{\"name\", \
\"priority\", \"description\"}], \"tests\": [...], \"stories\": [...], \"apis\": [...], \
\"dependencies\": [...]}. Respond with JSON only, no prose.";

/// Everything the pipeline accumulated for one request.
struct PipelineReport {
    integration: IntegrationResult,
    errors: Vec<String>,
    warnings: Vec<String>,
    degraded_analysis: bool,
}

/// The pipeline driver. Owns no global state: the client, registry, and
/// collaborators are injected by the composition root.
pub struct Orchestrator {
    client: Arc<RequestClient>,
    validator: Validator,
    formatter: Formatter,
    registry: GeneratorRegistry,
    memory: Arc<dyn MemoryStore>,
    learning: Arc<dyn LearningModel>,
    workspace_root: Utf8PathBuf,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        client: Arc<RequestClient>,
        validator: Validator,
        formatter: Formatter,
        registry: GeneratorRegistry,
        memory: Arc<dyn MemoryStore>,
        learning: Arc<dyn LearningModel>,
        workspace_root: Utf8PathBuf,
    ) -> Self {
        Self {
            client,
            validator,
            formatter,
            registry,
            memory,
            learning,
            workspace_root,
        }
    }

    /// Runs the full pipeline for one request.
    ///
    /// Per-artifact failures accumulate into the outcome's `errors` and
    /// `warnings` lists without aborting the batch. A pipeline-level
    /// failure is recorded to the learning model and returned as a failed
    /// outcome with the error text.
    pub async fn process_request(
        &self,
        prompt: &str,
        context: HashMap<String, serde_json::Value>,
    ) -> ProcessOutcome {
        let request = GenerationRequest::new(prompt, context);
        let request_id = request.id();
        tracing::info!(request_id = %request_id, "Processing generation request");

        match self.run_pipeline(&request, &request_id).await {
            Ok(report) => {
                let written = report.integration.written_count();
                ProcessOutcome {
                    success: true,
                    message: format!(
                        "Wrote {written} artifact(s), {} failed, {} skipped",
                        report.errors.len(),
                        report.integration.skipped.len()
                    ),
                    results: Some(report.integration),
                    error: None,
                    errors: report.errors,
                    warnings: report.warnings,
                    degraded_analysis: report.degraded_analysis,
                }
            }
            Err(e) => {
                let error_text = e.to_string();
                self.record_pipeline_error(&request, &error_text).await;
                tracing::error!(request_id = %request_id, error = %error_text, "Pipeline failed");
                ProcessOutcome::failure(error_text)
            }
        }
    }

    async fn run_pipeline(
        &self,
        request: &GenerationRequest,
        request_id: &str,
    ) -> Result<PipelineReport, EngineError> {
        // Phase 1: Understand
        let analysis = self
            .phase(request_id, "understand", self.understand(request))
            .await?;
        let degraded_analysis = analysis.is_fallback();
        let spec = analysis.spec().clone();

        // Phase 2: LoadContext
        let project = self
            .phase(request_id, "load_context", self.load_context(request, &spec))
            .await?;

        // Phase 3: Plan
        let plan = build_plan(&spec);
        tracing::info!(
            request_id = %request_id,
            artifacts = plan.artifacts.len(),
            estimated_minutes = plan.estimated_minutes,
            priority = ?plan.priority,
            "Plan built"
        );

        // Phase 4: Execute
        let (generated, errors) = self
            .phase(request_id, "execute", self.execute(&plan, &project))
            .await?;

        // Phase 5: Validate
        let (accepted, mut warnings) = self
            .phase(request_id, "validate", self.validate(generated))
            .await?;

        // Phase 6: Integrate
        let integration = self
            .phase(
                request_id,
                "integrate",
                self.integrate(&plan, &project, accepted, &mut warnings),
            )
            .await?;

        // Phase 7: Document & Learn
        self.phase(
            request_id,
            "document_learn",
            self.document_and_learn(request, &integration, &errors),
        )
        .await?;

        Ok(PipelineReport {
            integration,
            errors,
            warnings,
            degraded_analysis,
        })
    }

    /// Wraps a phase future with start/complete/error logging.
    async fn phase<T>(
        &self,
        request_id: &str,
        name: &str,
        fut: impl std::future::Future<Output = Result<T, EngineError>>,
    ) -> Result<T, EngineError> {
        log_phase_start(request_id, name);
        let started = Instant::now();
        match fut.await {
            Ok(value) => {
                log_phase_complete(request_id, name, started.elapsed().as_millis() as u64);
                Ok(value)
            }
            Err(e) => {
                log_phase_error(request_id, name, &e.to_string());
                Err(e)
            }
        }
    }

    /// Phase 1: optimize the prompt, ask the remote endpoint for a
    /// structured requirement, and enrich it with similar past runs.
    async fn understand(
        &self,
        request: &GenerationRequest,
    ) -> Result<RequirementAnalysis, EngineError> {
        let optimized = self.learning.optimize_prompt(&request.prompt).await?;

        let context_json = serde_json::to_string(&request.context).unwrap_or_default();
        let messages = vec![
            Message::system(UNDERSTAND_SYSTEM_PROMPT),
            Message::user(format!("{optimized}\n\nProject context: {context_json}")),
        ];
        let completion = self.client.send_request(messages).await?;

        let mut analysis = parse_requirement(&completion.content, &request.prompt);

        let similar = self.memory.find_similar(&request.prompt).await?;
        if !similar.is_empty() {
            tracing::debug!(count = similar.len(), "Found similar past generations");
            let spec = match &mut analysis {
                RequirementAnalysis::Parsed(spec) | RequirementAnalysis::Fallback(spec) => spec,
            };
            // Past successes with a similar prompt raise analysis confidence
            spec.confidence = (spec.confidence + 0.1).min(1.0);
        }

        Ok(analysis)
    }

    /// Phase 2: fetch project state and work out which declared
    /// dependencies are missing.
    async fn load_context(
        &self,
        request: &GenerationRequest,
        spec: &crate::plan::RequirementSpec,
    ) -> Result<ProjectContext, EngineError> {
        let stack = request
            .context
            .get("tech_stack")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let state = self
            .memory
            .get_project_state(&spec.request_type, &stack)
            .await?;

        let mut missing_dependencies = Vec::new();
        for dependency in &spec.dependencies {
            if !self.memory.check_dependency(dependency).await? {
                missing_dependencies.push(dependency.clone());
            }
        }

        Ok(ProjectContext {
            state,
            missing_dependencies,
        })
    }

    /// Phase 4: run the matching generator for each planned artifact. One
    /// generator failing does not abort the batch.
    async fn execute(
        &self,
        plan: &GenerationPlan,
        project: &ProjectContext,
    ) -> Result<(Vec<GeneratedArtifact>, Vec<String>), EngineError> {
        let mut generated = Vec::new();
        let mut errors = Vec::new();

        for artifact in &plan.artifacts {
            let Some(generator) = self.registry.get(artifact.kind) else {
                errors.push(format!(
                    "{}: no generator registered for kind '{}'",
                    artifact.name, artifact.kind
                ));
                continue;
            };
            match generator.generate(artifact, project).await {
                Ok(result) => generated.push(result),
                Err(e) => {
                    tracing::warn!(artifact = %artifact.name, error = %e, "Generator failed");
                    errors.push(format!("{}: {e}", artifact.name));
                }
            }
        }

        Ok((generated, errors))
    }

    /// Phase 5: format then validate every generated artifact. Invalid
    /// artifacts are dropped with a warning; accepted ones carry their
    /// formatted code forward.
    async fn validate(
        &self,
        generated: Vec<GeneratedArtifact>,
    ) -> Result<(Vec<GeneratedArtifact>, Vec<String>), EngineError> {
        let mut accepted = Vec::new();
        let mut warnings = Vec::new();

        for mut artifact in generated {
            let (formatted, report) = self
                .formatter
                .format_and_validate(&artifact.code, &artifact.language, &self.validator)
                .await;

            if report.valid {
                if report.severity == Severity::Warning {
                    for issue in &report.issues {
                        warnings.push(format!("{}: {}", artifact.path, issue.message));
                    }
                }
                artifact.code = formatted.code;
                accepted.push(artifact);
            } else {
                let summary = report
                    .issues
                    .iter()
                    .map(|i| i.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::warn!(artifact = %artifact.path, issues = %summary, "Artifact rejected");
                warnings.push(format!("{} failed validation: {summary}", artifact.path));
            }
        }

        Ok((accepted, warnings))
    }

    /// Phase 6: write accepted artifacts under the workspace root. A write
    /// failure skips that artifact only. The dependency manifest is updated
    /// once at the end when the plan declared missing dependencies.
    async fn integrate(
        &self,
        plan: &GenerationPlan,
        project: &ProjectContext,
        accepted: Vec<GeneratedArtifact>,
        warnings: &mut Vec<String>,
    ) -> Result<IntegrationResult, EngineError> {
        let mut result = IntegrationResult::default();

        for artifact in accepted {
            let target = self.workspace_root.join(&artifact.path);
            match write_file_atomic(&target, &artifact.code) {
                Ok(write) if write.replaced => result.updated.push(artifact.path.to_string()),
                Ok(_) => result.added.push(artifact.path.to_string()),
                Err(e) => {
                    tracing::warn!(path = %artifact.path, error = %e, "Integration write failed");
                    result.skipped.push(SkippedArtifact {
                        path: artifact.path.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !plan.dependencies.is_empty() && !project.missing_dependencies.is_empty() {
            if let Err(e) = self.update_manifest(&project.missing_dependencies) {
                warnings.push(format!("dependency manifest update failed: {e}"));
            }
        }

        Ok(result)
    }

    /// Adds missing dependencies to `package.json` in one write. A missing
    /// manifest is created; a malformed one is an error so user edits are
    /// never clobbered.
    fn update_manifest(&self, missing: &[String]) -> Result<(), EngineError> {
        let path = self.workspace_root.join("package.json");
        let mut manifest: serde_json::Value = if path.is_file() {
            let raw = std::fs::read_to_string(&path).map_err(|e| EngineError::Integration {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
            serde_json::from_str(&raw).map_err(|e| EngineError::Integration {
                path: path.to_string(),
                reason: format!("malformed manifest: {e}"),
            })?
        } else {
            serde_json::json!({})
        };

        let deps = manifest
            .as_object_mut()
            .ok_or_else(|| EngineError::Integration {
                path: path.to_string(),
                reason: "manifest root is not an object".to_string(),
            })?
            .entry("dependencies")
            .or_insert_with(|| serde_json::json!({}));
        let Some(table) = deps.as_object_mut() else {
            return Err(EngineError::Integration {
                path: path.to_string(),
                reason: "dependencies field is not an object".to_string(),
            });
        };

        for name in missing {
            table
                .entry(name.clone())
                .or_insert_with(|| serde_json::json!("latest"));
        }

        let serialized =
            serde_json::to_string_pretty(&manifest).map_err(|e| EngineError::Integration {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        write_file_atomic(&path, &serialized).map_err(|e| EngineError::Integration {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(count = missing.len(), "Dependency manifest updated");
        Ok(())
    }

    /// Phase 7: persist the generation record, feed the outcome back to the
    /// learning model, and write a companion document when anything was
    /// added.
    async fn document_and_learn(
        &self,
        request: &GenerationRequest,
        integration: &IntegrationResult,
        errors: &[String],
    ) -> Result<(), EngineError> {
        let success = errors.is_empty() && integration.skipped.is_empty();
        let mut artifacts = integration.added.clone();
        artifacts.extend(integration.updated.iter().cloned());

        let record = GenerationRecord {
            prompt: request.prompt.clone(),
            context: request.context.clone(),
            success,
            artifacts,
            timestamp: Utc::now(),
        };

        self.memory.save_generation(&record).await?;
        self.memory.record_generation(&record).await?;
        self.learning
            .record_generation_result(&request.prompt, success)
            .await?;

        if !integration.added.is_empty() {
            self.write_companion_doc(request, integration)?;
        }

        Ok(())
    }

    /// Companion documentation is a deterministic artifact index; it makes
    /// no further remote calls.
    fn write_companion_doc(
        &self,
        request: &GenerationRequest,
        integration: &IntegrationResult,
    ) -> Result<(), EngineError> {
        let path = self
            .workspace_root
            .join("docs")
            .join("generated")
            .join(format!("{}.md", request.id()));

        let mut doc = String::new();
        doc.push_str("# Generated artifacts\n\n");
        doc.push_str(&format!("Request: {}\n\n", request.prompt));
        doc.push_str(&format!(
            "Date: {}\n\n",
            request.timestamp.format("%Y-%m-%d %H:%M UTC")
        ));
        doc.push_str("## Added\n\n");
        for added in &integration.added {
            doc.push_str(&format!("- `{added}`\n"));
        }
        if !integration.updated.is_empty() {
            doc.push_str("\n## Updated\n\n");
            for updated in &integration.updated {
                doc.push_str(&format!("- `{updated}`\n"));
            }
        }

        write_file_atomic(&path, &doc).map_err(|e| EngineError::Integration {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Records an unhandled pipeline error for future avoidance. Recording
    /// failures are logged, never propagated over the original error.
    async fn record_pipeline_error(&self, request: &GenerationRequest, error: &str) {
        let record = ErrorRecord {
            error: error.to_string(),
            prompt: request.prompt.clone(),
            context: request.context.clone(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.learning.record_error(&record).await {
            tracing::warn!(error = %e, "Failed to record pipeline error");
        }
    }
}
