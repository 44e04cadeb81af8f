//! Shared stubs for integration tests: a scriptable transport and in-memory
//! collaborator implementations.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use codeforge::client::{ChatRequest, ChatResponse, Choice, ChoiceMessage, RemoteTransport, Usage};
use codeforge::engine::{
    ArtifactGenerator, ArtifactSpec, ErrorRecord, GeneratedArtifact, GenerationRecord,
    LearningModel, MemoryStats, MemoryStore, ProjectContext, ProjectState,
};
use codeforge::utils::error::{ClientError, EngineError};
use codeforge::utils::ArtifactKind;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

pub fn chat_response(content: &str, model: &str) -> ChatResponse {
    ChatResponse {
        choices: vec![Choice {
            message: ChoiceMessage {
                content: content.to_string(),
            },
        }],
        model: model.to_string(),
        usage: Usage::default(),
    }
}

/// Transport driven by a script of responses. Once the script is empty it
/// keeps returning the default response, so tests only script the
/// interesting prefix.
pub struct StubTransport {
    script: Mutex<VecDeque<Result<ChatResponse, ClientError>>>,
    default_content: String,
    calls: AtomicU32,
    models_seen: Mutex<Vec<String>>,
}

impl StubTransport {
    pub fn always(content: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_content: content.to_string(),
            calls: AtomicU32::new(0),
            models_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted(script: Vec<Result<ChatResponse, ClientError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default_content: "{}".to_string(),
            calls: AtomicU32::new(0),
            models_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn models_seen(&self) -> Vec<String> {
        self.models_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteTransport for StubTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.models_seen.lock().unwrap().push(request.model.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(chat_response(&self.default_content, &request.model)),
        }
    }
}

/// Memory store that records everything it is told and serves configured
/// project state.
#[derive(Default)]
pub struct RecordingMemory {
    pub saved: Mutex<Vec<GenerationRecord>>,
    pub recorded: Mutex<Vec<GenerationRecord>>,
    pub similar: Mutex<Vec<GenerationRecord>>,
    pub present_dependencies: Mutex<Vec<String>>,
}

#[async_trait]
impl MemoryStore for RecordingMemory {
    async fn get_project_state(
        &self,
        _project_type: &str,
        stack: &[String],
    ) -> Result<ProjectState, EngineError> {
        Ok(ProjectState {
            structure: vec!["src".to_string()],
            existing_artifacts: Vec::new(),
            tech_stack: stack.to_vec(),
        })
    }

    async fn check_dependency(&self, name: &str) -> Result<bool, EngineError> {
        Ok(self
            .present_dependencies
            .lock()
            .unwrap()
            .iter()
            .any(|d| d == name))
    }

    async fn find_similar(&self, _query: &str) -> Result<Vec<GenerationRecord>, EngineError> {
        Ok(self.similar.lock().unwrap().clone())
    }

    async fn record_generation(&self, record: &GenerationRecord) -> Result<(), EngineError> {
        self.recorded.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn save_generation(&self, record: &GenerationRecord) -> Result<(), EngineError> {
        self.saved.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn get_stats(&self) -> Result<MemoryStats, EngineError> {
        Ok(MemoryStats {
            generations: self.saved.lock().unwrap().len() as u64,
            errors: 0,
        })
    }
}

/// Learning model that passes prompts through untouched and records calls.
#[derive(Default)]
pub struct RecordingLearning {
    pub results: Mutex<Vec<(String, bool)>>,
    pub errors: Mutex<Vec<ErrorRecord>>,
}

#[async_trait]
impl LearningModel for RecordingLearning {
    async fn optimize_prompt(&self, prompt: &str) -> Result<String, EngineError> {
        Ok(prompt.to_string())
    }

    async fn record_generation_result(
        &self,
        prompt: &str,
        success: bool,
    ) -> Result<(), EngineError> {
        self.results.lock().unwrap().push((prompt.to_string(), success));
        Ok(())
    }

    async fn record_error(&self, record: &ErrorRecord) -> Result<(), EngineError> {
        self.errors.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Generator returning fixed code, or failing when `fail` is set.
pub struct StubGenerator {
    kind: ArtifactKind,
    code: String,
    fail_for: Option<String>,
}

impl StubGenerator {
    pub fn new(kind: ArtifactKind, code: &str) -> Self {
        Self {
            kind,
            code: code.to_string(),
            fail_for: None,
        }
    }

    /// Fails only for the artifact with the given name.
    pub fn failing_for(mut self, name: &str) -> Self {
        self.fail_for = Some(name.to_string());
        self
    }
}

#[async_trait]
impl ArtifactGenerator for StubGenerator {
    fn kind(&self) -> ArtifactKind {
        self.kind
    }

    async fn generate(
        &self,
        spec: &ArtifactSpec,
        _project: &ProjectContext,
    ) -> Result<GeneratedArtifact, EngineError> {
        if self.fail_for.as_deref() == Some(spec.name.as_str()) {
            return Err(EngineError::Generation {
                kind: self.kind.as_str().to_string(),
                message: format!("stub failure for {}", spec.name),
            });
        }
        Ok(GeneratedArtifact {
            name: spec.name.clone(),
            kind: self.kind,
            path: format!("src/{}/{}.ts", self.kind, spec.name).into(),
            code: self.code.clone(),
            language: "typescript".to_string(),
        })
    }
}
