//! codeforge: a generation pipeline that turns natural-language requests
//! into validated, formatted source artifacts merged into a project tree.
//!
//! The facade re-exports the member crates and provides [`compose`], which
//! wires a ready-to-use [`Orchestrator`] from a configuration, a transport,
//! a generator registry, and the external collaborators.

pub use codeforge_client as client;
pub use codeforge_config as config;
pub use codeforge_engine as engine;
pub use codeforge_format as format;
pub use codeforge_utils as utils;
pub use codeforge_validation as validation;

pub use codeforge_client::{HttpTransport, RemoteTransport, RequestClient};
pub use codeforge_config::{Config, SecurityPolicy};
pub use codeforge_engine::{
    ArtifactGenerator, GeneratorRegistry, LearningModel, MemoryStore, Orchestrator,
    ProcessOutcome,
};
pub use codeforge_format::Formatter;
pub use codeforge_utils::error::ForgeError;
pub use codeforge_utils::logging::init_tracing;
pub use codeforge_validation::Validator;

use camino::Utf8PathBuf;
use std::sync::Arc;

/// Builds an [`Orchestrator`] with all pipeline state owned by the returned
/// instance. Nothing here is global: callers hold the orchestrator and drop
/// it when done.
#[must_use]
pub fn compose(
    config: &Config,
    transport: Arc<dyn RemoteTransport>,
    registry: GeneratorRegistry,
    memory: Arc<dyn MemoryStore>,
    learning: Arc<dyn LearningModel>,
    workspace_root: Utf8PathBuf,
) -> Orchestrator {
    let client = Arc::new(RequestClient::new(
        transport,
        config.client.clone(),
        &workspace_root,
    ));
    let validator = Validator::new(config.validator.clone(), config.security.policy);
    let formatter = Formatter::new(config.formatter.clone(), &workspace_root);
    Orchestrator::new(
        client,
        validator,
        formatter,
        registry,
        memory,
        learning,
        workspace_root,
    )
}

/// Like [`compose`], but constructs the production HTTP transport from the
/// configuration.
///
/// # Errors
///
/// Returns an error when the API key environment variable is unset or the
/// HTTP client cannot be built.
pub fn compose_with_http(
    config: &Config,
    registry: GeneratorRegistry,
    memory: Arc<dyn MemoryStore>,
    learning: Arc<dyn LearningModel>,
    workspace_root: Utf8PathBuf,
) -> Result<Orchestrator, ForgeError> {
    let transport = HttpTransport::new_from_config(&config.client)?;
    Ok(compose(
        config,
        Arc::new(transport),
        registry,
        memory,
        learning,
        workspace_root,
    ))
}
