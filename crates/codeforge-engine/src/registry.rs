//! Capability-keyed generator registry
//!
//! Generators are resolved once at composition time, keyed by artifact
//! kind. Lookup at execute time is infallible-by-construction when the
//! registry was built with [`GeneratorRegistry::require_complete`].

use crate::traits::ArtifactGenerator;
use codeforge_utils::error::EngineError;
use codeforge_utils::ArtifactKind;
use std::collections::HashMap;
use std::sync::Arc;

/// Artifact kind → generator mapping.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: HashMap<ArtifactKind, Arc<dyn ArtifactGenerator>>,
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("kinds", &self.registered_kinds())
            .finish()
    }
}

impl GeneratorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a generator under its declared kind, replacing any
    /// previous registration for that kind.
    #[must_use]
    pub fn with(mut self, generator: Arc<dyn ArtifactGenerator>) -> Self {
        self.generators.insert(generator.kind(), generator);
        self
    }

    #[must_use]
    pub fn get(&self, kind: ArtifactKind) -> Option<&Arc<dyn ArtifactGenerator>> {
        self.generators.get(&kind)
    }

    #[must_use]
    pub fn registered_kinds(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL
            .into_iter()
            .filter(|kind| self.generators.contains_key(kind))
            .collect()
    }

    /// Verifies every artifact kind has a generator.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing kind.
    pub fn require_complete(self) -> Result<Self, EngineError> {
        for kind in ArtifactKind::ALL {
            if !self.generators.contains_key(&kind) {
                return Err(EngineError::Generation {
                    kind: kind.as_str().to_string(),
                    message: "no generator registered for this artifact kind".to_string(),
                });
            }
        }
        Ok(self)
    }
}
