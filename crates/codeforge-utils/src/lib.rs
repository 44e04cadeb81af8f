//! Foundation utilities for codeforge
//!
//! Shared error taxonomy, content hashing, atomic file writes, tracing
//! initialization, and the small set of types every pipeline crate needs.

pub mod atomic_write;
pub mod error;
pub mod hash;
pub mod logging;
pub mod types;

pub use atomic_write::write_file_atomic;
pub use hash::content_hash;
pub use types::{ArtifactKind, Severity};
