//! Remote chat-completion client
//!
//! [`RequestClient`] wraps a [`RemoteTransport`] with a blake3-keyed response
//! cache, a local rate window, exponential-backoff retries, and model
//! fallback rotation. Tests swap in a stub transport; production uses
//! [`HttpTransport`].

pub mod cache;
pub mod client;
pub mod transport;
pub mod types;

pub use cache::{CacheEntry, CacheStats, ResponseCache};
pub use client::{strip_code_fences, ClientMetrics, Completion, RequestClient};
pub use transport::{HttpTransport, RemoteTransport};
pub use types::{ChatRequest, ChatResponse, Choice, ChoiceMessage, Message, Role, Usage};
