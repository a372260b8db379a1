//! API layer: HTTP adapter for conversation history, sending and read receipts.

pub mod http;

pub use http::{HttpClientError, HttpConversationRepository};

/// Returns the api module name for smoke checks.
pub fn module_name() -> &'static str {
    "api"
}
