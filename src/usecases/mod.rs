//! Use case layer: application workflows and the chat session controller.

pub mod bootstrap;
pub mod chat_session;
pub mod context;
pub mod contracts;
pub mod load_messages;
pub mod mark_read;
pub mod send_message;
pub mod timer;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
