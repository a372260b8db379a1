//! Domain layer: core entities and business rules.

pub mod alert;
pub mod compose;
pub mod conversation;
pub mod events;
pub mod ids;
pub mod message;
pub mod session_state;
pub mod timeline;
pub mod typing;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
