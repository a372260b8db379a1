//! UI layer: line-oriented chat shell over stdin/stdout.

mod event_source;
pub mod shell;
mod view;

pub(crate) use event_source::StdinCommandSource;

/// Returns the UI module name for smoke checks.
pub fn module_name() -> &'static str {
    "ui"
}
