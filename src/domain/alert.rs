/// How an alert interrupts the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    /// Must be acknowledged before the view is usable.
    Blocking,
    /// Informational; input stays enabled.
    NonBlocking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub title: &'static str,
    pub message: &'static str,
}

impl Alert {
    pub fn history_load_failed() -> Self {
        Self {
            severity: AlertSeverity::Blocking,
            title: "Error",
            message: "Failed to load messages. Please try again.",
        }
    }

    pub fn send_failed() -> Self {
        Self {
            severity: AlertSeverity::NonBlocking,
            title: "Error",
            message: "Failed to send message. Please try again.",
        }
    }
}
