//! Plain-text formatting for the chat shell.

use chrono::Local;

use crate::domain::{
    alert::{Alert, AlertSeverity},
    ids::UserId,
    message::{DeliveryStatus, Message},
    session_state::{ChatSessionState, SessionPhase},
};

const SELF_LABEL: &str = "You";
const FALLBACK_PARTNER_LABEL: &str = "Them";

pub fn header_line(state: &ChatSessionState) -> String {
    match state.conversation() {
        Some(conversation) => format!("== {} ==", conversation.header_label()),
        None => format!("== Conversation {} ==", state.conversation_id()),
    }
}

pub fn phase_line(phase: SessionPhase) -> Option<&'static str> {
    match phase {
        SessionPhase::Loading => Some("Loading messages..."),
        SessionPhase::LoadFailed => Some("Messages could not be loaded. Type /retry to try again."),
        SessionPhase::Active => None,
        SessionPhase::Closed => Some("Conversation closed."),
    }
}

/// `[HH:MM] Sender: content`, with a delivery marker on own messages.
pub fn message_line(message: &Message, self_id: &UserId, partner_name: &str) -> String {
    let time = message.created_at.with_timezone(&Local).format("%H:%M");
    let own = message.is_from(self_id);
    let sender = if own { SELF_LABEL } else { partner_name };
    let content = message.display_content();

    if own {
        format!("[{time}] {sender}: {content} {}", status_marker(message.status))
    } else {
        format!("[{time}] {sender}: {content}")
    }
}

pub fn status_marker(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Sent => "(sent)",
        DeliveryStatus::Delivered => "(delivered)",
        DeliveryStatus::Read => "(read)",
    }
}

pub fn typing_line(state: &ChatSessionState) -> Option<String> {
    if state.typing().is_empty() {
        return None;
    }

    let who = match state.conversation() {
        Some(conversation) => conversation.other_participant.name.clone(),
        None => state
            .typing()
            .participants()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    };
    Some(format!("{who} is typing..."))
}

pub fn alert_line(alert: &Alert) -> String {
    match alert.severity {
        AlertSeverity::Blocking => format!("!! {}: {}", alert.title, alert.message),
        AlertSeverity::NonBlocking => format!("! {}: {}", alert.title, alert.message),
    }
}

pub fn partner_name(state: &ChatSessionState) -> &str {
    state
        .conversation()
        .map(|conversation| conversation.other_participant.name.as_str())
        .unwrap_or(FALLBACK_PARTNER_LABEL)
}
