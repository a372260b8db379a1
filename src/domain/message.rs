use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ConversationId, MessageId, UserId};

/// Content kind of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Media,
}

/// Delivery state reported by the server through status updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "_id")]
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub status: DeliveryStatus,
}

impl Message {
    pub fn is_from(&self, user_id: &UserId) -> bool {
        &self.sender_id == user_id
    }

    /// Display content: a media marker followed by the text, if any.
    pub fn display_content(&self) -> String {
        match (self.kind, self.content.is_empty()) {
            (MessageKind::Media, true) => "[Media]".to_owned(),
            (MessageKind::Media, false) => format!("[Media] {}", self.content),
            (MessageKind::Text, _) => self.content.clone(),
        }
    }

    /// Applies a server status update. Status never moves backwards.
    pub fn apply_status(&mut self, status: DeliveryStatus) {
        if status > self.status {
            self.status = status;
        }
        if status == DeliveryStatus::Read {
            self.is_read = true;
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::TimeZone;

    use super::*;

    pub fn message(id: &str, sender: &str, second: i64) -> Message {
        Message {
            id: MessageId::new(id),
            conversation_id: ConversationId::new("c-1"),
            sender_id: UserId::new(sender),
            content: format!("body {id}"),
            kind: MessageKind::Text,
            attachments: Vec::new(),
            created_at: Utc
                .timestamp_opt(1_700_000_000 + second, 0)
                .single()
                .expect("valid timestamp"),
            is_read: false,
            status: DeliveryStatus::Sent,
        }
    }
}
