use super::{
    ids::{ConversationId, MessageId, UserId},
    message::{DeliveryStatus, Message},
};

/// Event classes a chat session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealtimeEventKind {
    MessageReceived,
    UserTyping,
    UserStoppedTyping,
    MessageStatusUpdated,
}

impl RealtimeEventKind {
    pub const ALL: [RealtimeEventKind; 4] = [
        Self::MessageReceived,
        Self::UserTyping,
        Self::UserStoppedTyping,
        Self::MessageStatusUpdated,
    ];

    /// Event name on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageReceived => "message_received",
            Self::UserTyping => "user_typing",
            Self::UserStoppedTyping => "user_stopped_typing",
            Self::MessageStatusUpdated => "message_status_updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    MessageReceived(Message),
    UserTyping {
        conversation_id: ConversationId,
        user_id: UserId,
    },
    UserStoppedTyping {
        conversation_id: ConversationId,
        user_id: UserId,
    },
    MessageStatusUpdated {
        conversation_id: ConversationId,
        message_id: MessageId,
        status: DeliveryStatus,
    },
}

impl RealtimeEvent {
    pub fn kind(&self) -> RealtimeEventKind {
        match self {
            Self::MessageReceived(_) => RealtimeEventKind::MessageReceived,
            Self::UserTyping { .. } => RealtimeEventKind::UserTyping,
            Self::UserStoppedTyping { .. } => RealtimeEventKind::UserStoppedTyping,
            Self::MessageStatusUpdated { .. } => RealtimeEventKind::MessageStatusUpdated,
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            Self::MessageReceived(message) => &message.conversation_id,
            Self::UserTyping {
                conversation_id, ..
            }
            | Self::UserStoppedTyping {
                conversation_id, ..
            }
            | Self::MessageStatusUpdated {
                conversation_id, ..
            } => conversation_id,
        }
    }
}

/// Everything a chat session reacts to besides direct user calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Realtime(RealtimeEvent),
    /// The local typing inactivity timer fired.
    LocalTypingTimeout { generation: u64 },
    /// A remote typing deadline passed.
    TypingExpirySweep { generation: u64 },
}

/// A user intent read from the terminal shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Put the text in the draft and submit it.
    Send(String),
    /// Replace the draft without sending.
    Draft(String),
    /// The chat view regained focus.
    Focus,
    /// Retry a failed history load.
    Retry,
    Quit,
}
