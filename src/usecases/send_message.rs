//! Use case for sending a message to a conversation.

use thiserror::Error;

use crate::domain::{
    ids::{ConversationId, UserId},
    message::{Message, MessageKind},
};

use super::contracts::{ConversationRepository, RepositoryError, SendMessageRequest};

/// Command to send a message to a specific conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageCommand {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub recipient_id: Option<UserId>,
    pub text: String,
    pub kind: MessageKind,
    pub attachments: Vec<String>,
}

impl SendMessageCommand {
    pub fn text(
        conversation_id: ConversationId,
        sender_id: UserId,
        recipient_id: Option<UserId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id,
            sender_id,
            recipient_id,
            text: text.into(),
            kind: MessageKind::Text,
            attachments: Vec::new(),
        }
    }
}

/// Domain-level errors for the send operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// Message text is empty after trimming and carries no attachments.
    #[error("message is empty")]
    EmptyMessage,
    /// The session's sending flag is still set. `ChatSession::submit`
    /// takes `&mut self`, so one owner cannot overlap sends; this only
    /// fires if the flag outlives a finished send.
    #[error("a message is already being sent")]
    AlreadySending,
    /// History has not loaded, or the session is closed.
    #[error("conversation is not open")]
    SessionNotActive,
    #[error("not authorized to send messages")]
    Unauthorized,
    #[error("conversation was not found")]
    ConversationNotFound,
    #[error("message service is temporarily unavailable")]
    TemporarilyUnavailable,
    #[error("send response was malformed")]
    DataContractViolation,
}

/// Validates the command and delegates to the repository.
///
/// Text is trimmed before sending. Media messages may have empty text as
/// long as they carry attachments.
pub async fn send_message(
    repository: &dyn ConversationRepository,
    command: SendMessageCommand,
) -> Result<Message, SendMessageError> {
    let content = command.text.trim();
    if content.is_empty() && command.attachments.is_empty() {
        return Err(SendMessageError::EmptyMessage);
    }

    let request = SendMessageRequest {
        conversation_id: command.conversation_id,
        sender_id: command.sender_id,
        recipient_id: command.recipient_id,
        content: content.to_owned(),
        kind: command.kind,
        attachments: command.attachments,
    };

    repository
        .send_message(&request)
        .await
        .map_err(map_source_error)
}

fn map_source_error(error: RepositoryError) -> SendMessageError {
    match error {
        RepositoryError::Unauthorized => SendMessageError::Unauthorized,
        RepositoryError::NotFound => SendMessageError::ConversationNotFound,
        RepositoryError::Unavailable => SendMessageError::TemporarilyUnavailable,
        RepositoryError::InvalidData => SendMessageError::DataContractViolation,
    }
}
