use thiserror::Error;

use crate::domain::ids::{ConversationId, MessageId};

use super::contracts::{ConversationRepository, RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("read receipt was not delivered: {0}")]
pub struct MarkReadError(#[from] pub RepositoryError);

/// Sends one read receipt covering `message_ids`. An empty id list makes
/// no call.
pub async fn mark_messages_as_read(
    repository: &dyn ConversationRepository,
    conversation_id: &ConversationId,
    message_ids: &[MessageId],
) -> Result<(), MarkReadError> {
    if message_ids.is_empty() {
        return Ok(());
    }

    repository
        .mark_messages_as_read(conversation_id, message_ids)
        .await?;

    Ok(())
}
