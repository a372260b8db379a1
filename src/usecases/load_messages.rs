use thiserror::Error;

use crate::domain::{ids::ConversationId, message::Message};

use super::contracts::{ConversationRepository, RepositoryError};

const DEFAULT_MESSAGES_PAGE_SIZE: usize = 50;
const MAX_MESSAGES_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMessagesQuery {
    pub conversation_id: ConversationId,
    pub limit: usize,
}

impl LoadMessagesQuery {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            limit: DEFAULT_MESSAGES_PAGE_SIZE,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn normalized_limit(&self) -> usize {
        match self.limit {
            0 => DEFAULT_MESSAGES_PAGE_SIZE,
            value if value > MAX_MESSAGES_PAGE_SIZE => MAX_MESSAGES_PAGE_SIZE,
            value => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMessagesOutput {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadMessagesError {
    #[error("not authorized to read this conversation")]
    Unauthorized,
    #[error("message history is temporarily unavailable")]
    TemporarilyUnavailable,
    #[error("message history payload was malformed")]
    DataContractViolation,
    #[error("conversation was not found")]
    ConversationNotFound,
}

pub async fn load_messages(
    repository: &dyn ConversationRepository,
    query: LoadMessagesQuery,
) -> Result<LoadMessagesOutput, LoadMessagesError> {
    let limit = query.normalized_limit();
    let messages = repository
        .fetch_messages(&query.conversation_id, limit)
        .await
        .map_err(map_source_error)?;

    Ok(LoadMessagesOutput { messages })
}

fn map_source_error(error: RepositoryError) -> LoadMessagesError {
    match error {
        RepositoryError::Unauthorized => LoadMessagesError::Unauthorized,
        RepositoryError::Unavailable => LoadMessagesError::TemporarilyUnavailable,
        RepositoryError::InvalidData => LoadMessagesError::DataContractViolation,
        RepositoryError::NotFound => LoadMessagesError::ConversationNotFound,
    }
}
