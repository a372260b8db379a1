use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    domain::{
        conversation::{Conversation, ParticipantProfile},
        ids::{ConversationId, MessageId, UserId},
        message::{DeliveryStatus, Message},
    },
    usecases::contracts::{ConversationRepository, RepositoryError, SendMessageRequest},
};

/// Scripted repository that records every call. Failures stay in effect
/// until recovered.
#[derive(Debug, Default)]
pub struct FakeRepository {
    inner: Mutex<FakeRepositoryState>,
}

#[derive(Debug, Default)]
struct FakeRepositoryState {
    history: Vec<Message>,
    fetch_error: Option<RepositoryError>,
    send_error: Option<RepositoryError>,
    mark_read_error: Option<RepositoryError>,
    fetch_calls: Vec<(ConversationId, usize)>,
    sent: Vec<SendMessageRequest>,
    read_receipts: Vec<Vec<MessageId>>,
}

impl FakeRepository {
    pub fn with_history(history: Vec<Message>) -> Self {
        let repository = Self::default();
        repository.state().history = history;
        repository
    }

    pub fn fail_fetch(&self, error: RepositoryError) {
        self.state().fetch_error = Some(error);
    }

    pub fn recover_fetch(&self) {
        self.state().fetch_error = None;
    }

    pub fn fail_send(&self, error: RepositoryError) {
        self.state().send_error = Some(error);
    }

    pub fn recover_send(&self) {
        self.state().send_error = None;
    }

    pub fn fail_mark_read(&self, error: RepositoryError) {
        self.state().mark_read_error = Some(error);
    }

    pub fn fetch_calls(&self) -> Vec<(ConversationId, usize)> {
        self.state().fetch_calls.clone()
    }

    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.state().sent.clone()
    }

    pub fn read_receipts(&self) -> Vec<Vec<MessageId>> {
        self.state().read_receipts.clone()
    }

    fn state(&self) -> MutexGuard<'_, FakeRepositoryState> {
        self.inner.lock().expect("fake repository lock")
    }
}

#[async_trait]
impl ConversationRepository for FakeRepository {
    async fn conversation(&self, id: &ConversationId) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: id.clone(),
            participant_ids: vec![UserId::new("me"), UserId::new("pro")],
            other_participant: ParticipantProfile {
                name: "Dana Plumbing".to_owned(),
                avatar_url: None,
                is_online: true,
            },
        })
    }

    async fn fetch_messages(
        &self,
        id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut state = self.state();
        state.fetch_calls.push((id.clone(), limit));
        match state.fetch_error.clone() {
            Some(error) => Err(error),
            None => Ok(state.history.clone()),
        }
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message, RepositoryError> {
        let mut state = self.state();
        state.sent.push(request.clone());
        if let Some(error) = state.send_error.clone() {
            return Err(error);
        }

        Ok(Message {
            id: MessageId::new(format!("sent-{}", state.sent.len())),
            conversation_id: request.conversation_id.clone(),
            sender_id: request.sender_id.clone(),
            content: request.content.clone(),
            kind: request.kind,
            attachments: request.attachments.clone(),
            created_at: Utc::now(),
            is_read: false,
            status: DeliveryStatus::Sent,
        })
    }

    async fn mark_messages_as_read(
        &self,
        _id: &ConversationId,
        message_ids: &[MessageId],
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        state.read_receipts.push(message_ids.to_vec());
        match state.mark_read_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
