use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    compose::TypingSignal,
    conversation::Conversation,
    events::{RealtimeEvent, RealtimeEventKind, ShellCommand},
    ids::{ConversationId, MessageId, UserId},
    message::{Message, MessageKind},
};

/// Errors reported by a conversation repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("request was not authorized")]
    Unauthorized,
    #[error("resource was not found")]
    NotFound,
    #[error("service is unavailable")]
    Unavailable,
    #[error("response did not match the expected shape")]
    InvalidData,
}

/// Payload of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub recipient_id: Option<UserId>,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub attachments: Vec<String>,
}

/// Conversation data access. Replaces reaching into a shared store: the
/// session only ever talks to the instance it was given.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn conversation(&self, id: &ConversationId) -> Result<Conversation, RepositoryError>;

    async fn fetch_messages(
        &self,
        id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message, RepositoryError>;

    async fn mark_messages_as_read(
        &self,
        id: &ConversationId,
        message_ids: &[MessageId],
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
impl<T> ConversationRepository for Arc<T>
where
    T: ConversationRepository + ?Sized,
{
    async fn conversation(&self, id: &ConversationId) -> Result<Conversation, RepositoryError> {
        (**self).conversation(id).await
    }

    async fn fetch_messages(
        &self,
        id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        (**self).fetch_messages(id, limit).await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message, RepositoryError> {
        (**self).send_message(request).await
    }

    async fn mark_messages_as_read(
        &self,
        id: &ConversationId,
        message_ids: &[MessageId],
    ) -> Result<(), RepositoryError> {
        (**self).mark_messages_as_read(id, message_ids).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("realtime transport is closed")]
    Closed,
    #[error("failed to encode realtime frame: {0}")]
    Encode(String),
}

/// Callback invoked for every event of a subscribed kind.
pub type EventHandler = Arc<dyn Fn(RealtimeEvent) + Send + Sync>;

/// Live subscription. Dropping it (or calling `unsubscribe`) removes the
/// handler from the transport.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    kind: RealtimeEventKind,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(kind: RealtimeEventKind, cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            kind,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn kind(&self) -> RealtimeEventKind {
        self.kind
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Realtime transport as seen by a chat session: room membership, typing
/// emission and typed event subscriptions.
pub trait RealtimeChannel: Send + Sync {
    fn join(&self, id: &ConversationId) -> Result<(), TransportError>;

    fn leave(&self, id: &ConversationId) -> Result<(), TransportError>;

    fn emit_typing(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        signal: TypingSignal,
    ) -> Result<(), TransportError>;

    fn subscribe(&self, kind: RealtimeEventKind, handler: EventHandler) -> Subscription;
}

impl<T> RealtimeChannel for Arc<T>
where
    T: RealtimeChannel + ?Sized,
{
    fn join(&self, id: &ConversationId) -> Result<(), TransportError> {
        (**self).join(id)
    }

    fn leave(&self, id: &ConversationId) -> Result<(), TransportError> {
        (**self).leave(id)
    }

    fn emit_typing(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        signal: TypingSignal,
    ) -> Result<(), TransportError> {
        (**self).emit_typing(id, user_id, signal)
    }

    fn subscribe(&self, kind: RealtimeEventKind, handler: EventHandler) -> Subscription {
        (**self).subscribe(kind, handler)
    }
}

/// Source of user intents for the interactive shell. `Ok(None)` means the
/// input is exhausted.
#[async_trait]
pub trait CommandSource: Send {
    async fn next_command(&mut self) -> anyhow::Result<Option<ShellCommand>>;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn subscription_cancels_once_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let subscription = Subscription::new(RealtimeEventKind::UserTyping, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(subscription);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_unsubscribe_does_not_cancel_twice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        Subscription::new(RealtimeEventKind::MessageReceived, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unsubscribe();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn send_request_serializes_camel_case() {
        let request = SendMessageRequest {
            conversation_id: ConversationId::new("c-1"),
            sender_id: UserId::new("me"),
            recipient_id: Some(UserId::new("pro")),
            content: "Hello".to_owned(),
            kind: MessageKind::Text,
            attachments: Vec::new(),
        };

        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["conversationId"], "c-1");
        assert_eq!(json["recipientId"], "pro");
        assert_eq!(json["type"], "text");
    }
}
