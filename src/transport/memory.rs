//! In-process realtime transport that records what a session emits.

use std::sync::Mutex;

use crate::{
    domain::{
        compose::TypingSignal,
        events::{RealtimeEvent, RealtimeEventKind},
        ids::{ConversationId, UserId},
    },
    usecases::contracts::{EventHandler, RealtimeChannel, Subscription, TransportError},
};

use super::hub::EventHub;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Join(ConversationId),
    Leave(ConversationId),
    Typing {
        conversation_id: ConversationId,
        user_id: UserId,
        signal: TypingSignal,
    },
}

#[derive(Default)]
pub struct InMemoryTransport {
    hub: EventHub,
    calls: Mutex<Vec<TransportCall>>,
}

impl InMemoryTransport {
    /// Simulates a server push.
    pub fn publish(&self, event: RealtimeEvent) -> usize {
        self.hub.dispatch(event)
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn subscriber_count(&self, kind: RealtimeEventKind) -> usize {
        self.hub.subscriber_count(kind)
    }

    fn record(&self, call: TransportCall) -> Result<(), TransportError> {
        self.calls.lock().expect("calls lock").push(call);
        Ok(())
    }
}

impl RealtimeChannel for InMemoryTransport {
    fn join(&self, id: &ConversationId) -> Result<(), TransportError> {
        self.record(TransportCall::Join(id.clone()))
    }

    fn leave(&self, id: &ConversationId) -> Result<(), TransportError> {
        self.record(TransportCall::Leave(id.clone()))
    }

    fn emit_typing(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        signal: TypingSignal,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Typing {
            conversation_id: id.clone(),
            user_id: user_id.clone(),
            signal,
        })
    }

    fn subscribe(&self, kind: RealtimeEventKind, handler: EventHandler) -> Subscription {
        self.hub.subscribe(kind, handler)
    }
}
