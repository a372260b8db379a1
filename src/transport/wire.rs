//! JSON text frames exchanged with the realtime server.
//!
//! Every frame is an object `{"event": <name>, "data": {...}}` with
//! camelCase payload fields.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        compose::TypingSignal,
        events::RealtimeEvent,
        ids::{ConversationId, MessageId, UserId},
        message::{DeliveryStatus, Message},
    },
    usecases::contracts::TransportError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub status: DeliveryStatus,
}

/// Frames the server pushes to the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundFrame {
    MessageReceived(Message),
    UserTyping(TypingPayload),
    UserStoppedTyping(TypingPayload),
    MessageStatusUpdated(StatusPayload),
}

impl From<InboundFrame> for RealtimeEvent {
    fn from(frame: InboundFrame) -> Self {
        match frame {
            InboundFrame::MessageReceived(message) => RealtimeEvent::MessageReceived(message),
            InboundFrame::UserTyping(payload) => RealtimeEvent::UserTyping {
                conversation_id: payload.conversation_id,
                user_id: payload.user_id,
            },
            InboundFrame::UserStoppedTyping(payload) => RealtimeEvent::UserStoppedTyping {
                conversation_id: payload.conversation_id,
                user_id: payload.user_id,
            },
            InboundFrame::MessageStatusUpdated(payload) => RealtimeEvent::MessageStatusUpdated {
                conversation_id: payload.conversation_id,
                message_id: payload.message_id,
                status: payload.status,
            },
        }
    }
}

/// Frames the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundFrame {
    JoinConversation(RoomPayload),
    LeaveConversation(RoomPayload),
    TypingStart(TypingPayload),
    TypingStop(TypingPayload),
}

impl OutboundFrame {
    pub fn join(conversation_id: &ConversationId) -> Self {
        Self::JoinConversation(RoomPayload {
            conversation_id: conversation_id.clone(),
        })
    }

    pub fn leave(conversation_id: &ConversationId) -> Self {
        Self::LeaveConversation(RoomPayload {
            conversation_id: conversation_id.clone(),
        })
    }

    pub fn typing(conversation_id: &ConversationId, user_id: &UserId, signal: TypingSignal) -> Self {
        let payload = TypingPayload {
            conversation_id: conversation_id.clone(),
            user_id: user_id.clone(),
        };
        match signal {
            TypingSignal::Started => Self::TypingStart(payload),
            TypingSignal::Stopped => Self::TypingStop(payload),
        }
    }
}

pub fn decode_inbound(text: &str) -> Result<RealtimeEvent, serde_json::Error> {
    serde_json::from_str::<InboundFrame>(text).map(RealtimeEvent::from)
}

pub fn encode_outbound(frame: &OutboundFrame) -> Result<String, TransportError> {
    serde_json::to_string(frame).map_err(|error| TransportError::Encode(error.to_string()))
}
