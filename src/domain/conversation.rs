use serde::{Deserialize, Serialize};

use super::ids::{ConversationId, UserId};

/// Profile of the other participant, denormalized for the chat header.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantProfile {
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_online: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(alias = "_id")]
    pub id: ConversationId,
    pub participant_ids: Vec<UserId>,
    #[serde(default)]
    pub other_participant: ParticipantProfile,
}

impl Conversation {
    /// Returns the first participant that is not `self_id`.
    pub fn other_participant_id(&self, self_id: &UserId) -> Option<&UserId> {
        self.participant_ids.iter().find(|id| *id != self_id)
    }

    /// Header line: participant name plus presence marker.
    pub fn header_label(&self) -> String {
        let presence = if self.other_participant.is_online {
            "online"
        } else {
            "offline"
        };
        format!("{} ({presence})", self.other_participant.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Conversation {
        Conversation {
            id: ConversationId::new("c-1"),
            participant_ids: vec![UserId::new("me"), UserId::new("pro")],
            other_participant: ParticipantProfile {
                name: "Dana Plumbing".to_owned(),
                avatar_url: None,
                is_online: true,
            },
        }
    }

    #[test]
    fn resolves_other_participant() {
        let conversation = conversation();

        assert_eq!(
            conversation.other_participant_id(&UserId::new("me")),
            Some(&UserId::new("pro"))
        );
    }

    #[test]
    fn other_participant_is_none_for_self_only_conversation() {
        let mut conversation = conversation();
        conversation.participant_ids = vec![UserId::new("me")];

        assert_eq!(conversation.other_participant_id(&UserId::new("me")), None);
    }

    #[test]
    fn header_label_includes_presence() {
        let mut conversation = conversation();
        assert_eq!(conversation.header_label(), "Dana Plumbing (online)");

        conversation.other_participant.is_online = false;
        assert_eq!(conversation.header_label(), "Dana Plumbing (offline)");
    }

    #[test]
    fn decodes_server_payload_with_mongo_style_id() {
        let raw = r#"{
            "_id": "c-9",
            "participantIds": ["a", "b"],
            "otherParticipant": {"name": "Bo", "avatarUrl": "https://x/y.png", "isOnline": false}
        }"#;

        let conversation: Conversation = serde_json::from_str(raw).expect("decode");

        assert_eq!(conversation.id, ConversationId::new("c-9"));
        assert_eq!(
            conversation.other_participant.avatar_url.as_deref(),
            Some("https://x/y.png")
        );
    }
}
