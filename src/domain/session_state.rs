use std::{collections::VecDeque, time::Duration};

use super::{
    alert::Alert, compose::Composer, conversation::Conversation, ids::ConversationId,
    timeline::MessageTimeline, typing::TypingState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    /// History load failed; only an explicit retry leaves this phase.
    LoadFailed,
    Active,
    Closed,
}

/// Everything the chat view renders for one open conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSessionState {
    conversation_id: ConversationId,
    conversation: Option<Conversation>,
    phase: SessionPhase,
    timeline: MessageTimeline,
    typing: TypingState,
    composer: Composer,
    sending: bool,
    local_typing: bool,
    alerts: VecDeque<Alert>,
    scroll_to_end: bool,
}

impl ChatSessionState {
    pub fn new(conversation_id: ConversationId, remote_typing_expiry: Duration) -> Self {
        Self {
            conversation_id,
            conversation: None,
            phase: SessionPhase::Loading,
            timeline: MessageTimeline::default(),
            typing: TypingState::new(remote_typing_expiry),
            composer: Composer::default(),
            sending: false,
            local_typing: false,
            alerts: VecDeque::new(),
            scroll_to_end: false,
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn timeline(&self) -> &MessageTimeline {
        &self.timeline
    }

    pub fn typing(&self) -> &TypingState {
        &self.typing
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// True while a send is in flight; the send action is disabled.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_locally_typing(&self) -> bool {
        self.local_typing
    }

    pub fn pending_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Removes and returns the oldest unacknowledged alert.
    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alerts.pop_front()
    }

    /// Returns and resets the pending scroll-to-end request.
    pub fn take_scroll_to_end(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_end)
    }

    pub(crate) fn set_conversation(&mut self, conversation: Conversation) {
        self.conversation = Some(conversation);
    }

    pub(crate) fn set_loading(&mut self) {
        self.phase = SessionPhase::Loading;
    }

    /// Activates the session with a fetched history. Messages that arrived
    /// live before the fetch succeeded stay in the timeline.
    pub(crate) fn set_active(&mut self, history: MessageTimeline) {
        self.timeline.merge(history);
        self.phase = SessionPhase::Active;
        self.scroll_to_end = !self.timeline.is_empty();
    }

    pub(crate) fn set_load_failed(&mut self) {
        self.phase = SessionPhase::LoadFailed;
    }

    pub(crate) fn set_closed(&mut self) {
        self.phase = SessionPhase::Closed;
        self.typing.clear();
        self.local_typing = false;
    }

    pub(crate) fn timeline_mut(&mut self) -> &mut MessageTimeline {
        &mut self.timeline
    }

    pub(crate) fn typing_mut(&mut self) -> &mut TypingState {
        &mut self.typing
    }

    pub(crate) fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    pub(crate) fn set_sending(&mut self, sending: bool) {
        self.sending = sending;
    }

    pub(crate) fn set_local_typing(&mut self, typing: bool) {
        self.local_typing = typing;
    }

    pub(crate) fn push_alert(&mut self, alert: Alert) {
        self.alerts.push_back(alert);
    }

    pub(crate) fn request_scroll_to_end(&mut self) {
        self.scroll_to_end = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{alert::AlertSeverity, message::fixtures::message};

    fn state() -> ChatSessionState {
        ChatSessionState::new(ConversationId::new("c-1"), Duration::from_secs(3))
    }

    #[test]
    fn starts_loading_with_empty_view() {
        let state = state();

        assert_eq!(state.phase(), SessionPhase::Loading);
        assert!(state.timeline().is_empty());
        assert!(state.typing().is_empty());
        assert!(!state.is_sending());
        assert!(state.conversation().is_none());
    }

    #[test]
    fn activation_with_history_requests_scroll() {
        let mut state = state();

        state.set_active(MessageTimeline::from_history(vec![message("m1", "a", 1)]));

        assert_eq!(state.phase(), SessionPhase::Active);
        assert!(state.take_scroll_to_end());
        assert!(!state.take_scroll_to_end());
    }

    #[test]
    fn activation_keeps_messages_received_before_history() {
        let mut state = state();
        state.set_load_failed();
        state.timeline_mut().insert(message("live", "b", 5));

        state.set_active(MessageTimeline::from_history(vec![message("m1", "a", 1)]));

        let ids: Vec<&str> = state.timeline().messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "live"]);
        assert!(state.take_scroll_to_end());
    }

    #[test]
    fn activation_without_history_does_not_scroll() {
        let mut state = state();

        state.set_active(MessageTimeline::default());

        assert!(!state.take_scroll_to_end());
    }

    #[test]
    fn alerts_are_drained_in_order() {
        let mut state = state();
        state.push_alert(Alert::history_load_failed());
        state.push_alert(Alert::send_failed());

        assert_eq!(state.pending_alerts().count(), 2);
        assert_eq!(
            state.take_alert().map(|a| a.severity),
            Some(AlertSeverity::Blocking)
        );
        assert_eq!(
            state.take_alert().map(|a| a.severity),
            Some(AlertSeverity::NonBlocking)
        );
        assert_eq!(state.take_alert(), None);
    }

    #[test]
    fn closing_clears_typing_indicators() {
        let mut state = state();
        state
            .typing_mut()
            .start("pro".into(), std::time::Instant::now());
        state.set_local_typing(true);

        state.set_closed();

        assert_eq!(state.phase(), SessionPhase::Closed);
        assert!(state.typing().is_empty());
        assert!(!state.is_locally_typing());
    }
}
