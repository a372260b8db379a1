//! Controller for one open conversation view.
//!
//! A `ChatSession` loads history, keeps the room joined while the view is
//! open, marks incoming messages read, tracks remote typing indicators and
//! drives local typing signals from the compose draft. All realtime events
//! and timer fires arrive through one queue drained by `next_event`, so the
//! session is only ever mutated from the task that owns it.

use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::domain::{
    alert::Alert,
    compose::{CursorMotion, DraftEdit, DraftPolicy, TypingSignal},
    events::{RealtimeEvent, RealtimeEventKind, SessionEvent},
    ids::{ConversationId, MessageId, UserId},
    message::Message,
    session_state::{ChatSessionState, SessionPhase},
    timeline::{InsertOutcome, MessageTimeline},
};

use super::{
    contracts::{ConversationRepository, EventHandler, RealtimeChannel, Subscription},
    load_messages::{load_messages, LoadMessagesQuery},
    mark_read::mark_messages_as_read,
    send_message::{send_message, SendMessageCommand, SendMessageError},
    timer::ScopedTimer,
};

const SESSION_MOUNTED: &str = "CHAT_SESSION_MOUNTED";
const SESSION_CLOSED: &str = "CHAT_SESSION_CLOSED";
const HISTORY_LOADED: &str = "CHAT_HISTORY_LOADED";
const HISTORY_LOAD_FAILED: &str = "CHAT_HISTORY_LOAD_FAILED";
const CONVERSATION_LOOKUP_FAILED: &str = "CHAT_CONVERSATION_LOOKUP_FAILED";
const READ_RECEIPT_FAILED: &str = "CHAT_READ_RECEIPT_FAILED";
const SEND_FAILED: &str = "CHAT_SEND_FAILED";
const ROOM_JOIN_FAILED: &str = "CHAT_ROOM_JOIN_FAILED";
const ROOM_LEAVE_FAILED: &str = "CHAT_ROOM_LEAVE_FAILED";
const TYPING_EMIT_FAILED: &str = "CHAT_TYPING_EMIT_FAILED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Local inactivity window before a synthetic typing stop is sent.
    pub typing_timeout: Duration,
    /// How long a remote typing indicator survives without a stop signal.
    pub remote_typing_expiry: Duration,
    pub history_page_size: usize,
    pub draft_on_send_failure: DraftPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            typing_timeout: Duration::from_secs(3),
            remote_typing_expiry: Duration::from_secs(3),
            history_page_size: 50,
            draft_on_send_failure: DraftPolicy::Retain,
        }
    }
}

pub struct ChatSession<R, T>
where
    R: ConversationRepository,
    T: RealtimeChannel,
{
    self_id: UserId,
    repository: R,
    transport: T,
    config: SessionConfig,
    state: ChatSessionState,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    subscriptions: Vec<Subscription>,
    joined: bool,
    local_typing_timer: ScopedTimer,
    typing_expiry_timer: ScopedTimer,
    /// Ids a read receipt was already attempted for in this focus session.
    receipts_sent: HashSet<MessageId>,
}

impl<R, T> ChatSession<R, T>
where
    R: ConversationRepository,
    T: RealtimeChannel,
{
    pub fn new(
        conversation_id: ConversationId,
        self_id: UserId,
        repository: R,
        transport: T,
        config: SessionConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let state = ChatSessionState::new(conversation_id, config.remote_typing_expiry);

        Self {
            self_id,
            repository,
            transport,
            state,
            local_typing_timer: ScopedTimer::new("local_typing", events_tx.clone()),
            typing_expiry_timer: ScopedTimer::new("remote_typing_expiry", events_tx.clone()),
            events_tx,
            events_rx,
            subscriptions: Vec::new(),
            joined: false,
            receipts_sent: HashSet::new(),
            config,
        }
    }

    pub fn state(&self) -> &ChatSessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChatSessionState {
        &mut self.state
    }

    pub fn self_id(&self) -> &UserId {
        &self.self_id
    }

    pub fn conversation_id(&self) -> &ConversationId {
        self.state.conversation_id()
    }

    /// Subscribes to the conversation's events, joins its room and loads
    /// history. Calling it again on a mounted session does nothing.
    pub async fn mount(&mut self) {
        if self.state.phase() == SessionPhase::Closed || !self.subscriptions.is_empty() {
            return;
        }

        self.subscribe_all();
        self.join_room();

        tracing::info!(
            code = SESSION_MOUNTED,
            conversation_id = %self.state.conversation_id(),
            "chat session mounted"
        );

        self.load().await;
    }

    /// Re-runs the history load after a failure. Returns false when the
    /// session is not in the failed state.
    pub async fn retry_load(&mut self) -> bool {
        if self.state.phase() != SessionPhase::LoadFailed {
            return false;
        }

        self.load().await;
        true
    }

    /// The view came back to the foreground: messages may have arrived
    /// while it was hidden.
    pub async fn on_focus(&mut self) {
        if self.state.phase() != SessionPhase::Active {
            return;
        }

        self.receipts_sent.clear();
        self.mark_unread_as_read().await;
    }

    /// Waits for the next queued realtime event or timer fire.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Handles every event already queued without waiting for more.
    /// Returns how many were handled.
    pub async fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    pub async fn handle_event(&mut self, event: SessionEvent) {
        if self.state.phase() == SessionPhase::Closed {
            return;
        }

        match event {
            SessionEvent::Realtime(event) => self.apply_realtime(event).await,
            SessionEvent::LocalTypingTimeout { generation } => {
                if self.local_typing_timer.acknowledge(generation) {
                    self.stop_local_typing("inactivity_timeout");
                }
            }
            SessionEvent::TypingExpirySweep { generation } => {
                if self.typing_expiry_timer.acknowledge(generation) {
                    let expired = self.state.typing_mut().expire(now());
                    if !expired.is_empty() {
                        tracing::debug!(
                            expired = expired.len(),
                            "remote typing indicators expired without a stop signal"
                        );
                    }
                    self.rearm_typing_expiry();
                }
            }
        }
    }

    pub fn input_char(&mut self, ch: char) {
        let edit = self.state.composer_mut().insert_char(ch);
        self.after_edit(edit);
    }

    pub fn backspace(&mut self) {
        let edit = self.state.composer_mut().delete_char_before();
        self.after_edit(edit);
    }

    pub fn delete(&mut self) {
        let edit = self.state.composer_mut().delete_char_at();
        self.after_edit(edit);
    }

    pub fn set_draft(&mut self, text: &str) {
        let edit = self.state.composer_mut().set_text(text);
        self.after_edit(edit);
    }

    pub fn move_cursor(&mut self, motion: CursorMotion) {
        self.state.composer_mut().move_cursor(motion);
    }

    /// Sends the current draft and waits for the server's answer.
    ///
    /// On success the draft is cleared and the returned message joins the
    /// timeline. On failure a non-blocking alert is raised and the draft is
    /// kept or dropped according to `SessionConfig::draft_on_send_failure`.
    /// The exclusive borrow serializes submits; the sending flag exists for
    /// renderers and is cleared on every outcome.
    pub async fn submit(&mut self) -> Result<Message, SendMessageError> {
        if self.state.phase() != SessionPhase::Active {
            return Err(SendMessageError::SessionNotActive);
        }
        if self.state.is_sending() {
            return Err(SendMessageError::AlreadySending);
        }
        let Some(submission) = self.state.composer().submit() else {
            return Err(SendMessageError::EmptyMessage);
        };

        self.apply_signal(submission.signal, "submitted");
        if self.config.draft_on_send_failure == DraftPolicy::Clear {
            self.state.composer_mut().clear();
        }

        let recipient_id = self
            .state
            .conversation()
            .and_then(|conversation| conversation.other_participant_id(&self.self_id))
            .cloned();
        let command = SendMessageCommand::text(
            self.state.conversation_id().clone(),
            self.self_id.clone(),
            recipient_id,
            submission.text,
        );

        self.state.set_sending(true);
        let result = send_message(&self.repository, command).await;
        self.state.set_sending(false);

        match result {
            Ok(message) => {
                self.state.composer_mut().clear();
                if let InsertOutcome::Duplicate = self.state.timeline_mut().insert(message.clone())
                {
                    tracing::debug!(
                        message_id = %message.id,
                        "sent message was already delivered over the realtime channel"
                    );
                }
                self.state.request_scroll_to_end();
                tracing::debug!(message_id = %message.id, "message sent");
                Ok(message)
            }
            Err(error) => {
                tracing::warn!(
                    code = SEND_FAILED,
                    conversation_id = %self.state.conversation_id(),
                    error = %error,
                    "message send failed"
                );
                self.state.push_alert(Alert::send_failed());
                Err(error)
            }
        }
    }

    /// Tears the session down: handlers are removed, the room is left and
    /// every timer is cancelled. Safe to call more than once.
    pub fn close(&mut self) {
        if self.state.phase() == SessionPhase::Closed {
            return;
        }

        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        self.stop_local_typing("session_closed");
        self.typing_expiry_timer.cancel();

        if self.joined {
            if let Err(error) = self.transport.leave(self.state.conversation_id()) {
                tracing::warn!(
                    code = ROOM_LEAVE_FAILED,
                    conversation_id = %self.state.conversation_id(),
                    error = %error,
                    "failed to leave conversation room"
                );
            }
            self.joined = false;
        }

        self.state.set_closed();
        tracing::info!(
            code = SESSION_CLOSED,
            conversation_id = %self.state.conversation_id(),
            "chat session closed"
        );
    }

    fn subscribe_all(&mut self) {
        for kind in RealtimeEventKind::ALL {
            let events = self.events_tx.clone();
            let handler: EventHandler = Arc::new(move |event| {
                let _ = events.send(SessionEvent::Realtime(event));
            });
            self.subscriptions
                .push(self.transport.subscribe(kind, handler));
        }
    }

    fn join_room(&mut self) {
        match self.transport.join(self.state.conversation_id()) {
            Ok(()) => self.joined = true,
            Err(error) => tracing::warn!(
                code = ROOM_JOIN_FAILED,
                conversation_id = %self.state.conversation_id(),
                error = %error,
                "failed to join conversation room"
            ),
        }
    }

    async fn load(&mut self) {
        self.state.set_loading();
        let conversation_id = self.state.conversation_id().clone();

        if self.state.conversation().is_none() {
            match self.repository.conversation(&conversation_id).await {
                Ok(conversation) => self.state.set_conversation(conversation),
                Err(error) => tracing::warn!(
                    code = CONVERSATION_LOOKUP_FAILED,
                    conversation_id = %conversation_id,
                    error = %error,
                    "conversation details unavailable; header stays empty"
                ),
            }
        }

        let query =
            LoadMessagesQuery::new(conversation_id.clone()).with_limit(self.config.history_page_size);
        match load_messages(&self.repository, query).await {
            Ok(output) => {
                tracing::info!(
                    code = HISTORY_LOADED,
                    conversation_id = %conversation_id,
                    messages = output.messages.len(),
                    "message history loaded"
                );
                self.state
                    .set_active(MessageTimeline::from_history(output.messages));
                self.mark_unread_as_read().await;
            }
            Err(error) => {
                tracing::warn!(
                    code = HISTORY_LOAD_FAILED,
                    conversation_id = %conversation_id,
                    error = %error,
                    "message history load failed"
                );
                self.state.set_load_failed();
                self.state.push_alert(Alert::history_load_failed());
            }
        }
    }

    async fn apply_realtime(&mut self, event: RealtimeEvent) {
        if event.conversation_id() != self.state.conversation_id() {
            tracing::trace!(
                event = event.kind().as_str(),
                "ignoring event for another conversation"
            );
            return;
        }

        match event {
            RealtimeEvent::MessageReceived(message) => self.receive_message(message).await,
            RealtimeEvent::UserTyping { user_id, .. } => {
                if user_id != self.self_id {
                    self.state.typing_mut().start(user_id, now());
                    self.rearm_typing_expiry();
                }
            }
            RealtimeEvent::UserStoppedTyping { user_id, .. } => {
                if self.state.typing_mut().stop(&user_id) {
                    self.rearm_typing_expiry();
                }
            }
            RealtimeEvent::MessageStatusUpdated {
                message_id, status, ..
            } => {
                if !self.state.timeline_mut().apply_status(&message_id, status) {
                    tracing::debug!(
                        message_id = %message_id,
                        "status update for a message outside the loaded history"
                    );
                }
            }
        }
    }

    async fn receive_message(&mut self, message: Message) {
        let message_id = message.id.clone();
        let sender_id = message.sender_id.clone();
        let is_remote = sender_id != self.self_id;
        let is_unread = !message.is_read;

        if let InsertOutcome::Duplicate = self.state.timeline_mut().insert(message) {
            tracing::debug!(message_id = %message_id, "dropping duplicate message delivery");
            return;
        }

        if is_remote {
            if self.state.typing_mut().stop(&sender_id) {
                self.rearm_typing_expiry();
            }
            if is_unread
                && self.state.phase() == SessionPhase::Active
                && !self.receipts_sent.contains(&message_id)
            {
                self.send_read_receipt(vec![message_id]).await;
            }
        }

        self.state.request_scroll_to_end();
    }

    async fn mark_unread_as_read(&mut self) {
        let ids: Vec<MessageId> = self
            .state
            .timeline()
            .unread_from_others(&self.self_id)
            .into_iter()
            .filter(|id| !self.receipts_sent.contains(id))
            .collect();

        self.send_read_receipt(ids).await;
    }

    async fn send_read_receipt(&mut self, ids: Vec<MessageId>) {
        if ids.is_empty() {
            return;
        }

        self.receipts_sent.extend(ids.iter().cloned());
        let conversation_id = self.state.conversation_id().clone();

        match mark_messages_as_read(&self.repository, &conversation_id, &ids).await {
            Ok(()) => {
                let changed = self.state.timeline_mut().mark_read(&ids);
                tracing::debug!(marked = changed, "read receipt delivered");
            }
            Err(error) => tracing::warn!(
                code = READ_RECEIPT_FAILED,
                conversation_id = %conversation_id,
                messages = ids.len(),
                error = %error,
                "read receipt failed"
            ),
        }
    }

    fn after_edit(&mut self, edit: DraftEdit) {
        if !edit.changed || self.state.phase() == SessionPhase::Closed {
            return;
        }

        match edit.signal {
            Some(signal) => self.apply_signal(signal, "draft_cleared"),
            None if !self.state.composer().is_empty() => self.start_local_typing(),
            None => {}
        }
    }

    fn apply_signal(&mut self, signal: TypingSignal, stop_reason: &'static str) {
        match signal {
            TypingSignal::Started => self.start_local_typing(),
            TypingSignal::Stopped => self.stop_local_typing(stop_reason),
        }
    }

    /// Opens a typing burst if none is running and (re)arms the inactivity
    /// timer.
    fn start_local_typing(&mut self) {
        if !self.state.is_locally_typing() {
            self.state.set_local_typing(true);
            self.emit_typing(TypingSignal::Started);
        }

        self.local_typing_timer
            .arm(self.config.typing_timeout, |generation| {
                SessionEvent::LocalTypingTimeout { generation }
            });
    }

    fn stop_local_typing(&mut self, reason: &'static str) {
        self.local_typing_timer.cancel();

        if self.state.is_locally_typing() {
            self.state.set_local_typing(false);
            self.emit_typing(TypingSignal::Stopped);
            tracing::debug!(reason, "local typing stopped");
        }
    }

    fn emit_typing(&self, signal: TypingSignal) {
        if let Err(error) =
            self.transport
                .emit_typing(self.state.conversation_id(), &self.self_id, signal)
        {
            tracing::warn!(
                code = TYPING_EMIT_FAILED,
                signal = ?signal,
                error = %error,
                "failed to emit typing signal"
            );
        }
    }

    fn rearm_typing_expiry(&mut self) {
        match self.state.typing().next_deadline() {
            Some(deadline) => {
                let delay = deadline.saturating_duration_since(now());
                self.typing_expiry_timer.arm(delay, |generation| {
                    SessionEvent::TypingExpirySweep { generation }
                });
            }
            None => self.typing_expiry_timer.cancel(),
        }
    }
}

impl<R, T> Drop for ChatSession<R, T>
where
    R: ConversationRepository,
    T: RealtimeChannel,
{
    fn drop(&mut self) {
        self.close();
    }
}

/// Current time on the runtime clock, so paused-time tests stay in step.
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
