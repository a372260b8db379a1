//! Ordered message history of one conversation.

use std::collections::HashSet;

use super::{
    ids::{MessageId, UserId},
    message::{DeliveryStatus, Message},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Inserted at the given position.
    Inserted(usize),
    /// A message with the same id is already present.
    Duplicate,
}

/// Messages ordered by creation time ascending, ties broken by id.
/// Each message id appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageTimeline {
    messages: Vec<Message>,
}

impl MessageTimeline {
    pub fn from_history(history: Vec<Message>) -> Self {
        let mut seen = HashSet::new();
        let mut messages: Vec<Message> = history
            .into_iter()
            .filter(|message| seen.insert(message.id.clone()))
            .collect();
        messages.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| &message.id == id)
    }

    /// Inserts a message at its ordered position. Late arrivals land
    /// before newer messages instead of being appended.
    pub fn insert(&mut self, message: Message) -> InsertOutcome {
        if self.get(&message.id).is_some() {
            return InsertOutcome::Duplicate;
        }

        let key = (message.created_at, &message.id);
        let index = self
            .messages
            .partition_point(|existing| (existing.created_at, &existing.id) <= key);
        self.messages.insert(index, message);

        InsertOutcome::Inserted(index)
    }

    /// Folds a fetched history into the timeline. Messages already held
    /// (e.g. delivered live while the fetch was failing) are kept; for
    /// those the fetched copy can only advance delivery and read state.
    /// Returns how many messages were new.
    pub fn merge(&mut self, history: MessageTimeline) -> usize {
        let mut inserted = 0;
        for message in history.messages {
            let (id, status, is_read) = (message.id.clone(), message.status, message.is_read);
            match self.insert(message) {
                InsertOutcome::Inserted(_) => inserted += 1,
                InsertOutcome::Duplicate => {
                    self.apply_status(&id, status);
                    if is_read {
                        self.mark_read(std::slice::from_ref(&id));
                    }
                }
            }
        }
        inserted
    }

    /// Ids of unread messages not sent by `self_id`, in timeline order.
    pub fn unread_from_others(&self, self_id: &UserId) -> Vec<MessageId> {
        self.messages
            .iter()
            .filter(|message| !message.is_read && !message.is_from(self_id))
            .map(|message| message.id.clone())
            .collect()
    }

    /// Sets the read flag on the given ids; returns how many changed.
    pub fn mark_read(&mut self, ids: &[MessageId]) -> usize {
        let mut changed = 0;
        for message in self.messages.iter_mut() {
            if !message.is_read && ids.contains(&message.id) {
                message.is_read = true;
                changed += 1;
            }
        }
        changed
    }

    pub fn apply_status(&mut self, id: &MessageId, status: DeliveryStatus) -> bool {
        match self.messages.iter_mut().find(|message| &message.id == id) {
            Some(message) => {
                message.apply_status(status);
                true
            }
            None => false,
        }
    }
}
