//! Remote typing indicators for one conversation.

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use super::ids::UserId;

/// Participants currently typing, each with an expiry deadline. Entries
/// expire when no stop signal arrives within `expiry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingState {
    expiry: Duration,
    typers: BTreeMap<UserId, Instant>,
}

impl TypingState {
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            typers: BTreeMap::new(),
        }
    }

    /// Adds or refreshes a typer. Returns true when the id is new.
    pub fn start(&mut self, user_id: UserId, now: Instant) -> bool {
        self.typers.insert(user_id, now + self.expiry).is_none()
    }

    /// Removes a typer. Returns true when the id was present.
    pub fn stop(&mut self, user_id: &UserId) -> bool {
        self.typers.remove(user_id).is_some()
    }

    /// Drops every entry whose deadline is at or before `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<UserId> {
        let expired: Vec<UserId> = self
            .typers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(user_id, _)| user_id.clone())
            .collect();

        for user_id in &expired {
            self.typers.remove(user_id);
        }

        expired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.typers.values().min().copied()
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.typers.contains_key(user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.typers.is_empty()
    }

    pub fn participants(&self) -> impl Iterator<Item = &UserId> {
        self.typers.keys()
    }

    pub fn clear(&mut self) {
        self.typers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRY: Duration = Duration::from_secs(3);

    #[test]
    fn start_then_stop_leaves_no_typers() {
        let mut state = TypingState::new(EXPIRY);
        let now = Instant::now();

        assert!(state.start(UserId::new("pro"), now));
        assert!(state.contains(&UserId::new("pro")));

        assert!(state.stop(&UserId::new("pro")));
        assert!(state.is_empty());
    }

    #[test]
    fn repeated_start_refreshes_deadline() {
        let mut state = TypingState::new(EXPIRY);
        let now = Instant::now();
        state.start(UserId::new("pro"), now);

        let later = now + Duration::from_secs(2);
        assert!(!state.start(UserId::new("pro"), later));

        assert_eq!(state.next_deadline(), Some(later + EXPIRY));
    }

    #[test]
    fn expire_drops_only_stale_entries() {
        let mut state = TypingState::new(EXPIRY);
        let now = Instant::now();
        state.start(UserId::new("early"), now);
        state.start(UserId::new("late"), now + Duration::from_secs(2));

        let expired = state.expire(now + EXPIRY);

        assert_eq!(expired, vec![UserId::new("early")]);
        assert!(state.contains(&UserId::new("late")));
    }

    #[test]
    fn stop_for_unknown_user_is_noop() {
        let mut state = TypingState::new(EXPIRY);

        assert!(!state.stop(&UserId::new("ghost")));
    }
}
