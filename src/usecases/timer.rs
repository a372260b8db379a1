//! Cancellable delayed events owned by a session.

use std::time::Duration;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

use crate::domain::events::SessionEvent;

/// A single-shot timer that delivers a `SessionEvent` into the session's
/// queue. Re-arming replaces the pending fire; dropping the timer aborts it.
///
/// Every arm gets a new generation number carried by the event, so a fire
/// that was already queued when the timer was re-armed or cancelled is
/// recognised as stale by `acknowledge`.
#[derive(Debug)]
pub struct ScopedTimer {
    name: &'static str,
    generation: u64,
    handle: Option<JoinHandle<()>>,
    events: UnboundedSender<SessionEvent>,
}

impl ScopedTimer {
    pub fn new(name: &'static str, events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            name,
            generation: 0,
            handle: None,
            events,
        }
    }

    /// Arms (or re-arms) the timer. `event` receives the new generation.
    pub fn arm<F>(&mut self, after: Duration, event: F) -> u64
    where
        F: FnOnce(u64) -> SessionEvent,
    {
        self.abort_task();
        self.generation += 1;

        let generation = self.generation;
        let event = event(generation);
        let events = self.events.clone();
        let name = self.name;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if events.send(event).is_err() {
                tracing::debug!(timer = name, "timer fired after its session was dropped");
            }
        }));

        generation
    }

    pub fn cancel(&mut self) {
        if self.handle.is_some() {
            self.abort_task();
            self.generation += 1;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    /// Consumes a fire. Returns false for a stale generation.
    pub fn acknowledge(&mut self, generation: u64) -> bool {
        if self.handle.is_none() || generation != self.generation {
            return false;
        }
        self.handle = None;
        true
    }

    fn abort_task(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        self.abort_task();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn timeout_event(generation: u64) -> SessionEvent {
        SessionEvent::LocalTypingTimeout { generation }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = ScopedTimer::new("test", tx);

        let generation = timer.arm(Duration::from_secs(3), timeout_event);
        tokio::time::sleep(Duration::from_secs(3)).await;

        let event = rx.recv().await.expect("timer should fire");
        assert_eq!(event, SessionEvent::LocalTypingTimeout { generation });
        assert!(timer.acknowledge(generation));
        assert!(!timer.is_armed());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_postpones_the_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = ScopedTimer::new("test", tx);

        timer.arm(Duration::from_secs(3), timeout_event);
        tokio::time::sleep(Duration::from_secs(2)).await;
        let second = timer.arm(Duration::from_secs(3), timeout_event);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(1)).await;
        let event = rx.recv().await.expect("re-armed timer should fire");
        assert_eq!(
            event,
            SessionEvent::LocalTypingTimeout { generation: second }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = ScopedTimer::new("test", tx);

        timer.arm(Duration::from_secs(3), timeout_event);
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(rx.try_recv().is_err());
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timer = ScopedTimer::new("test", tx);

        let first = timer.arm(Duration::from_secs(3), timeout_event);
        let second = timer.arm(Duration::from_secs(3), timeout_event);

        assert!(!timer.acknowledge(first));
        assert!(timer.acknowledge(second));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_pending_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = ScopedTimer::new("test", tx);

        timer.arm(Duration::from_secs(3), timeout_event);
        drop(timer);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(rx.try_recv().is_err());
    }
}
