use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    domain::events::{RealtimeEvent, RealtimeEventKind},
    usecases::contracts::{EventHandler, Subscription},
};

/// Fans decoded realtime events out to subscribed handlers.
#[derive(Clone, Default)]
pub struct EventHub {
    inner: Arc<Mutex<HubState>>,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    handlers: HashMap<RealtimeEventKind, Vec<(u64, EventHandler)>>,
}

impl EventHub {
    pub fn subscribe(&self, kind: RealtimeEventKind, handler: EventHandler) -> Subscription {
        let id = match self.inner.lock() {
            Ok(mut state) => {
                state.next_id += 1;
                let id = state.next_id;
                state.handlers.entry(kind).or_default().push((id, handler));
                id
            }
            Err(_) => {
                tracing::error!(event = kind.as_str(), "event hub lock poisoned; subscription inert");
                0
            }
        };

        let hub = Arc::downgrade(&self.inner);
        Subscription::new(kind, move || {
            let Some(inner) = hub.upgrade() else {
                return;
            };
            if let Ok(mut state) = inner.lock() {
                if let Some(handlers) = state.handlers.get_mut(&kind) {
                    handlers.retain(|(handler_id, _)| *handler_id != id);
                }
            };
        })
    }

    /// Delivers the event to every handler of its kind and returns how many
    /// received it. Handlers run outside the hub lock.
    pub fn dispatch(&self, event: RealtimeEvent) -> usize {
        let handlers: Vec<EventHandler> = self
            .inner
            .lock()
            .map(|state| {
                state
                    .handlers
                    .get(&event.kind())
                    .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default();

        for handler in &handlers {
            handler(event.clone());
        }

        handlers.len()
    }

    pub fn subscriber_count(&self, kind: RealtimeEventKind) -> usize {
        self.inner
            .lock()
            .map(|state| state.handlers.get(&kind).map_or(0, Vec::len))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::domain::ids::{ConversationId, UserId};

    fn typing(user: &str) -> RealtimeEvent {
        RealtimeEvent::UserTyping {
            conversation_id: ConversationId::new("c-1"),
            user_id: UserId::new(user),
        }
    }

    fn recorder() -> (EventHandler, Arc<StdMutex<Vec<RealtimeEvent>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: EventHandler = Arc::new(move |event| {
            sink.lock().expect("recorder lock").push(event);
        });
        (handler, seen)
    }

    #[test]
    fn dispatch_reaches_only_matching_kind() {
        let hub = EventHub::default();
        let (typing_handler, typing_seen) = recorder();
        let (status_handler, status_seen) = recorder();
        let _typing = hub.subscribe(RealtimeEventKind::UserTyping, typing_handler);
        let _status = hub.subscribe(RealtimeEventKind::MessageStatusUpdated, status_handler);

        let delivered = hub.dispatch(typing("pro"));

        assert_eq!(delivered, 1);
        assert_eq!(typing_seen.lock().expect("lock").len(), 1);
        assert!(status_seen.lock().expect("lock").is_empty());
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let hub = EventHub::default();
        let (handler, seen) = recorder();
        let subscription = hub.subscribe(RealtimeEventKind::UserTyping, handler);

        drop(subscription);
        let delivered = hub.dispatch(typing("pro"));

        assert_eq!(delivered, 0);
        assert!(seen.lock().expect("lock").is_empty());
        assert_eq!(hub.subscriber_count(RealtimeEventKind::UserTyping), 0);
    }

    #[test]
    fn unsubscribing_one_handler_keeps_the_others() {
        let hub = EventHub::default();
        let (first, _) = recorder();
        let (second, second_seen) = recorder();
        let first = hub.subscribe(RealtimeEventKind::UserTyping, first);
        let _second = hub.subscribe(RealtimeEventKind::UserTyping, second);

        first.unsubscribe();
        hub.dispatch(typing("pro"));

        assert_eq!(hub.subscriber_count(RealtimeEventKind::UserTyping), 1);
        assert_eq!(second_seen.lock().expect("lock").len(), 1);
    }

    #[test]
    fn subscription_outliving_hub_drops_cleanly() {
        let hub = EventHub::default();
        let (handler, _) = recorder();
        let subscription = hub.subscribe(RealtimeEventKind::UserTyping, handler);

        drop(hub);
        drop(subscription);
    }
}
