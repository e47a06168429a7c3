use super::protocol::WorkflowEvent;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::mpsc;

const RECENT_EVENTS_CAPACITY: usize = 200;

/// Fans workflow events out to any number of subscribers.
///
/// Broadcasting never blocks. Subscribers whose receiver has been dropped are
/// pruned on the next broadcast. The most recent events are kept for late readers.
pub struct EventBroadcaster {
    subscribers: DashMap<String, mpsc::UnboundedSender<WorkflowEvent>>,
    recent: Mutex<VecDeque<WorkflowEvent>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_EVENTS_CAPACITY)),
        }
    }

    /// Returns the subscriber id and its event stream
    pub fn subscribe(&self) -> (String, mpsc::UnboundedReceiver<WorkflowEvent>) {
        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id.clone(), tx);
        log::debug!("[EVENTS] Subscriber {} added", id);
        (id, rx)
    }

    pub fn unsubscribe(&self, id: &str) {
        if self.subscribers.remove(id).is_some() {
            log::debug!("[EVENTS] Subscriber {} removed", id);
        }
    }

    pub fn broadcast(&self, event: WorkflowEvent) {
        {
            let mut recent = self.recent.lock();
            if recent.len() == RECENT_EVENTS_CAPACITY {
                recent.pop_front();
            }
            recent.push_back(event.clone());
        }

        let mut closed = Vec::new();
        for entry in self.subscribers.iter() {
            if entry.value().send(event.clone()).is_err() {
                closed.push(entry.key().clone());
            }
        }
        for id in closed {
            self.subscribers.remove(&id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Oldest first
    pub fn recent_events(&self) -> Vec<WorkflowEvent> {
        self.recent.lock().iter().cloned().collect()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let broadcaster = EventBroadcaster::new();
        let (_id, mut rx) = broadcaster.subscribe();

        broadcaster.broadcast(WorkflowEvent::new("workflow_started", "run", json!({})));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "workflow_started");
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let broadcaster = EventBroadcaster::new();
        let (_id, rx) = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(rx);

        broadcaster.broadcast(WorkflowEvent::new("x", "run", json!({})));
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_recent_events_are_bounded() {
        let broadcaster = EventBroadcaster::new();
        for i in 0..(RECENT_EVENTS_CAPACITY + 5) {
            broadcaster.broadcast(WorkflowEvent::new(format!("e{}", i), "run", json!({})));
        }
        let recent = broadcaster.recent_events();
        assert_eq!(recent.len(), RECENT_EVENTS_CAPACITY);
        assert_eq!(recent[0].event, "e5");
    }
}
