//! Progress events for workflow runs.
//!
//! Published on a Tokio broadcast channel. Publishing with no subscribers is
//! normal and not an error; slow subscribers lag and lose the oldest events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::session::{Status, WorkflowType};

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    SessionStarted {
        session_id: String,
        workflow_type: WorkflowType,
        timestamp: DateTime<Utc>,
    },
    StepStarted {
        session_id: String,
        step_id: String,
        agent_id: String,
        timestamp: DateTime<Utc>,
    },
    StepFinished {
        session_id: String,
        step_id: String,
        agent_id: String,
        status: Status,
        duration_ms: u64,
        degraded: bool,
        timestamp: DateTime<Utc>,
    },
    SessionFinished {
        session_id: String,
        status: Status,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::StepStarted { .. } => "step_started",
            Self::StepFinished { .. } => "step_finished",
            Self::SessionFinished { .. } => "session_finished",
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::SessionStarted { session_id, .. }
            | Self::StepStarted { session_id, .. }
            | Self::StepFinished { session_id, .. }
            | Self::SessionFinished { session_id, .. } => session_id,
        }
    }
}

#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: WorkflowEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => debug!(event_type, receivers, "Event published"),
            Err(_) => debug!(event_type, "Event published with no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(id: &str) -> WorkflowEvent {
        WorkflowEvent::SessionStarted {
            session_id: id.to_string(),
            workflow_type: WorkflowType::Debate,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(started("s1"));
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(started("s1"));
        bus.publish(WorkflowEvent::SessionFinished {
            session_id: "s1".into(),
            status: Status::Completed,
            error: None,
            timestamp: Utc::now(),
        });
        assert_eq!(rx.recv().await.unwrap().event_type(), "session_started");
        let finished = rx.recv().await.unwrap();
        assert_eq!(finished.event_type(), "session_finished");
        assert_eq!(finished.session_id(), "s1");
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(started("s9")).unwrap();
        assert_eq!(json["event"], "session_started");
        assert_eq!(json["workflow_type"], "debate");
    }
}
