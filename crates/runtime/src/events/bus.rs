//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use arena_core::CombatEvent;

use super::types::MembershipEvent;
use crate::api::{Result, RuntimeError};
use crate::room::RoomSnapshot;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Per-actor combat outcomes (cooldowns, hits, deaths)
    Combat,
    /// One full room snapshot per tick
    Snapshot,
    /// Joins, leaves, host and phase changes
    Membership,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Combat, Topic::Snapshot, Topic::Membership];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoomEvent {
    Combat(CombatEvent),
    Snapshot(Box<RoomSnapshot>),
    Membership(MembershipEvent),
}

impl RoomEvent {
    pub fn topic(&self) -> Topic {
        match self {
            RoomEvent::Combat(_) => Topic::Combat,
            RoomEvent::Snapshot(_) => Topic::Snapshot,
            RoomEvent::Membership(_) => Topic::Membership,
        }
    }

    /// JSON encoding for transports and logs.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Topic-based event bus
///
/// Publishing is best-effort and never waits: a room worker must not stall
/// because a consumer is slow. Lagging receivers see
/// `broadcast::error::RecvError::Lagged` and skip ahead.
pub struct EventBus {
    channels: Arc<RwLock<HashMap<Topic, broadcast::Sender<RoomEvent>>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();

        Self {
            channels: Arc::new(RwLock::new(channels)),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: RoomEvent) {
        let topic = event.topic();

        match self.channels.try_read() {
            Ok(channels) => {
                if let Some(tx) = channels.get(&topic)
                    && tx.send(event).is_err()
                {
                    tracing::trace!("No subscribers for topic {:?}", topic);
                }
            }
            Err(_) => {
                tracing::debug!("Failed to acquire event bus lock for topic {:?}", topic);
            }
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> Result<broadcast::Receiver<RoomEvent>> {
        let channels = self
            .channels
            .try_read()
            .map_err(|_| RuntimeError::EventBusBusy)?;
        channels
            .get(&topic)
            .map(broadcast::Sender::subscribe)
            .ok_or(RuntimeError::UnknownTopic(topic))
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> Result<HashMap<Topic, broadcast::Receiver<RoomEvent>>> {
        let channels = self
            .channels
            .try_read()
            .map_err(|_| RuntimeError::EventBusBusy)?;
        topics
            .iter()
            .map(|&topic| {
                channels
                    .get(&topic)
                    .map(|tx| (topic, tx.subscribe()))
                    .ok_or(RuntimeError::UnknownTopic(topic))
            })
            .collect()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use arena_core::{ActorId, Timestamp};

    use super::*;

    #[tokio::test]
    async fn events_reach_only_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut combat = bus.subscribe(Topic::Combat).unwrap();
        let mut membership = bus.subscribe(Topic::Membership).unwrap();

        bus.publish(RoomEvent::Combat(CombatEvent::Died { actor: ActorId(1) }));

        assert!(matches!(
            combat.recv().await.unwrap(),
            RoomEvent::Combat(CombatEvent::Died { .. })
        ));
        assert!(membership.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(RoomEvent::Combat(CombatEvent::Staggered {
            actor: ActorId(2),
            until: Timestamp(300),
        }));
        assert_eq!(bus.subscribe_multiple(&Topic::ALL).unwrap().len(), 3);
    }
}
