//! Cloneable façade for issuing commands to a room.
//!
//! [`RoomHandle`] hides channel plumbing and offers async helpers for every
//! room command, plus topic subscriptions on the room's event bus.
use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};

use arena_core::{ActorId, CharacterKey, CombatEvent, InputFrame};

use super::errors::{Result, RuntimeError};
use crate::events::{EventBus, RoomEvent, Topic};
use crate::room::{ClientId, RoomSnapshot};
use crate::workers::Command;

/// Client-facing handle to interact with a room
#[derive(Clone)]
pub struct RoomHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RoomHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Adds a member with the default character. Returns its actor.
    pub async fn join(&self, client: ClientId, nickname: impl Into<String>) -> Result<ActorId> {
        let nickname = nickname.into();
        self.request(|reply| Command::Join {
            client,
            nickname,
            reply,
        })
        .await?
    }

    pub async fn leave(&self, client: ClientId) -> Result<()> {
        self.request(|reply| Command::Leave { client, reply })
            .await?
    }

    /// Replaces the client's latest input; applied on the next tick.
    pub async fn submit_input(&self, client: ClientId, input: InputFrame) -> Result<()> {
        self.request(|reply| Command::SubmitInput {
            client,
            input,
            reply,
        })
        .await?
    }

    /// Swaps the member's character. Lobby only; the actor is respawned.
    pub async fn select_character(&self, client: ClientId, key: CharacterKey) -> Result<ActorId> {
        self.request(|reply| Command::SelectCharacter { client, key, reply })
            .await?
    }

    /// Moves the room from lobby to playing. Host only.
    pub async fn request_start(&self, client: ClientId) -> Result<()> {
        self.request(|reply| Command::RequestStart { client, reply })
            .await?
    }

    /// Advances a manually ticked room by `dt_ms`.
    pub async fn step(&self, dt_ms: u64) -> Result<Vec<CombatEvent>> {
        self.request(|reply| Command::Step { dt_ms, reply }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Asks the worker to stop. Pending commands behind this one are dropped.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Combat` - cooldowns, charges, hits, deaths
    /// - `Topic::Snapshot` - one [`RoomSnapshot`] per tick
    /// - `Topic::Membership` - joins, leaves, host and phase changes
    pub fn subscribe(&self, topic: Topic) -> Result<broadcast::Receiver<RoomEvent>> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> Result<HashMap<Topic, broadcast::Receiver<RoomEvent>>> {
        self.event_bus.subscribe_multiple(topics)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
