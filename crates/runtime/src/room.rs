//! Room orchestrator.
//!
//! A room owns one [`Arena`] inside a dedicated worker task. Everything that
//! touches the arena happens on that task; clients talk to it through a
//! cloneable [`RoomHandle`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use arena_core::{
    ActorId, Arena, ArenaSnapshot, CharacterKey, CharacterKit, CombatConfig, Timestamp, Vec2,
};

use crate::api::{Result, RoomHandle, RuntimeError};
use crate::events::EventBus;
use crate::workers::RoomWorker;

/// Transport-assigned identity of a connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Lifecycle phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoomPhase {
    /// Players walk around and pick characters; skills are ignored.
    #[default]
    Lobby,
    Playing,
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RoomPhase::Lobby => "lobby",
            RoomPhase::Playing => "playing",
        };
        write!(f, "{}", label)
    }
}

/// Room configuration shared by the orchestrator and its worker.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Used by [`Room::open`]; [`Room::spawn`] takes the arena's own config.
    pub combat: CombatConfig,
    pub max_players: usize,
    pub nickname_limit: usize,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Tick on a wall-clock interval. When false the room only advances on
    /// [`RoomHandle::step`].
    pub auto_tick: bool,
    pub kits: BTreeMap<CharacterKey, CharacterKit>,
    /// Join positions, handed out round-robin.
    pub spawn_points: Vec<Vec2>,
}

impl RoomConfig {
    pub const DEFAULT_MAX_PLAYERS: usize = 4;
    pub const DEFAULT_NICKNAME_LIMIT: usize = 16;
    pub const DEFAULT_NICKNAME: &'static str = "guest";

    /// Manually stepped room, as used by tests and replays.
    pub fn manual() -> Self {
        Self {
            auto_tick: false,
            ..Self::default()
        }
    }

    pub fn with_kits(mut self, kits: BTreeMap<CharacterKey, CharacterKit>) -> Self {
        self.kits = kits;
        self
    }

    pub fn with_spawn_points(mut self, spawn_points: Vec<Vec2>) -> Self {
        self.spawn_points = spawn_points;
        self
    }

    /// Trimmed and truncated nickname, or the default one when blank.
    pub fn sanitize_nickname(&self, raw: &str) -> String {
        let name: String = raw.trim().chars().take(self.nickname_limit).collect();
        if name.is_empty() {
            Self::DEFAULT_NICKNAME.to_string()
        } else {
            name
        }
    }

    pub(crate) fn spawn_point(&self, seq: u64) -> Vec2 {
        if self.spawn_points.is_empty() {
            return Vec2::ZERO;
        }
        self.spawn_points[(seq % self.spawn_points.len() as u64) as usize]
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        let kits = CharacterKey::ALL
            .into_iter()
            .map(|key| (key, CharacterKit::builtin(key)))
            .collect();
        Self {
            combat: CombatConfig::default(),
            max_players: Self::DEFAULT_MAX_PLAYERS,
            nickname_limit: Self::DEFAULT_NICKNAME_LIMIT,
            event_buffer_size: 100,
            command_buffer_size: 32,
            auto_tick: true,
            kits,
            spawn_points: vec![Vec2::ZERO],
        }
    }
}

/// One member as seen from outside the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberView {
    pub client: ClientId,
    pub nickname: String,
    pub character: CharacterKey,
    pub actor: ActorId,
}

/// Room state published once per tick and returned by [`RoomHandle::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub phase: RoomPhase,
    pub host: Option<ClientId>,
    pub clock: Timestamp,
    /// Ordered by join time.
    pub members: Vec<MemberView>,
    pub arena: ArenaSnapshot,
}

impl RoomSnapshot {
    pub fn member(&self, client: ClientId) -> Option<&MemberView> {
        self.members.iter().find(|member| member.client == client)
    }
}

/// A running room: the worker task plus a handle to it.
pub struct Room {
    handle: RoomHandle,
    worker: JoinHandle<()>,
}

impl Room {
    /// Starts a worker that owns `arena`.
    pub fn spawn(config: RoomConfig, arena: Arena) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size);
        let event_bus = EventBus::with_capacity(config.event_buffer_size);

        info!(
            max_players = config.max_players,
            auto_tick = config.auto_tick,
            tick_ms = arena.config().tick_ms(),
            "spawning room"
        );

        let worker = RoomWorker::new(config, arena, command_rx, event_bus.clone());
        let worker = tokio::spawn(worker.run());

        Self {
            handle: RoomHandle::new(command_tx, event_bus),
            worker,
        }
    }

    /// Starts a room on an unbounded open field.
    pub fn open(config: RoomConfig) -> Self {
        let arena = Arena::open(config.combat.clone());
        Self::spawn(config, arena)
    }

    /// Get a cloneable handle to this room
    pub fn handle(&self) -> RoomHandle {
        self.handle.clone()
    }

    /// Stops the worker and waits for it to finish.
    pub async fn shutdown(self) -> Result<()> {
        if let Err(err) = self.handle.shutdown().await {
            debug!("room worker already gone: {}", err);
        }
        drop(self.handle);

        self.worker.await.map_err(RuntimeError::WorkerJoin)
    }
}
