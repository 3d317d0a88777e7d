//! Room worker that owns the authoritative [`Arena`].
//!
//! Receives commands from [`crate::RoomHandle`], buffers each client's latest
//! input, advances the arena on every tick and publishes the outcome to the
//! event bus.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use arena_core::{ActorId, Arena, CharacterKey, CombatEvent, InputFrame, Timestamp};

use crate::api::{Result, RuntimeError};
use crate::events::{EventBus, MembershipEvent, RoomEvent};
use crate::room::{ClientId, MemberView, RoomConfig, RoomPhase, RoomSnapshot};

/// Commands that can be sent to the room worker
pub enum Command {
    Join {
        client: ClientId,
        nickname: String,
        reply: oneshot::Sender<Result<ActorId>>,
    },
    Leave {
        client: ClientId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Overwrites the client's latest-input cell.
    SubmitInput {
        client: ClientId,
        input: InputFrame,
        reply: oneshot::Sender<Result<()>>,
    },
    SelectCharacter {
        client: ClientId,
        key: CharacterKey,
        reply: oneshot::Sender<Result<ActorId>>,
    },
    RequestStart {
        client: ClientId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Advance the simulation by `dt_ms` outside the tick interval.
    Step {
        dt_ms: u64,
        reply: oneshot::Sender<Vec<CombatEvent>>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct Member {
    nickname: String,
    character: CharacterKey,
    actor: ActorId,
    /// Join order; the earliest remaining member inherits the host role.
    seq: u64,
}

/// Background task that owns one room.
pub struct RoomWorker {
    config: RoomConfig,
    arena: Arena,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    phase: RoomPhase,
    host: Option<ClientId>,
    members: BTreeMap<ClientId, Member>,
    inputs: BTreeMap<ClientId, InputFrame>,
    clock: Timestamp,
    next_seq: u64,
}

impl RoomWorker {
    pub fn new(
        config: RoomConfig,
        arena: Arena,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        let clock = arena.now();
        Self {
            config,
            arena,
            command_rx,
            event_bus,
            phase: RoomPhase::Lobby,
            host: None,
            members: BTreeMap::new(),
            inputs: BTreeMap::new(),
            clock,
            next_seq: 0,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        let tick_ms = self.arena.config().tick_ms().max(1);
        let mut ticker = tokio::time::interval(Duration::from_millis(tick_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        info!(tick_ms, "room worker started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown { reply }) => {
                        if reply.send(()).is_err() {
                            debug!("Shutdown reply channel closed (caller dropped)");
                        }
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                now = ticker.tick(), if self.config.auto_tick => {
                    let dt_ms = now.duration_since(last_tick).as_millis() as u64;
                    last_tick = now;
                    self.tick(dt_ms);
                }
            }
        }

        info!(members = self.members.len(), "room worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Join {
                client,
                nickname,
                reply,
            } => {
                let result = self.join(client, &nickname);
                if reply.send(result).is_err() {
                    debug!("Join reply channel closed (caller dropped)");
                }
            }
            Command::Leave { client, reply } => {
                let result = self.leave(client);
                if reply.send(result).is_err() {
                    debug!("Leave reply channel closed (caller dropped)");
                }
            }
            Command::SubmitInput {
                client,
                input,
                reply,
            } => {
                let result = self.submit_input(client, input);
                if reply.send(result).is_err() {
                    debug!("SubmitInput reply channel closed (caller dropped)");
                }
            }
            Command::SelectCharacter { client, key, reply } => {
                let result = self.select_character(client, key);
                if reply.send(result).is_err() {
                    debug!("SelectCharacter reply channel closed (caller dropped)");
                }
            }
            Command::RequestStart { client, reply } => {
                let result = self.request_start(client);
                if reply.send(result).is_err() {
                    debug!("RequestStart reply channel closed (caller dropped)");
                }
            }
            Command::Step { dt_ms, reply } => {
                let events = self.tick(dt_ms);
                if reply.send(events).is_err() {
                    debug!("Step reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                if reply.send(self.snapshot()).is_err() {
                    debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown { reply } => {
                // Normally intercepted by `run`.
                if reply.send(()).is_err() {
                    debug!("Shutdown reply channel closed (caller dropped)");
                }
            }
        }
    }

    // ========================================================================
    // Membership
    // ========================================================================

    fn join(&mut self, client: ClientId, nickname: &str) -> Result<ActorId> {
        if self.members.contains_key(&client) {
            return Err(self.reject(RuntimeError::AlreadyJoined(client)));
        }
        if self.members.len() >= self.config.max_players {
            return Err(self.reject(RuntimeError::RoomFull {
                max: self.config.max_players,
            }));
        }

        let character = CharacterKey::default();
        let kit = self
            .config
            .kits
            .get(&character)
            .ok_or(RuntimeError::UnknownCharacter(character))?;
        let position = self.config.spawn_point(self.next_seq);
        let actor = self.arena.spawn(kit, position)?;

        let nickname = self.config.sanitize_nickname(nickname);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.members.insert(
            client,
            Member {
                nickname: nickname.clone(),
                character,
                actor,
                seq,
            },
        );
        info!(%client, %actor, nickname = %nickname, "client joined");
        self.publish_membership(MembershipEvent::Joined {
            client,
            nickname,
            actor,
        });

        if self.host.is_none() {
            self.set_host(Some(client));
        }
        Ok(actor)
    }

    fn leave(&mut self, client: ClientId) -> Result<()> {
        let member = self
            .members
            .remove(&client)
            .ok_or_else(|| self.reject(RuntimeError::UnknownClient(client)))?;
        self.arena.despawn(member.actor);
        self.inputs.remove(&client);
        info!(%client, actor = %member.actor, "client left");
        self.publish_membership(MembershipEvent::Left { client });

        if self.host == Some(client) {
            let next = self
                .members
                .iter()
                .min_by_key(|(_, member)| member.seq)
                .map(|(id, _)| *id);
            self.set_host(next);
        }
        if self.members.is_empty() && self.phase != RoomPhase::Lobby {
            self.set_phase(RoomPhase::Lobby);
        }
        Ok(())
    }

    fn submit_input(&mut self, client: ClientId, input: InputFrame) -> Result<()> {
        if !self.members.contains_key(&client) {
            return Err(self.reject(RuntimeError::UnknownClient(client)));
        }
        self.inputs.insert(client, input);
        Ok(())
    }

    fn select_character(&mut self, client: ClientId, key: CharacterKey) -> Result<ActorId> {
        self.expect_phase(RoomPhase::Lobby)?;
        let member = self
            .members
            .get(&client)
            .ok_or_else(|| self.reject(RuntimeError::UnknownClient(client)))?;
        let kit = self
            .config
            .kits
            .get(&key)
            .ok_or_else(|| self.reject(RuntimeError::UnknownCharacter(key)))?;

        let old_actor = member.actor;
        let position = self
            .arena
            .actor(old_actor)
            .map(|actor| actor.position)
            .unwrap_or_else(|| self.config.spawn_point(member.seq));

        // Spawn first so a failure leaves the member on their old actor.
        let actor = self.arena.spawn(kit, position)?;
        self.arena.despawn(old_actor);

        if let Some(member) = self.members.get_mut(&client) {
            member.character = key;
            member.actor = actor;
        }
        info!(%client, character = %key, %actor, "character selected");
        self.publish_membership(MembershipEvent::CharacterSelected {
            client,
            character: key,
            actor,
        });
        Ok(actor)
    }

    fn request_start(&mut self, client: ClientId) -> Result<()> {
        if !self.members.contains_key(&client) {
            return Err(self.reject(RuntimeError::UnknownClient(client)));
        }
        if self.host != Some(client) {
            return Err(self.reject(RuntimeError::NotHost { client }));
        }
        self.expect_phase(RoomPhase::Lobby)?;
        self.set_phase(RoomPhase::Playing);
        Ok(())
    }

    fn expect_phase(&self, expected: RoomPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(self.reject(RuntimeError::WrongPhase {
                expected,
                actual: self.phase,
            }))
        }
    }

    fn set_host(&mut self, host: Option<ClientId>) {
        self.host = host;
        info!(?host, "host changed");
        self.publish_membership(MembershipEvent::HostChanged { host });
    }

    fn set_phase(&mut self, phase: RoomPhase) {
        info!(from = %self.phase, to = %phase, "room phase changed");
        self.phase = phase;
        self.publish_membership(MembershipEvent::PhaseChanged { phase });
    }

    fn reject(&self, err: RuntimeError) -> RuntimeError {
        warn!("room command rejected: {}", err);
        err
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Applies every member's latest input and advances the arena.
    fn tick(&mut self, dt_ms: u64) -> Vec<CombatEvent> {
        self.clock += dt_ms;

        let inputs: BTreeMap<ActorId, InputFrame> = self
            .members
            .iter()
            .map(|(client, member)| {
                let frame = self.inputs.get(client).cloned().unwrap_or_default();
                let frame = match self.phase {
                    RoomPhase::Playing => frame,
                    RoomPhase::Lobby => frame.without_skills(),
                };
                (member.actor, frame)
            })
            .collect();

        let events = self.arena.step(self.clock, dt_ms, &inputs);
        for event in &events {
            self.event_bus.publish(RoomEvent::Combat(event.clone()));
        }
        self.event_bus
            .publish(RoomEvent::Snapshot(Box::new(self.snapshot())));
        events
    }

    fn snapshot(&self) -> RoomSnapshot {
        let mut members: Vec<_> = self.members.iter().collect();
        members.sort_by_key(|(_, member)| member.seq);
        RoomSnapshot {
            phase: self.phase,
            host: self.host,
            clock: self.clock,
            members: members
                .into_iter()
                .map(|(client, member)| MemberView {
                    client: *client,
                    nickname: member.nickname.clone(),
                    character: member.character,
                    actor: member.actor,
                })
                .collect(),
            arena: self.arena.snapshot(),
        }
    }

    fn publish_membership(&self, event: MembershipEvent) {
        self.event_bus.publish(RoomEvent::Membership(event));
    }
}
