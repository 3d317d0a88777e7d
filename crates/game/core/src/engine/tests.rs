use std::collections::BTreeMap;

use super::*;
use crate::env::TileGrid;
use crate::skill::try_activate;
use crate::state::CharacterKey;

const TICK: u64 = 16;

struct Sim {
    arena: Arena,
    now: u64,
    events: Vec<CombatEvent>,
}

impl Sim {
    fn open() -> Self {
        Self {
            arena: Arena::open(CombatConfig::new()),
            now: 0,
            events: Vec::new(),
        }
    }

    fn spawn(&mut self, key: CharacterKey, x: f64, y: f64) -> ActorId {
        self.arena
            .spawn(&CharacterKit::builtin(key), Vec2::new(x, y))
            .unwrap()
    }

    fn tick(&mut self, inputs: &BTreeMap<ActorId, InputFrame>) {
        self.now += TICK;
        let events = self.arena.step(Timestamp(self.now), TICK, inputs);
        self.events.extend(events);
    }

    fn run_until(&mut self, until: u64, inputs: &BTreeMap<ActorId, InputFrame>) {
        while self.now + TICK <= until {
            self.tick(inputs);
        }
    }

    fn idle_until(&mut self, until: u64) {
        self.run_until(until, &BTreeMap::new());
    }

    fn activate(&mut self, id: ActorId, slot: SlotId) -> Result<Activation, RejectReason> {
        let mut events = Vec::new();
        let result = self.arena.activate(id, slot, &mut events);
        self.events.extend(events);
        result
    }

    fn hp(&self, id: ActorId) -> f64 {
        self.arena.actor(id).unwrap().hp()
    }

    fn hits_on(&self, target: ActorId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CombatEvent::HitLanded { target: t, .. } if *t == target))
            .count()
    }
}

fn frame(id: ActorId, frame: InputFrame) -> BTreeMap<ActorId, InputFrame> {
    BTreeMap::from([(id, frame)])
}

// ============================================================================
// Membership
// ============================================================================

#[test]
fn spawn_rejects_walls_and_full_arenas() {
    let grid = TileGrid::from_rows(&["#...", "....", "...."], 16.0);
    let mut arena = Arena::new(CombatConfig::new(), grid);
    let kit = CharacterKit::builtin(CharacterKey::Player1);
    assert_eq!(arena.spawn(&kit, Vec2::new(8.0, 8.0)), Err(ArenaError::BlockedSpawn));
    arena.spawn(&kit, Vec2::new(40.0, 24.0)).unwrap();

    let mut open = Arena::open(CombatConfig::new());
    for i in 0..CombatConfig::MAX_ACTORS {
        open.spawn(&kit, Vec2::new(i as f64 * 20.0, 0.0)).unwrap();
    }
    assert_eq!(
        open.spawn(&kit, Vec2::ZERO),
        Err(ArenaError::ArenaFull {
            max: CombatConfig::MAX_ACTORS
        })
    );
}

#[test]
fn despawn_cancels_pending_actions() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player1, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player2, 50.0, 0.0);
    sim.arena.set_pointer(a, Vec2::new(50.0, 0.0));
    sim.activate(a, SlotId::X).unwrap();
    assert!(sim.arena.pending_actions() > 0);

    sim.arena.despawn(a).unwrap();
    assert_eq!(sim.arena.pending_actions(), 0);
    sim.idle_until(500);
    assert_eq!(sim.hp(b), 25.0);
}

// ============================================================================
// Locomotion
// ============================================================================

#[test]
fn movement_follows_intent_at_base_speed() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player1, 0.0, 0.0);
    let inputs = frame(a, InputFrame::idle().moving(Vec2::new(3.0, 0.0)));
    sim.now = 0;
    while sim.now < 1000 {
        sim.now += 20;
        sim.arena.step(Timestamp(sim.now), 20, &inputs);
    }
    let actor = sim.arena.actor(a).unwrap();
    assert!((actor.position.x - 150.0).abs() < 1e-6);
    assert_eq!(actor.facing, Facing::Right);
}

#[test]
fn long_frames_are_clamped() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player1, 0.0, 0.0);
    let inputs = frame(a, InputFrame::idle().moving(Vec2::new(1.0, 0.0)));
    sim.arena.step(Timestamp(500), 500, &inputs);
    let x = sim.arena.actor(a).unwrap().position.x;
    assert!((x - 150.0 * 0.033).abs() < 1e-6);
}

#[test]
fn staggered_actor_does_not_move() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player1, 0.0, 0.0);
    sim.arena
        .actor_mut(a)
        .unwrap()
        .status
        .stagger_for(Timestamp::ZERO, 1000);
    sim.run_until(200, &frame(a, InputFrame::idle().moving(Vec2::new(1.0, 0.0))));
    assert_eq!(sim.arena.actor(a).unwrap().position, Vec2::ZERO);
}

// ============================================================================
// Gate
// ============================================================================

#[test]
fn staggered_and_locked_actors_are_rejected() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player3, 0.0, 0.0);

    sim.arena
        .actor_mut(a)
        .unwrap()
        .status
        .stagger_for(Timestamp::ZERO, 300);
    assert_eq!(sim.activate(a, SlotId::Z), Err(RejectReason::Staggered));

    sim.idle_until(320);
    sim.arena
        .actor_mut(a)
        .unwrap()
        .status
        .lock_for(Timestamp(320), 100);
    assert_eq!(sim.activate(a, SlotId::Z), Err(RejectReason::SkillLocked));

    sim.idle_until(432);
    assert!(sim.activate(a, SlotId::Z).is_ok());
    assert_eq!(sim.activate(a, SlotId::Z), Err(RejectReason::SkillLocked));
}

#[test]
fn cooldown_and_unbound_slots_are_rejected() {
    let mut kit = CharacterKit::builtin(CharacterKey::Player3);
    kit.slots.retain(|b| b.slot() != SlotId::C);
    let mut arena = Arena::open(CombatConfig::new());
    let a = arena.spawn(&kit, Vec2::ZERO).unwrap();
    let mut events = Vec::new();

    assert_eq!(arena.activate(a, SlotId::C, &mut events), Err(RejectReason::UnboundSlot));
    arena.activate(a, SlotId::Z, &mut events).unwrap();
    arena.step(Timestamp(100), 100, &BTreeMap::new());
    assert_eq!(arena.activate(a, SlotId::Z, &mut events), Err(RejectReason::OnCooldown));
    assert_eq!(
        arena.activate(ActorId(99), SlotId::Z, &mut events),
        Err(RejectReason::ActorNotFound)
    );
}

#[test]
fn cooldown_starts_at_the_activation_time() {
    let mut arena = Arena::open(CombatConfig::new());
    let a = arena
        .spawn(&CharacterKit::builtin(CharacterKey::Player3), Vec2::ZERO)
        .unwrap();
    let aim = Vec2::new(100.0, 0.0);
    let mut events = Vec::new();

    try_activate(&mut arena, a, SlotId::Z, Timestamp(5000), &aim, &mut events).unwrap();
    assert_eq!(
        try_activate(&mut arena, a, SlotId::Z, Timestamp(5000), &aim, &mut events),
        Err(RejectReason::SkillLocked)
    );
    assert_eq!(
        try_activate(&mut arena, a, SlotId::Z, Timestamp(5100), &aim, &mut events),
        Err(RejectReason::OnCooldown)
    );
    let cooldowns = &arena.actor(a).unwrap().cooldowns;
    assert_eq!(cooldowns.cooldown_ends_at(SlotId::Z), Some(Timestamp(5400)));
}

#[test]
fn ambush_needs_a_target_in_range() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player1, 0.0, 0.0);
    sim.spawn(CharacterKey::Player2, 200.0, 0.0);
    assert_eq!(sim.activate(a, SlotId::X), Err(RejectReason::NoTargetInRange));
    assert!(sim.arena.actor(a).unwrap().cooldowns.is_off_cooldown(SlotId::X, Timestamp::ZERO));
}

#[test]
fn activation_snaps_facing_to_the_aim() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player3, 0.0, 0.0);
    sim.arena.set_pointer(a, Vec2::new(0.0, -50.0));
    let activation = sim.activate(a, SlotId::Z).unwrap();
    assert_eq!(activation.facing, Facing::Up);
    assert_eq!(sim.arena.actor(a).unwrap().facing, Facing::Up);
    assert!(sim.events.iter().any(|e| matches!(e, CombatEvent::SkillActivated { .. })));
}

// ============================================================================
// Skills
// ============================================================================

#[test]
fn sweep_hits_each_target_once() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player3, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player2, 30.0, 0.0);
    sim.arena.set_pointer(a, Vec2::new(100.0, 0.0));
    let activation = sim.activate(a, SlotId::Z).unwrap();

    sim.idle_until(200);
    assert_eq!(sim.hp(b), 22.0);
    assert_eq!(sim.hits_on(b), 1);
    assert!(
        sim.events
            .contains(&CombatEvent::SessionEnded { session: activation.session })
    );
}

#[test]
fn charges_deplete_then_recharge_one_at_a_time() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player2, 0.0, 0.0);
    sim.run_until(1400, &frame(a, InputFrame::idle().holding(SlotId::X)));

    let charges = |sim: &Sim| {
        sim.arena
            .actor(a)
            .unwrap()
            .cooldowns
            .charges(SlotId::X)
            .unwrap()
            .charges
    };
    assert_eq!(charges(&sim), 0);
    assert_eq!(sim.activate(a, SlotId::X), Err(RejectReason::NoCharges));

    sim.idle_until(3100);
    assert_eq!(charges(&sim), 1);
}

#[test]
fn invincible_dash_takes_no_hit_and_leaves_no_mark() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player3, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player2, 30.0, 0.0);
    let inputs = BTreeMap::from([
        (a, InputFrame::idle().aiming(Vec2::new(100.0, 0.0)).holding(SlotId::Z)),
        (b, InputFrame::idle().aiming(Vec2::new(200.0, 0.0)).holding(SlotId::X)),
    ]);
    sim.tick(&inputs);
    sim.idle_until(300);

    assert_eq!(sim.hp(b), 25.0);
    assert_eq!(sim.hits_on(b), 0);
    assert_eq!(sim.arena.actor(a).unwrap().sessions.processed_hits(), 0);
    assert!(!sim.arena.actor(b).unwrap().status.is_invincible(Timestamp(300)));
}

#[test]
fn ambush_reappears_behind_the_target() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player1, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player2, 50.0, 0.0);
    sim.arena.set_pointer(a, Vec2::new(50.0, 0.0));
    sim.activate(a, SlotId::X).unwrap();
    assert!(sim.arena.actor(a).unwrap().status.is_stealthed(Timestamp::ZERO));

    sim.idle_until(400);
    let actor = sim.arena.actor(a).unwrap();
    assert_eq!(actor.position, Vec2::new(64.0, 0.0));
    assert_eq!(actor.facing, Facing::Left);
    assert!((sim.hp(b) - 21.4).abs() < 1e-9);
    assert!(sim.arena.actor(b).unwrap().status.is_staggered(Timestamp(400)));
}

#[test]
fn beam_recoils_then_fires() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player2, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player1, 100.0, 0.0);
    sim.arena.set_pointer(a, Vec2::new(100.0, 0.0));
    sim.activate(a, SlotId::C).unwrap();

    sim.idle_until(112);
    assert_eq!(sim.hp(b), 30.0);

    sim.idle_until(200);
    assert!((sim.arena.actor(a).unwrap().position.x + 20.0).abs() < 1e-9);
    assert_eq!(sim.hp(b), 1.0);
    assert_eq!(sim.hits_on(b), 1);
}

#[test]
fn arc_burst_explodes_after_travel() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player2, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player1, 60.0, 10.0);
    sim.arena.set_pointer(a, Vec2::new(60.0, 0.0));
    sim.activate(a, SlotId::Z).unwrap();

    sim.idle_until(336);
    assert_eq!(sim.hp(b), 30.0);
    sim.idle_until(480);
    assert_eq!(sim.hp(b), 22.0);
    assert!(sim.arena.actor(b).unwrap().position.y > 10.0);
}

#[test]
fn arc_burst_session_outlives_its_last_explosion() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player2, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player1, 60.0, 0.0);
    sim.arena.set_pointer(a, Vec2::new(60.0, 0.0));
    let activation = sim.activate(a, SlotId::Z).unwrap();

    sim.idle_until(2000);
    let last_hit = sim
        .events
        .iter()
        .rposition(|e| matches!(e, CombatEvent::HitLanded { attacker, .. } if *attacker == a))
        .unwrap();
    let ended = sim
        .events
        .iter()
        .position(|e| *e == CombatEvent::SessionEnded { session: activation.session })
        .unwrap();
    assert_eq!(sim.hits_on(b), 4);
    assert!(ended > last_hit);
    assert_eq!(sim.arena.actor(a).unwrap().sessions.tracked_sessions(), 0);
}

#[test]
fn vortex_opens_a_pulling_field() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player1, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player3, 180.0, 0.0);
    sim.arena.set_pointer(a, Vec2::new(180.0, 0.0));
    let activation = sim.activate(a, SlotId::C).unwrap();

    sim.idle_until(400);
    assert_eq!(sim.arena.fields().len(), 1);

    sim.idle_until(1200);
    assert!(sim.hp(b) < 30.0);
    assert!(sim.arena.actor(b).unwrap().position.x < 180.0);

    sim.idle_until(3600);
    assert!(sim.arena.fields().is_empty());
    assert!(
        sim.events
            .contains(&CombatEvent::SessionEnded { session: activation.session })
    );
}

#[test]
fn held_lunge_latches_and_ticks() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player4, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player2, 60.0, 0.0);
    let aim = Vec2::new(60.0, 0.0);

    sim.run_until(1000, &frame(a, InputFrame::idle().aiming(aim).holding(SlotId::X)));
    assert!(sim.arena.in_motion(a));
    assert_eq!(sim.arena.actor(a).unwrap().position, Vec2::ZERO);

    sim.run_until(2000, &frame(a, InputFrame::idle().aiming(aim)));
    assert!(!sim.arena.in_motion(a));
    assert_eq!(sim.hp(b), 13.0);
    assert_eq!(sim.hits_on(b), 4);
    let cooldowns = &sim.arena.actor(a).unwrap().cooldowns;
    assert!(!cooldowns.is_off_cooldown(SlotId::X, Timestamp(2000)));
}

#[test]
fn surge_rams_the_first_target() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player4, 0.0, 0.0);
    let b = sim.spawn(CharacterKey::Player2, 100.0, 0.0);
    let aim = Vec2::new(100.0, 0.0);

    sim.tick(&frame(a, InputFrame::idle().aiming(aim).holding(SlotId::Z)));
    assert!(sim.arena.in_motion(a));
    sim.run_until(2000, &frame(a, InputFrame::idle().aiming(aim)));

    assert!(!sim.arena.in_motion(a));
    assert!(sim.hp(b) < 25.0);
    assert!(sim.arena.actor(b).unwrap().position.x > 100.0);
    assert!(
        !sim.arena
            .actor(a)
            .unwrap()
            .cooldowns
            .is_off_cooldown(SlotId::Z, Timestamp(2000))
    );
}

#[test]
fn snapshot_reports_actors_and_slots() {
    let mut sim = Sim::open();
    let a = sim.spawn(CharacterKey::Player2, 0.0, 0.0);
    sim.activate(a, SlotId::X).unwrap();
    let snapshot = sim.arena.snapshot();
    let view = snapshot.actor(a).unwrap();
    assert_eq!(view.hp, 25.0);
    let dash = view.slots.iter().find(|s| s.slot == SlotId::X).unwrap();
    assert_eq!(dash.charges, Some((2, 3)));
}
