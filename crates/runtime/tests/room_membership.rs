use arena_core::{CharacterKey, Vec2};
use arena_runtime::{
    ClientId, MembershipEvent, Room, RoomConfig, RoomEvent, RoomPhase, RuntimeError, Topic,
};

const A: ClientId = ClientId(1);
const B: ClientId = ClientId(2);
const C: ClientId = ClientId(3);

fn manual_room() -> Room {
    Room::open(RoomConfig::manual().with_spawn_points(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(40.0, 0.0),
    ]))
}

#[tokio::test]
async fn first_member_hosts_with_default_character() {
    let room = manual_room();
    let handle = room.handle();

    let actor = handle.join(A, "  alice  ").await.unwrap();
    handle.join(B, "bob").await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.host, Some(A));
    assert_eq!(snapshot.phase, RoomPhase::Lobby);
    let alice = snapshot.member(A).unwrap();
    assert_eq!(alice.nickname, "alice");
    assert_eq!(alice.character, CharacterKey::Player1);
    assert_eq!(alice.actor, actor);
    assert_eq!(
        snapshot.arena.actor(snapshot.member(B).unwrap().actor).unwrap().position,
        Vec2::new(40.0, 0.0)
    );

    room.shutdown().await.unwrap();
}

#[tokio::test]
async fn room_rejects_fifth_player_and_duplicates() {
    let room = manual_room();
    let handle = room.handle();

    for id in 1..=4 {
        handle.join(ClientId(id), "p").await.unwrap();
    }
    assert!(matches!(
        handle.join(ClientId(5), "late").await,
        Err(RuntimeError::RoomFull { max: 4 })
    ));

    handle.leave(ClientId(4)).await.unwrap();
    assert!(matches!(
        handle.join(A, "again").await,
        Err(RuntimeError::AlreadyJoined(ClientId(1)))
    ));

    room.shutdown().await.unwrap();
}

#[tokio::test]
async fn leaving_host_hands_over_to_earliest_member() {
    let room = manual_room();
    let handle = room.handle();
    let mut membership = handle.subscribe(Topic::Membership).unwrap();

    handle.join(C, "carol").await.unwrap();
    handle.join(A, "alice").await.unwrap();
    handle.join(B, "bob").await.unwrap();
    handle.leave(C).await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.host, Some(A));
    assert_eq!(snapshot.members.len(), 2);
    assert_eq!(snapshot.arena.actors.len(), 2);

    let mut host_changes = Vec::new();
    while let Ok(event) = membership.try_recv() {
        if let RoomEvent::Membership(MembershipEvent::HostChanged { host }) = event {
            host_changes.push(host);
        }
    }
    assert_eq!(host_changes, vec![Some(C), Some(A)]);

    assert!(matches!(
        handle.leave(C).await,
        Err(RuntimeError::UnknownClient(ClientId(3)))
    ));
    room.shutdown().await.unwrap();
}

#[tokio::test]
async fn only_host_starts_and_only_in_lobby() {
    let room = manual_room();
    let handle = room.handle();
    handle.join(A, "alice").await.unwrap();
    handle.join(B, "bob").await.unwrap();

    assert!(matches!(
        handle.request_start(B).await,
        Err(RuntimeError::NotHost { client: ClientId(2) })
    ));
    handle.request_start(A).await.unwrap();
    assert_eq!(handle.snapshot().await.unwrap().phase, RoomPhase::Playing);

    assert!(matches!(
        handle.request_start(A).await,
        Err(RuntimeError::WrongPhase {
            expected: RoomPhase::Lobby,
            actual: RoomPhase::Playing,
        })
    ));
    assert!(matches!(
        handle.select_character(B, CharacterKey::Player4).await,
        Err(RuntimeError::WrongPhase { .. })
    ));

    room.shutdown().await.unwrap();
}

#[tokio::test]
async fn selecting_a_character_respawns_in_place() {
    let room = manual_room();
    let handle = room.handle();
    let old = handle.join(A, "alice").await.unwrap();

    let new = handle
        .select_character(A, CharacterKey::Player2)
        .await
        .unwrap();
    assert_ne!(old, new);

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.arena.actors.len(), 1);
    let view = snapshot.arena.actor(new).unwrap();
    assert_eq!(view.character, CharacterKey::Player2);
    assert_eq!(view.max_hp, 25.0);
    assert_eq!(view.position, Vec2::new(0.0, 0.0));
    assert_eq!(snapshot.member(A).unwrap().character, CharacterKey::Player2);

    room.shutdown().await.unwrap();
}

#[tokio::test]
async fn empty_room_returns_to_lobby() {
    let room = manual_room();
    let handle = room.handle();
    handle.join(A, "alice").await.unwrap();
    handle.request_start(A).await.unwrap();
    handle.leave(A).await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, RoomPhase::Lobby);
    assert_eq!(snapshot.host, None);

    room.shutdown().await.unwrap();
}

#[tokio::test]
async fn handle_fails_cleanly_after_shutdown() {
    let room = manual_room();
    let handle = room.handle();
    room.shutdown().await.unwrap();

    assert!(matches!(
        handle.snapshot().await,
        Err(RuntimeError::CommandChannelClosed)
    ));
}

#[tokio::test]
async fn handle_shutdown_stops_the_worker_once() {
    let room = manual_room();
    let handle = room.handle();
    let other = handle.clone();

    handle.shutdown().await.unwrap();
    // The worker may still be unwinding when the second request lands.
    assert!(matches!(
        other.shutdown().await,
        Err(RuntimeError::CommandChannelClosed | RuntimeError::ReplyChannelClosed(_))
    ));
    room.shutdown().await.unwrap();
}
