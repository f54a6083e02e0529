//! Integration tests for the room directory: membership moves, eager room
//! cleanup, and item routing.

use multiworld_protocol::{Action, ClientId, ItemRoute, Outbound, PlayerId, RoomId};
use multiworld_room::{RoomConfig, RoomDirectory, RoomError};
use multiworld_session::{Client, ConnectionHandle};
use multiworld_transport::ConnectionId;
use tokio::sync::mpsc::UnboundedReceiver;

// =========================================================================
// Helpers
// =========================================================================

/// Builds a client with its own connection and returns the receiver that
/// sees everything pushed to it.
fn client(id: &str, player: i64) -> (Client, UnboundedReceiver<Outbound>) {
    let (connection, rx) = ConnectionHandle::channel(ConnectionId::new(player as u64 + 100));
    let client = Client {
        identity: ClientId::new(id),
        player_id: PlayerId(player),
        connection,
        room_id: None,
    };
    (client, rx)
}

fn fire_map() -> Vec<ItemRoute> {
    vec![
        ItemRoute {
            name: "fire".into(),
            location: "a".into(),
            from: PlayerId(0),
            to: PlayerId(1),
        },
        ItemRoute {
            name: "blizzard".into(),
            location: "b".into(),
            from: PlayerId(1),
            to: PlayerId(0),
        },
    ]
}

// =========================================================================
// create_room()
// =========================================================================

#[test]
fn test_create_room_sets_client_room_and_registers_room() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _rx) = client("aaaaaa", 0);

    let room_id = dir.create_room(&mut alice);

    assert!(!room_id.is_empty());
    assert_eq!(alice.room_id, Some(room_id.clone()));
    assert!(dir.contains(&room_id));
    let room = dir.get(&room_id).unwrap();
    assert_eq!(room.id(), &room_id);
    assert_eq!(room.len(), 1);
}

#[test]
fn test_create_room_while_in_room_leaves_old_room() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _rx) = client("aaaaaa", 0);
    let first = dir.create_room(&mut alice);

    let second = dir.create_room(&mut alice);

    assert_ne!(first, second);
    assert!(!dir.contains(&first), "old room should be garbage collected");
    assert_eq!(alice.room_id, Some(second));
    assert_eq!(dir.len(), 1);
}

// =========================================================================
// join_room()
// =========================================================================

#[test]
fn test_join_room_appends_member() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let (mut bob, _b) = client("bbbbbb", 1);
    let room_id = dir.create_room(&mut alice);

    dir.join_room(&room_id, &mut bob).expect("should join");

    assert_eq!(bob.room_id, Some(room_id.clone()));
    assert_eq!(
        dir.get(&room_id).unwrap().player_ids(),
        vec![PlayerId(0), PlayerId(1)]
    );
}

#[test]
fn test_join_room_empty_id_returns_no_room_id() {
    let mut dir = RoomDirectory::default();
    let (mut bob, _b) = client("bbbbbb", 1);

    let result = dir.join_room(&RoomId::new(""), &mut bob);

    assert!(matches!(result, Err(RoomError::NoRoomId)));
    assert_eq!(bob.room_id, None);
}

#[test]
fn test_join_room_unknown_room_leaves_client_where_it_was() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let home = dir.create_room(&mut alice);

    let result = dir.join_room(&RoomId::new("asdf"), &mut alice);

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Room 'asdf' does not exist.");
    assert_eq!(alice.room_id, Some(home.clone()));
    assert!(dir.get(&home).unwrap().contains(&alice.identity));
}

#[test]
fn test_join_room_duplicate_player_is_rejected() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let (mut impostor, _i) = client("iiiiii", 0);
    let room_id = dir.create_room(&mut alice);

    let result = dir.join_room(&room_id, &mut impostor);

    assert!(matches!(result, Err(RoomError::DuplicatePlayer(PlayerId(0)))));
    assert_eq!(dir.get(&room_id).unwrap().len(), 1);
    assert_eq!(impostor.room_id, None);
}

#[test]
fn test_join_room_duplicate_after_switch_clears_room_pointer() {
    // The old room is left before the duplicate check runs.
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let (mut other, _o) = client("oooooo", 0);
    let target = dir.create_room(&mut alice);
    let previous = dir.create_room(&mut other);

    let result = dir.join_room(&target, &mut other);

    assert!(matches!(result, Err(RoomError::DuplicatePlayer(_))));
    assert_eq!(other.room_id, None);
    assert!(!dir.contains(&previous));
    assert_eq!(dir.get(&target).unwrap().len(), 1);
}

#[test]
fn test_join_room_own_room_is_rejected_without_side_effects() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let room_id = dir.create_room(&mut alice);

    let result = dir.join_room(&room_id, &mut alice);

    assert!(matches!(result, Err(RoomError::DuplicatePlayer(_))));
    assert_eq!(alice.room_id, Some(room_id.clone()));
    assert_eq!(dir.get(&room_id).unwrap().len(), 1);
}

#[test]
fn test_join_room_moves_client_between_rooms() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let (mut bob, _b) = client("bbbbbb", 1);
    let (mut carol, _c) = client("cccccc", 2);
    let origin = dir.create_room(&mut alice);
    dir.join_room(&origin, &mut bob).unwrap();
    let target = dir.create_room(&mut carol);

    dir.join_room(&target, &mut bob).expect("should move");

    assert_eq!(bob.room_id, Some(target.clone()));
    assert!(!dir.get(&origin).unwrap().contains(&bob.identity));
    assert_eq!(dir.get(&origin).unwrap().len(), 1);
    assert!(dir.get(&target).unwrap().contains(&bob.identity));
}

#[test]
fn test_join_room_full_room_is_rejected() {
    let mut dir = RoomDirectory::new(RoomConfig {
        max_members: Some(1),
    });
    let (mut alice, _a) = client("aaaaaa", 0);
    let (mut bob, _b) = client("bbbbbb", 1);
    let room_id = dir.create_room(&mut alice);

    let result = dir.join_room(&room_id, &mut bob);

    assert!(matches!(result, Err(RoomError::RoomFull(_))));
    assert_eq!(bob.room_id, None);
}

// =========================================================================
// leave_room()
// =========================================================================

#[test]
fn test_leave_room_last_member_destroys_room() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let room_id = dir.create_room(&mut alice);

    dir.leave_room(&room_id, &mut alice).expect("should leave");

    assert_eq!(alice.room_id, None);
    assert!(!dir.contains(&room_id));
    assert!(dir.is_empty());
}

#[test]
fn test_leave_room_keeps_room_with_remaining_members() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let (mut bob, _b) = client("bbbbbb", 1);
    let room_id = dir.create_room(&mut alice);
    dir.join_room(&room_id, &mut bob).unwrap();

    dir.leave_room(&room_id, &mut alice).unwrap();

    assert_eq!(dir.get(&room_id).unwrap().player_ids(), vec![PlayerId(1)]);
}

#[test]
fn test_leave_room_twice_second_returns_not_in_room() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let (mut bob, _b) = client("bbbbbb", 1);
    let room_id = dir.create_room(&mut alice);
    dir.join_room(&room_id, &mut bob).unwrap();

    dir.leave_room(&room_id, &mut bob).unwrap();
    let second = dir.leave_room(&room_id, &mut bob);

    assert!(matches!(second, Err(RoomError::NotInRoom)));
    assert_eq!(dir.get(&room_id).unwrap().len(), 1);
}

#[test]
fn test_leave_room_other_room_is_rejected() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let room_id = dir.create_room(&mut alice);

    let err = dir.leave_room(&RoomId::new("asdf"), &mut alice).unwrap_err();

    assert_eq!(err.to_string(), "User is not in room 'asdf'.");
    assert_eq!(alice.room_id, Some(room_id.clone()));
    assert!(dir.contains(&room_id));
}

#[test]
fn test_leave_room_empty_id_is_rejected() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    dir.create_room(&mut alice);

    let err = dir.leave_room(&RoomId::new(""), &mut alice).unwrap_err();

    assert!(matches!(err, RoomError::NotInThisRoom(_)));
    assert_eq!(err.to_string(), "No roomId provided.");
}

#[test]
fn test_leave_room_stale_pointer_returns_client_not_in_room() {
    // A client whose room pointer names a room it is not a member of.
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let (mut stray, _s) = client("ssssss", 5);
    let room_id = dir.create_room(&mut alice);
    stray.room_id = Some(room_id.clone());

    let result = dir.leave_room(&room_id, &mut stray);

    assert!(matches!(result, Err(RoomError::ClientNotInRoom(_, _))));
    assert_eq!(dir.get(&room_id).unwrap().len(), 1);
}

// =========================================================================
// set_item_map() / route_item()
// =========================================================================

#[test]
fn test_set_item_map_unknown_room_returns_not_found() {
    let mut dir = RoomDirectory::default();
    let result = dir.set_item_map(&RoomId::new("nope12"), fire_map());
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[test]
fn test_route_item_without_map_returns_no_map() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let room_id = dir.create_room(&mut alice);

    let result = dir.route_item(&room_id, "a", PlayerId(0));

    assert!(matches!(result, Err(RoomError::NoMap(_))));
}

#[test]
fn test_route_item_unmapped_location_returns_unexpected_item() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let room_id = dir.create_room(&mut alice);
    dir.set_item_map(&room_id, fire_map()).unwrap();

    let result = dir.route_item(&room_id, "z", PlayerId(0));

    assert!(matches!(result, Err(RoomError::UnexpectedItem { .. })));
}

#[test]
fn test_route_item_absent_recipient_returns_error() {
    let mut dir = RoomDirectory::default();
    let (mut alice, _a) = client("aaaaaa", 0);
    let room_id = dir.create_room(&mut alice);
    dir.set_item_map(&room_id, fire_map()).unwrap();

    let result = dir.route_item(&room_id, "a", PlayerId(0));

    assert!(matches!(result, Err(RoomError::RecipientNotPresent(PlayerId(1)))));
}

#[test]
fn test_route_item_delivers_to_recipient_only() {
    let mut dir = RoomDirectory::default();
    let (mut alice, mut alice_rx) = client("aaaaaa", 0);
    let (mut bob, mut bob_rx) = client("bbbbbb", 1);
    let room_id = dir.create_room(&mut alice);
    dir.join_room(&room_id, &mut bob).unwrap();
    dir.set_item_map(&room_id, fire_map()).unwrap();

    let route = dir.route_item(&room_id, "a", PlayerId(0)).expect("should route");

    assert_eq!(route.name, "fire");
    assert_eq!(route.to, PlayerId(1));

    let delivered = bob_rx
        .try_recv()
        .ok()
        .and_then(Outbound::into_envelope)
        .expect("bob should receive the item");
    assert_eq!(delivered.action, Action::Item);
    assert_eq!(
        delivered.payload.item,
        Some(serde_json::json!({ "name": "fire", "location": "a", "from": 0, "to": 1 }))
    );
    assert!(alice_rx.try_recv().is_err(), "sender gets no push");
}
