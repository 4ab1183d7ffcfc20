//! Integration tests for the room system: real actors, real channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use wordduel_game::{FixedSolution, GameSession, Word, WordList};
use wordduel_protocol::{
    Intent, PlayerId, ReportedGameState, RoomId, ServerEvent, SlotStatus,
};
use wordduel_room::{
    GameStore, MemoryStore, Outbound, RoomConfig, RoomDirectory, RoomError,
    RoomHandle, RoomState, StoreError,
};
use wordduel_session::{SessionConfig, SessionManager};
use wordduel_transport::ConnectionId;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::UnboundedReceiver<ServerEvent>;

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn conn(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn room(name: &str) -> RoomId {
    RoomId::from(name)
}

fn channel() -> (Outbound, Inbox) {
    mpsc::unbounded_channel()
}

fn directory_with(config: RoomConfig, store: Arc<MemoryStore>) -> RoomDirectory {
    let dictionary = WordList::parse("crane\nslate\nlemon").unwrap();
    RoomDirectory::new(
        config,
        store,
        Arc::new(dictionary),
        Arc::new(FixedSolution(Word::parse("CRANE").unwrap())),
    )
}

/// `MemoryStore` that also counts writes.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    saves: AtomicUsize,
}

impl CountingStore {
    fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl GameStore for CountingStore {
    fn load_by_room(&self, room_id: &RoomId) -> Result<Option<GameSession>, StoreError> {
        self.inner.load_by_room(room_id)
    }

    fn save(&self, session: &GameSession) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(session)
    }

    fn remove(&self, room_id: &RoomId) -> Result<(), StoreError> {
        self.inner.remove(room_id)
    }
}

fn directory() -> RoomDirectory {
    directory_with(RoomConfig::default(), Arc::new(MemoryStore::new()))
}

async fn recv(inbox: &mut Inbox) -> ServerEvent {
    timeout(Duration::from_secs(2), inbox.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed")
}

/// Round-trips a command through the actor so everything queued before it
/// has been processed.
async fn settle(handle: &RoomHandle, player: PlayerId) {
    handle.snapshot(player).await.unwrap();
}

async fn type_word(handle: &RoomHandle, player: PlayerId, word: &str) {
    for letter in word.chars() {
        handle
            .send_intent(player, Intent::Letter { letter })
            .await
            .unwrap();
    }
}

/// Room "r1" with P1 created and P2 joined. P1's "opponent joined"
/// notification is drained.
async fn duel(dir: &RoomDirectory) -> (RoomHandle, Inbox, Inbox) {
    let (tx1, mut rx1) = channel();
    let (tx2, rx2) = channel();
    let (handle, _) = dir.create_room(&room("r1"), pid(1), conn(1), tx1).await.unwrap();
    dir.join_room(&room("r1"), pid(2), conn(2), tx2).await.unwrap();
    assert!(matches!(recv(&mut rx1).await, ServerEvent::OnUpdateGame(_)));
    (handle, rx1, rx2)
}

// =========================================================================
// create / join / load
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_creator_snapshot() {
    let dir = directory();
    let (tx, _rx) = channel();

    let (handle, snapshot) =
        dir.create_room(&room("r1"), pid(1), conn(1), tx).await.unwrap();

    assert_eq!(handle.room_id(), &room("r1"));
    assert_eq!(snapshot.player_id, pid(1));
    assert_eq!(snapshot.current_row, 0);
    assert!(snapshot.opponent.is_none());
    assert!(snapshot.solution.is_none());
    assert_eq!(dir.room_count().await, 1);
}

#[tokio::test]
async fn test_create_room_twice_fails() {
    let dir = directory();
    dir.create_room(&room("r1"), pid(1), conn(1), channel().0).await.unwrap();

    let result = dir.create_room(&room("r1"), pid(2), conn(2), channel().0).await;

    assert!(matches!(result, Err(RoomError::RoomExists(id)) if id == room("r1")));
}

#[tokio::test]
async fn test_room_ids_are_case_sensitive() {
    let dir = directory();
    dir.create_room(&room("Lobby"), pid(1), conn(1), channel().0).await.unwrap();

    assert!(dir.create_room(&room("lobby"), pid(2), conn(2), channel().0).await.is_ok());
}

#[tokio::test]
async fn test_create_room_rejects_empty_id() {
    let dir = directory();

    let result = dir.create_room(&room(""), pid(1), conn(1), channel().0).await;

    assert!(matches!(result, Err(RoomError::InvalidRoomId(_))));
}

#[tokio::test]
async fn test_join_unknown_room_not_found() {
    let dir = directory();

    let result = dir.join_room(&room("nope"), pid(1), conn(1), channel().0).await;

    assert!(matches!(result, Err(RoomError::RoomNotFound(_))));
}

#[tokio::test]
async fn test_join_seats_second_player_and_notifies_first() {
    let dir = directory();
    let (tx1, mut rx1) = channel();
    dir.create_room(&room("r1"), pid(1), conn(1), tx1).await.unwrap();

    let (handle, snapshot) =
        dir.join_room(&room("r1"), pid(2), conn(2), channel().0).await.unwrap();

    assert_eq!(snapshot.player_id, pid(2));
    assert_eq!(snapshot.opponent.unwrap().player_id, pid(1));
    match recv(&mut rx1).await {
        ServerEvent::OnUpdateGame(state) => assert_eq!(state.player_id, pid(2)),
        other => panic!("expected on_update_game, got {other:?}"),
    }
    assert_eq!(handle.info().await.unwrap().state, RoomState::InProgress);
}

#[tokio::test]
async fn test_join_full_room_rejected() {
    let dir = directory();
    duel(&dir).await;

    let result = dir.join_room(&room("r1"), pid(3), conn(3), channel().0).await;

    assert!(matches!(result, Err(RoomError::RoomFull(_))));
}

#[tokio::test]
async fn test_join_again_as_seated_player_reattaches() {
    let dir = directory();
    duel(&dir).await;

    let (_, snapshot) =
        dir.join_room(&room("r1"), pid(2), conn(9), channel().0).await.unwrap();

    assert_eq!(snapshot.player_id, pid(2));
}

#[tokio::test]
async fn test_load_non_member_rejected() {
    let dir = directory();
    duel(&dir).await;

    let result = dir.load(&room("r1"), pid(3), conn(3), channel().0).await;

    assert!(matches!(result, Err(RoomError::NotInRoom(p, _)) if p == pid(3)));
}

#[tokio::test]
async fn test_load_returns_progress_after_reconnect() {
    let dir = directory();
    let (handle, _rx1, _rx2) = duel(&dir).await;
    type_word(&handle, pid(1), "SLATE").await;
    handle.send_intent(pid(1), Intent::Submit).await.unwrap();
    type_word(&handle, pid(1), "CR").await;
    dir.detach(pid(1), conn(1)).await;

    let snapshot = dir.load(&room("r1"), pid(1), conn(5), channel().0).await.unwrap();

    assert_eq!(snapshot.prev_guesses, vec!["SLATE"]);
    assert_eq!(snapshot.current_guess, "CR");
    assert_eq!(snapshot.current_row, 1);
}

#[tokio::test]
async fn test_reload_returns_the_exact_projection() {
    let store = Arc::new(MemoryStore::new());
    let dir = directory_with(RoomConfig::default(), Arc::clone(&store));
    let (handle, _rx1, _rx2) = duel(&dir).await;
    type_word(&handle, pid(1), "SLATE").await;
    handle.send_intent(pid(1), Intent::Submit).await.unwrap();
    type_word(&handle, pid(1), "LE").await;
    type_word(&handle, pid(2), "LEMON").await;
    handle.send_intent(pid(2), Intent::Submit).await.unwrap();
    type_word(&handle, pid(2), "CRA").await;

    let before = handle.snapshot(pid(1)).await.unwrap().unwrap();
    assert_eq!(before.current_guess, "LE");
    assert_eq!(before.prev_guesses, vec!["SLATE"]);
    let opponent = before.opponent.as_ref().expect("opponent is seated");
    assert_eq!(opponent.prev_guesses, vec!["LEMON"]);
    assert_eq!(opponent.current_guess_len, 3);

    dir.detach(pid(1), conn(1)).await;
    let reloaded = dir.load(&room("r1"), pid(1), conn(5), channel().0).await.unwrap();
    assert_eq!(reloaded, before);

    // Same answer from a directory rebuilt over the store.
    dir.shutdown().await;
    let restarted = directory_with(RoomConfig::default(), store);
    let restored = restarted
        .load(&room("r1"), pid(1), conn(6), channel().0)
        .await
        .unwrap();
    assert_eq!(restored, before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_creates_make_exactly_one_room() {
    let dir = Arc::new(directory());
    let barrier = Arc::new(tokio::sync::Barrier::new(8));

    let tasks: Vec<_> = (1..=8u64)
        .map(|i| {
            let dir = Arc::clone(&dir);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                let (tx, rx) = channel();
                barrier.wait().await;
                let result = dir.create_room(&room("abc"), pid(i), conn(i), tx).await;
                (i, result.map(|(_, snapshot)| snapshot), rx)
            })
        })
        .collect();

    let mut winners = Vec::new();
    let mut refused = 0;
    for task in tasks {
        let (i, result, rx) = task.await.unwrap();
        match result {
            Ok(snapshot) => winners.push((i, snapshot, rx)),
            Err(RoomError::RoomExists(id)) => {
                assert_eq!(id, room("abc"));
                refused += 1;
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(refused, 7);
    assert_eq!(dir.room_count().await, 1);

    let (winner, created, _rx) = winners.remove(0);
    assert_eq!(created.player_id, pid(winner));
    let info = dir.lookup(&room("abc")).await.unwrap().info().await.unwrap();
    assert_eq!(info.players, vec![pid(winner)]);
    let now = dir
        .load(&room("abc"), pid(winner), conn(winner), channel().0)
        .await
        .unwrap();
    assert_eq!(now, created);
}

#[tokio::test]
async fn test_joined_create_pair_yields_one_success() {
    let dir = directory();

    let (code_a, code_b) = (room("abc"), room("abc"));
    let (a, b) = tokio::join!(
        dir.create_room(&code_a, pid(1), conn(1), channel().0),
        dir.create_room(&code_b, pid(2), conn(2), channel().0),
    );

    assert!(a.is_ok() != b.is_ok(), "exactly one create wins");
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(RoomError::RoomExists(_))));
    assert_eq!(dir.room_count().await, 1);
}

// =========================================================================
// Intents and broadcasts
// =========================================================================

#[tokio::test]
async fn test_each_intent_broadcasts_once_to_opponent() {
    let dir = directory();
    let (handle, mut rx1, mut rx2) = duel(&dir).await;

    type_word(&handle, pid(2), "CRANE").await;
    handle.send_intent(pid(2), Intent::Submit).await.unwrap();

    for expected_len in 1..=5u8 {
        match recv(&mut rx1).await {
            ServerEvent::OnUpdateGame(state) => {
                assert_eq!(state.current_guess_len, expected_len);
            }
            other => panic!("expected on_update_game, got {other:?}"),
        }
    }
    match recv(&mut rx1).await {
        ServerEvent::OnUpdateGame(state) => {
            assert!(state.game_won);
            assert_eq!(state.prev_guesses, vec!["CRANE"]);
            assert_eq!(state.current_row, 1);
        }
        other => panic!("expected on_update_game, got {other:?}"),
    }
    match recv(&mut rx2).await {
        ServerEvent::GuessResult(result) => {
            assert_eq!(result.status, SlotStatus::Won);
            assert_eq!(result.solution.as_deref(), Some("CRANE"));
        }
        other => panic!("expected guess_result, got {other:?}"),
    }

    settle(&handle, pid(1)).await;
    assert!(rx1.try_recv().is_err(), "no extra broadcasts");
    assert!(rx2.try_recv().is_err(), "submitter gets no on_update_game");
}

#[tokio::test]
async fn test_incomplete_submit_is_silent() {
    let dir = directory();
    let (handle, mut rx1, mut rx2) = duel(&dir).await;
    type_word(&handle, pid(1), "CRAN").await;
    settle(&handle, pid(1)).await;
    for _ in 0..4 {
        recv(&mut rx2).await;
    }

    handle.send_intent(pid(1), Intent::Submit).await.unwrap();
    settle(&handle, pid(1)).await;

    assert!(rx2.try_recv().is_err(), "rejected submit must not broadcast");
    assert!(rx1.try_recv().is_err());
    let snapshot = handle.snapshot(pid(1)).await.unwrap().unwrap();
    assert_eq!(snapshot.current_row, 0);
    assert_eq!(snapshot.current_guess, "CRAN");
}

#[tokio::test]
async fn test_intent_from_non_member_ignored() {
    let dir = directory();
    let (handle, mut rx1, mut rx2) = duel(&dir).await;

    handle
        .send_intent(pid(7), Intent::Letter { letter: 'A' })
        .await
        .unwrap();
    settle(&handle, pid(1)).await;

    assert!(rx1.try_recv().is_err());
    assert!(rx2.try_recv().is_err());
}

#[tokio::test]
async fn test_legacy_report_cannot_claim_a_win() {
    let dir = directory();
    let (handle, mut rx1, mut rx2) = duel(&dir).await;
    let report = ReportedGameState {
        current_guess: vec![],
        prev_guesses: vec!["SLATE".into()],
        current_row: 6,
        game_won: true,
    };

    handle.send_report(pid(2), report).await.unwrap();
    settle(&handle, pid(2)).await;

    let snapshot = handle.snapshot(pid(2)).await.unwrap().unwrap();
    assert!(!snapshot.game_won);
    assert_eq!(snapshot.current_row, 1);
    assert_eq!(snapshot.status, SlotStatus::Guessing);

    match recv(&mut rx1).await {
        ServerEvent::OnUpdateGame(state) => {
            assert_eq!(state.prev_guesses, vec!["SLATE"]);
            assert!(!state.game_won);
        }
        other => panic!("expected on_update_game, got {other:?}"),
    }
    assert!(matches!(recv(&mut rx2).await, ServerEvent::GuessResult(_)));
}

#[tokio::test]
async fn test_one_report_is_one_broadcast_and_one_save() {
    let store = Arc::new(CountingStore::default());
    let dir = RoomDirectory::new(
        RoomConfig::default(),
        store.clone(),
        Arc::new(WordList::parse("crane\nslate\nlemon").unwrap()),
        Arc::new(FixedSolution(Word::parse("CRANE").unwrap())),
    );
    let (handle, mut rx1, _rx2) = duel(&dir).await;
    let saves_before = store.saves();
    let report = ReportedGameState {
        current_guess: vec!["L".into(), "E".into()],
        prev_guesses: vec!["SLATE".into()],
        ..ReportedGameState::default()
    };

    handle.send_report(pid(2), report).await.unwrap();
    settle(&handle, pid(2)).await;

    match recv(&mut rx1).await {
        ServerEvent::OnUpdateGame(state) => {
            assert_eq!(state.prev_guesses, vec!["SLATE"]);
            assert_eq!(state.current_guess_len, 2);
        }
        other => panic!("expected on_update_game, got {other:?}"),
    }
    assert!(rx1.try_recv().is_err(), "one report, one broadcast");
    assert_eq!(store.saves() - saves_before, 1);
}

#[tokio::test]
async fn test_report_with_nothing_new_is_silent() {
    let dir = directory();
    let (handle, mut rx1, mut rx2) = duel(&dir).await;

    handle
        .send_report(pid(2), ReportedGameState::default())
        .await
        .unwrap();
    settle(&handle, pid(2)).await;

    assert!(rx1.try_recv().is_err());
    assert!(rx2.try_recv().is_err());
}

#[tokio::test]
async fn test_broadcast_to_detached_opponent_does_not_roll_back() {
    let dir = directory();
    let (handle, rx1, _rx2) = duel(&dir).await;
    drop(rx1);

    type_word(&handle, pid(2), "SLATE").await;
    handle.send_intent(pid(2), Intent::Submit).await.unwrap();

    let snapshot = handle.snapshot(pid(2)).await.unwrap().unwrap();
    assert_eq!(snapshot.prev_guesses, vec!["SLATE"]);
}

// =========================================================================
// Persistence, eviction, shutdown
// =========================================================================

#[tokio::test]
async fn test_changes_are_persisted() {
    let store = Arc::new(MemoryStore::new());
    let dir = directory_with(RoomConfig::default(), Arc::clone(&store));
    let (handle, _rx1, _rx2) = duel(&dir).await;

    type_word(&handle, pid(1), "CR").await;
    settle(&handle, pid(1)).await;

    let stored = store.load_by_room(&room("r1")).unwrap().unwrap();
    assert_eq!(stored.snapshot(pid(1)).unwrap().current_guess, "CR");
    assert!(stored.is_full());
}

#[tokio::test]
async fn test_lookup_rehydrates_stored_session() {
    let store = Arc::new(MemoryStore::new());
    let mut session =
        GameSession::new(room("saved"), Word::parse("CRANE").unwrap(), pid(1));
    session.apply_letter(pid(1), 'S').unwrap();
    store.save(&session).unwrap();
    let dir = directory_with(RoomConfig::default(), store);

    assert!(dir.lookup(&room("saved")).await.is_some());
    let snapshot = dir.load(&room("saved"), pid(1), conn(1), channel().0).await.unwrap();

    assert_eq!(snapshot.current_guess, "S");
    assert_eq!(snapshot.session_id, *session.session_id());
}

#[tokio::test]
async fn test_create_over_stored_room_fails() {
    let store = Arc::new(MemoryStore::new());
    store
        .save(&GameSession::new(room("r1"), Word::parse("CRANE").unwrap(), pid(1)))
        .unwrap();
    let dir = directory_with(RoomConfig::default(), store);

    let result = dir.create_room(&room("r1"), pid(2), conn(2), channel().0).await;

    assert!(matches!(result, Err(RoomError::RoomExists(_))));
}

#[tokio::test]
async fn test_evict_idle_removes_unattended_room() {
    let store = Arc::new(MemoryStore::new());
    let config = RoomConfig {
        idle_ttl: Duration::ZERO,
        ..RoomConfig::default()
    };
    let dir = directory_with(config, Arc::clone(&store));
    dir.create_room(&room("r1"), pid(1), conn(1), channel().0).await.unwrap();
    dir.detach(pid(1), conn(1)).await;

    let evicted = dir.evict_idle().await;

    assert_eq!(evicted, vec![room("r1")]);
    assert_eq!(dir.room_count().await, 0);
    assert!(store.is_empty());
    assert!(dir.lookup(&room("r1")).await.is_none());
}

#[tokio::test]
async fn test_evict_idle_keeps_attended_room() {
    let config = RoomConfig {
        idle_ttl: Duration::ZERO,
        ..RoomConfig::default()
    };
    let dir = directory_with(config, Arc::new(MemoryStore::new()));
    let (tx, _rx) = channel();
    dir.create_room(&room("r1"), pid(1), conn(1), tx).await.unwrap();

    assert!(dir.evict_idle().await.is_empty());
    assert_eq!(dir.room_count().await, 1);
}

#[tokio::test]
async fn test_stale_detach_does_not_idle_room() {
    let config = RoomConfig {
        idle_ttl: Duration::ZERO,
        ..RoomConfig::default()
    };
    let dir = directory_with(config, Arc::new(MemoryStore::new()));
    dir.create_room(&room("r1"), pid(1), conn(1), channel().0).await.unwrap();
    dir.load(&room("r1"), pid(1), conn(2), channel().0).await.unwrap();

    dir.detach(pid(1), conn(1)).await;

    assert!(dir.evict_idle().await.is_empty());
}

#[tokio::test]
async fn test_leave_room_detaches_but_keeps_seat() {
    let dir = directory();
    let (handle, _rx1, _rx2) = duel(&dir).await;

    dir.leave_room(&room("r1"), pid(2), conn(2)).await;

    let info = handle.info().await.unwrap();
    assert_eq!(info.attached, 1);
    assert_eq!(info.players, vec![pid(1), pid(2)]);
}

#[tokio::test]
async fn test_shutdown_stops_all_rooms() {
    let dir = directory();
    let (a, _) = dir.create_room(&room("a"), pid(1), conn(1), channel().0).await.unwrap();
    let (b, _) = dir.create_room(&room("b"), pid(2), conn(2), channel().0).await.unwrap();

    dir.shutdown().await;

    assert_eq!(dir.room_count().await, 0);
    assert!(matches!(a.info().await, Err(RoomError::Unavailable(_))));
    assert!(matches!(b.info().await, Err(RoomError::Unavailable(_))));
}

#[tokio::test]
async fn test_play_from_unattached_seat_restarts_idle_clock() {
    let config = RoomConfig {
        idle_ttl: Duration::from_millis(300),
        ..RoomConfig::default()
    };
    let dir = directory_with(config, Arc::new(MemoryStore::new()));
    let (handle, _) = dir.create_room(&room("r1"), pid(1), conn(1), channel().0).await.unwrap();
    dir.detach(pid(1), conn(1)).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    type_word(&handle, pid(1), "S").await;
    settle(&handle, pid(1)).await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    // Past the ttl since the detach, but not since the last keystroke.
    assert!(dir.evict_idle().await.is_empty());

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(dir.evict_idle().await, vec![room("r1")]);
}

#[tokio::test]
async fn test_restart_does_not_hand_a_stored_seat_to_a_newcomer() {
    let store = Arc::new(MemoryStore::new());
    let owner = {
        let mut sessions = SessionManager::new(SessionConfig::default());
        let owner = sessions.create(conn(1)).player_id;
        let dir = directory_with(RoomConfig::default(), Arc::clone(&store));
        let (handle, _) = dir.create_room(&room("r1"), owner, conn(1), channel().0).await.unwrap();
        type_word(&handle, owner, "SL").await;
        settle(&handle, owner).await;
        dir.shutdown().await;
        owner
    };

    // A new process: fresh identities, same store.
    let mut sessions = SessionManager::new(SessionConfig::default());
    let dir = directory_with(RoomConfig::default(), Arc::clone(&store));
    let stranger = sessions.create(conn(2)).player_id;

    assert_ne!(stranger, owner);
    let result = dir.load(&room("r1"), stranger, conn(2), channel().0).await;
    assert!(matches!(result, Err(RoomError::NotInRoom(p, _)) if p == stranger));

    let snapshot = dir.load(&room("r1"), owner, conn(3), channel().0).await.unwrap();
    assert_eq!(snapshot.player_id, owner);
    assert_eq!(snapshot.current_guess, "SL");
}
