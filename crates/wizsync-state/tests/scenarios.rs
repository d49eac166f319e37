//! End-to-end checks of reconciler + gate + submitter on realistic frames.

use std::sync::Arc;

use tokio::sync::mpsc;
use wizsync_protocol::{ActionKind, Card, Phase, Suit};
use wizsync_session::{
    ChannelEvent, ConnectionConfig, ConnectionEvent, ConnectionManager, PlayerId,
};
use wizsync_state::{ActionSubmitter, Intent, NotAllowed, PhaseGate, Reconciler, SyncError};
use wizsync_transport::{MockConnection, MockConnector};

const BIDDING_FRAME: &str = r#"{
    "trump_card": {"suit": "hearts", "value": "Q", "playable": false},
    "hand": [
        {"suit": "spades", "value": "A", "playable": false},
        {"suit": "clubs", "value": "7", "playable": false},
        {"suit": "wizard", "value": "", "playable": false},
        {"suit": "diamonds", "value": "10", "playable": false},
        {"suit": "hearts", "value": "2", "playable": false}
    ],
    "played_cards": [],
    "turn": true,
    "score": 0,
    "bid": null,
    "current_tricks": 0,
    "n_round": 5
}"#;

const PLAYING_OFF_TURN_FRAME: &str = r#"{
    "trump_card": {"suit": "hearts", "value": "Q", "playable": false},
    "hand": [{"suit": "spades", "value": "A", "playable": true}],
    "played_cards": [{"suit": "spades", "value": "K", "playable": false}],
    "turn": false,
    "score": 20,
    "bid": 3,
    "current_tricks": 1,
    "n_round": 5
}"#;

// =====================================================================
// Scenarios
// =====================================================================

#[test]
fn test_scenario_null_bid_on_turn_is_bidding_zero_to_five() {
    let mut reconciler = Reconciler::new();
    let gate = PhaseGate::new();

    let snapshot = reconciler.apply_snapshot(BIDDING_FRAME.as_bytes()).unwrap();
    let allowed = gate.allowed_actions(Some(&snapshot));

    assert_eq!(snapshot.phase, Phase::Bidding);
    assert_eq!(allowed.bid, Some(0..=5));
    assert!(allowed.playable.is_empty());
    assert!(!allowed.ready);
}

#[test]
fn test_scenario_bid_placed_off_turn_is_playing_without_play() {
    let mut reconciler = Reconciler::new();
    let gate = PhaseGate::new();

    reconciler.apply_snapshot(BIDDING_FRAME.as_bytes()).unwrap();
    let snapshot = reconciler
        .apply_snapshot(PLAYING_OFF_TURN_FRAME.as_bytes())
        .unwrap();
    let allowed = gate.allowed_actions(Some(&snapshot));

    assert_eq!(snapshot.phase, Phase::Playing);
    assert_eq!(snapshot.current_tricks_won, 1);
    assert!(allowed.playable.is_empty());
    assert_eq!(
        gate.authorize(
            Some(&snapshot),
            &Intent::PlayCard(Card::new(Suit::Spades, "A"))
        ),
        Err(NotAllowed::NotYourTurn(ActionKind::PlayCard))
    );
}

#[test]
fn test_scenario_playing_first_frame_with_bid_is_playing() {
    // A client that joins mid-round sees a bid straight away.
    let mut reconciler = Reconciler::new();
    let snapshot = reconciler
        .apply_snapshot(PLAYING_OFF_TURN_FRAME.as_bytes())
        .unwrap();
    assert_eq!(snapshot.phase, Phase::Playing);
}

#[test]
fn test_scenario_garbage_between_valid_frames_is_skipped() {
    let mut reconciler = Reconciler::new();

    let first = reconciler.apply_snapshot(BIDDING_FRAME.as_bytes()).unwrap();
    assert!(matches!(
        reconciler.apply_snapshot(b"{\"turn\": tru"),
        Err(SyncError::MalformedSnapshot(_))
    ));
    assert_eq!(reconciler.current(), Some(first.as_ref()));

    let next = reconciler
        .apply_snapshot(PLAYING_OFF_TURN_FRAME.as_bytes())
        .unwrap();
    assert_eq!(reconciler.current(), Some(next.as_ref()));
}

#[test]
fn test_scenario_held_snapshot_is_last_valid_frame() {
    let frames: Vec<&[u8]> = vec![
        BIDDING_FRAME.as_bytes(),
        b"null",
        PLAYING_OFF_TURN_FRAME.as_bytes(),
        b"[]",
        br#"{"hand":[{"suit":"stars","value":"1"}],"turn":true,"score":0,"n_round":1}"#,
        b"",
    ];

    let mut reconciler = Reconciler::new();
    let mut last_valid = None;
    for frame in frames {
        if let Ok(snapshot) = reconciler.apply_snapshot(frame) {
            last_valid = Some(snapshot);
        }
        assert_eq!(reconciler.current_arc(), last_valid);
    }
    assert_eq!(reconciler.applied(), 2);
    assert_eq!(reconciler.rejected(), 4);
}

#[test]
fn test_scenario_symbol_suits_and_numeric_values_decode() {
    let mut reconciler = Reconciler::new();
    let snapshot = reconciler
        .apply_snapshot(
            r#"{"hand":[{"suit":"♠","value":12,"playable":true}],"turn":true,"score":0,"bid":0,"n_round":1}"#
                .as_bytes(),
        )
        .unwrap();
    assert_eq!(snapshot.hand, vec![Card::new(Suit::Spades, "12").with_playable(true)]);
}

// =====================================================================
// Through a real connection manager
// =====================================================================

#[tokio::test(start_paused = true)]
async fn test_submit_through_manager_ready_twice_sends_one_frame() {
    let connector = MockConnector::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<ChannelEvent<MockConnection>>();
    let mut manager = ConnectionManager::new(
        Arc::new(connector.clone()),
        PlayerId::new("abcdefghi"),
        ConnectionConfig::default(),
        tx,
    );
    manager.connect().unwrap();
    let opened = rx.recv().await.unwrap();
    assert_eq!(manager.handle(opened), Some(ConnectionEvent::Connected));
    let remote = connector.accept().await;

    let mut submitter = ActionSubmitter::new();
    submitter
        .submit(Intent::Ready, None, &mut manager)
        .await
        .unwrap();
    let second = submitter.submit(Intent::Ready, None, &mut manager).await;

    assert!(matches!(second, Err(SyncError::ActionNotAllowed(_))));
    assert_eq!(remote.sent(), vec![r#"{"action":"ready"}"#.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_submit_through_disconnected_manager_is_lost() {
    let connector = MockConnector::new();
    let (tx, _rx) = mpsc::unbounded_channel::<ChannelEvent<MockConnection>>();
    let mut manager = ConnectionManager::new(
        Arc::new(connector),
        PlayerId::new("abcdefghi"),
        ConnectionConfig::default(),
        tx,
    );

    let mut submitter = ActionSubmitter::new();
    let result = submitter.submit(Intent::Ready, None, &mut manager).await;

    assert!(matches!(result, Err(SyncError::ActionLost(_))));
    assert!(submitter.gate().flags().ready_sent);
}
