mod common;

use std::time::Duration;

use mapsync_core::source::BeatmapSource;
use mapsync_net::protocol::{IgnorePayload, Message, MessageType};
use mapsync_types::Beatmap;

fn list_message(maps: &[Beatmap]) -> Message {
    let content = serde_json::to_string(&Some(maps.to_vec())).unwrap();
    Message::new(MessageType::List, content)
}

fn ignore_message(local_side: bool, index: usize, ignored: bool) -> Message {
    let content = serde_json::to_string(&IgnorePayload {
        local_side,
        index,
        ignored,
    })
    .unwrap();
    Message::new(MessageType::Ignore, content)
}

/// Connect a raw peer and consume the REQUEST the manager fires on accept.
fn connect_raw(peer: &common::TestPeer) -> common::RawPeer {
    let mut raw = common::RawPeer::connect(&peer.addr()).unwrap();
    let greeting = raw.recv().unwrap();
    assert_eq!(greeting.kind, MessageType::Request);
    common::wait_for(Duration::from_secs(2), || peer.manager.is_connected());
    raw
}

#[test]
fn test_request_is_answered_with_local_list() {
    let peer = common::start_peer(&["1 alpha", "2 beta"]);
    let mut raw = connect_raw(&peer);

    raw.send(&Message::request()).unwrap();
    let reply = raw.recv().unwrap();
    assert_eq!(reply.kind, MessageType::List);

    let maps: Option<Vec<Beatmap>> = serde_json::from_str(&reply.content).unwrap();
    assert_eq!(
        maps,
        Some(vec![Beatmap::new(1, "alpha"), Beatmap::new(2, "beta")])
    );
}

#[test]
fn test_request_is_answered_even_with_absent_snapshot() {
    let peer = common::start_peer(&[]);
    let mut raw = connect_raw(&peer);

    // Break the local library; the failed refresh pushes a null list.
    peer.local.set_root(peer.songs.path().join("vanished"));
    assert!(!peer.local.refresh());
    let pushed = raw.recv().unwrap();
    assert_eq!(pushed.kind, MessageType::List);
    assert_eq!(pushed.content, "null");

    // An explicit request is still answered, absent snapshot and all.
    raw.send(&Message::request()).unwrap();
    let reply = raw.recv().unwrap();
    assert_eq!(reply.kind, MessageType::List);
    assert_eq!(reply.content, "null");
}

#[test]
fn test_inbound_list_replaces_remote_snapshot() {
    let peer = common::start_peer(&[]);
    let mut raw = connect_raw(&peer);

    let maps = vec![Beatmap::new(3, "gamma"), Beatmap::new(7, "delta")];
    raw.send(&list_message(&maps)).unwrap();
    common::wait_for(Duration::from_secs(2), || {
        peer.remote.snapshot() == Some(maps.clone())
    });

    // A null list mirrors a peer whose snapshot is absent.
    raw.send(&Message::new(MessageType::List, "null")).unwrap();
    common::wait_for(Duration::from_secs(2), || peer.remote.snapshot().is_none());
}

#[test]
fn test_local_refresh_pushes_list_to_peer() {
    let peer = common::start_peer(&["4 epsilon"]);
    let mut raw = connect_raw(&peer);

    assert!(peer.local.refresh());
    let pushed = raw.recv().unwrap();
    assert_eq!(pushed.kind, MessageType::List);
    let maps: Option<Vec<Beatmap>> = serde_json::from_str(&pushed.content).unwrap();
    assert_eq!(maps, Some(vec![Beatmap::new(4, "epsilon")]));
}

#[test]
fn test_inbound_ignore_inverts_to_remote_side() {
    let peer = common::start_peer(&[]);
    let mut raw = connect_raw(&peer);

    raw.send(&list_message(&[
        Beatmap::new(1, "a"),
        Beatmap::new(2, "b"),
        Beatmap::new(3, "c"),
    ]))
    .unwrap();
    common::wait_for(Duration::from_secs(2), || peer.remote.snapshot().is_some());

    // The sender flags its own (local) side; on this side that is the
    // remote library.
    raw.send(&ignore_message(true, 1, true)).unwrap();
    common::wait_for(Duration::from_secs(2), || {
        peer.remote
            .snapshot()
            .is_some_and(|maps| maps[1].ignored)
    });

    // The change echoes back, now labeled as this side's remote.
    let echo = raw.recv().unwrap();
    assert_eq!(echo.kind, MessageType::Ignore);
    let payload: IgnorePayload = serde_json::from_str(&echo.content).unwrap();
    assert_eq!(
        payload,
        IgnorePayload {
            local_side: false,
            index: 1,
            ignored: true,
        }
    );
}

#[test]
fn test_inbound_ignore_on_local_side() {
    let peer = common::start_peer(&["5 keep", "6 drop"]);
    let mut raw = connect_raw(&peer);

    // The sender flags its remote side, which is this peer's local one.
    raw.send(&ignore_message(false, 1, true)).unwrap();
    common::wait_for(Duration::from_secs(2), || {
        peer.local.snapshot().is_some_and(|maps| maps[1].ignored)
    });
}

#[test]
fn test_local_toggle_is_pushed_with_local_tag() {
    let peer = common::start_peer(&["8 theta", "9 iota"]);
    let mut raw = connect_raw(&peer);

    peer.local.set_ignored(0, true);
    let msg = raw.recv().unwrap();
    assert_eq!(msg.kind, MessageType::Ignore);
    let payload: IgnorePayload = serde_json::from_str(&msg.content).unwrap();
    assert_eq!(
        payload,
        IgnorePayload {
            local_side: true,
            index: 0,
            ignored: true,
        }
    );
}

#[test]
fn test_malformed_frame_does_not_kill_the_connection() {
    let peer = common::start_peer(&["1 alpha"]);
    let mut raw = connect_raw(&peer);

    raw.send_raw("MSG_START\nthis is not json\nMSG_END\n").unwrap();
    raw.send_raw("loose line outside any frame\n").unwrap();

    // The link survives and still answers requests.
    raw.send(&Message::request()).unwrap();
    let reply = raw.recv().unwrap();
    assert_eq!(reply.kind, MessageType::List);
    assert!(peer.manager.is_connected());
}

#[test]
fn test_out_of_range_ignore_is_dropped() {
    let peer = common::start_peer(&[]);
    let mut raw = connect_raw(&peer);

    raw.send(&list_message(&[Beatmap::new(1, "only")])).unwrap();
    common::wait_for(Duration::from_secs(2), || peer.remote.snapshot().is_some());

    raw.send(&ignore_message(true, 42, true)).unwrap();

    // Still alive, snapshot untouched.
    raw.send(&Message::request()).unwrap();
    assert_eq!(raw.recv().unwrap().kind, MessageType::List);
    assert!(peer.remote.snapshot().unwrap().iter().all(|b| !b.ignored));
}
