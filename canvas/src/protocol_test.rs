use serde_json::json;

use super::*;

fn frame(event: &str, data: Value) -> Frame {
    Frame::new(event, data)
}

#[test]
fn names_match_wire_events() {
    assert_eq!(SyncEvent::ClearAll.name(), "canvas:clear");
    assert_eq!(SyncEvent::FullSync(vec![]).name(), "object:sync");
    assert_eq!(SyncEvent::SyncRequest.name(), "sync:request");
    assert_eq!(SyncEvent::Connected { client_id: "c".into() }.name(), "connect");
}

#[test]
fn added_from_frame() {
    let f = frame(OBJECT_ADDED, json!({"id": "a", "kind": "rect"}));
    let event = SyncEvent::from_frame(&f).unwrap();
    assert_eq!(event.object_id(), Some("a"));
    assert!(matches!(event, SyncEvent::Added(_)));
}

#[test]
fn object_event_requires_object_payload() {
    let f = frame(OBJECT_MODIFIED, json!([1, 2, 3]));
    assert_eq!(
        SyncEvent::from_frame(&f),
        Err(ProtocolError::InvalidPayload { event: OBJECT_MODIFIED, reason: "object payload required" })
    );
}

#[test]
fn removed_requires_id() {
    let f = frame(OBJECT_REMOVED, json!({"kind": "rect"}));
    assert!(matches!(
        SyncEvent::from_frame(&f),
        Err(ProtocolError::InvalidPayload { event: OBJECT_REMOVED, .. })
    ));
}

#[test]
fn removed_accepts_bare_reference() {
    let f = frame(OBJECT_REMOVED, json!({"id": "gone"}));
    assert_eq!(SyncEvent::from_frame(&f).unwrap().object_id(), Some("gone"));
}

#[test]
fn clear_ignores_payload() {
    let f = frame(CANVAS_CLEAR, json!(null));
    assert_eq!(SyncEvent::from_frame(&f), Ok(SyncEvent::ClearAll));
}

#[test]
fn sync_skips_non_object_entries() {
    let f = frame(OBJECT_SYNC, json!({"objects": [{"id": "a"}, 7, "x", {"id": "b"}]}));
    let SyncEvent::FullSync(objects) = SyncEvent::from_frame(&f).unwrap() else {
        panic!("expected FullSync");
    };
    assert_eq!(objects.len(), 2);
}

#[test]
fn sync_requires_objects_array() {
    let f = frame(OBJECT_SYNC, json!({}));
    assert!(SyncEvent::from_frame(&f).is_err());
}

#[test]
fn connect_reads_client_id() {
    let f = frame(CONNECT, json!({"client_id": "abc"}));
    assert_eq!(SyncEvent::from_frame(&f), Ok(SyncEvent::Connected { client_id: "abc".into() }));
    assert!(SyncEvent::from_frame(&frame(CONNECT, json!({}))).is_err());
}

#[test]
fn unknown_event_is_rejected() {
    let f = frame("board:join", json!({}));
    assert_eq!(SyncEvent::from_frame(&f), Err(ProtocolError::UnknownEvent("board:join".into())));
}

#[test]
fn to_frame_round_trips() {
    let events = [
        SyncEvent::Added(json!({"id": "a", "kind": "line"}).as_object().cloned().unwrap()),
        SyncEvent::Removed(json!({"id": "a"}).as_object().cloned().unwrap()),
        SyncEvent::ClearAll,
        SyncEvent::FullSync(vec![json!({"id": "z"}).as_object().cloned().unwrap()]),
        SyncEvent::Connected { client_id: "c1".into() },
        SyncEvent::SyncRequest,
    ];
    for event in events {
        let f = event.to_frame();
        assert_eq!(f.event, event.name());
        assert_eq!(SyncEvent::from_frame(&f), Ok(event));
    }
}

#[test]
fn full_sync_payload_shape() {
    let event = SyncEvent::FullSync(vec![]);
    assert_eq!(event.payload(), json!({"objects": []}));
}
