#![allow(clippy::float_cmp)]

use serde_json::{Value, json};

use super::*;
use crate::doc::{CanvasObject, InstanceKey, Shape, Style, WireObject};
use crate::surface::Lifecycle;

fn obj(value: Value) -> WireObject {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn rect_wire(id: &str, left: f64) -> WireObject {
    obj(json!({"id": id, "kind": "rect", "left": left, "top": 0, "width": 10, "height": 10}))
}

fn setup() -> (Surface, EchoGate) {
    (Surface::new(), EchoGate::new())
}

/// Drain the queue and report, per notification, whether the gate swallowed it.
fn drain_suppressed(surface: &mut Surface, gate: &mut EchoGate) -> Vec<(InstanceKey, bool)> {
    let mut out = Vec::new();
    while let Some(note) = surface.next_lifecycle() {
        let key = note.key();
        out.push((key, gate.is_suppressed_and_clear(key)));
    }
    out
}

// =============================================================
// Added
// =============================================================

#[test]
fn added_inserts_and_marks() {
    let (mut s, mut g) = setup();
    let applied = apply(&mut s, &mut g, SyncEvent::Added(rect_wire("a", 1.0)));
    assert_eq!(applied, Applied::Inserted("a".into()));
    assert!(s.find("a").is_some());
    assert!(s.take_render_request());
    let seen = drain_suppressed(&mut s, &mut g);
    assert_eq!(seen.len(), 1);
    assert!(seen[0].1);
}

#[test]
fn duplicate_added_is_ignored() {
    let (mut s, mut g) = setup();
    apply(&mut s, &mut g, SyncEvent::Added(rect_wire("a", 1.0)));
    drain_suppressed(&mut s, &mut g);
    let before = s.find("a");
    let applied = apply(&mut s, &mut g, SyncEvent::Added(rect_wire("a", 99.0)));
    assert_eq!(applied, Applied::Ignored(Ignored::DuplicateAdd("a".into())));
    assert_eq!(s.find("a"), before);
    assert_eq!(s.doc().len(), 1);
    assert!(!s.has_pending());
    assert!(g.is_empty());
}

#[test]
fn malformed_added_is_dropped() {
    let (mut s, mut g) = setup();
    let applied = apply(&mut s, &mut g, SyncEvent::Added(obj(json!({"id": "a", "kind": "rect"}))));
    assert!(matches!(applied, Applied::Dropped(_)));
    assert!(s.doc().is_empty());
    assert!(g.is_empty());
}

// =============================================================
// Modified
// =============================================================

#[test]
fn modified_replaces_attributes_in_place() {
    let (mut s, mut g) = setup();
    apply(&mut s, &mut g, SyncEvent::Added(rect_wire("a", 1.0)));
    drain_suppressed(&mut s, &mut g);
    let key = s.find("a");

    let applied = apply(&mut s, &mut g, SyncEvent::Modified(rect_wire("a", 50.0)));
    assert_eq!(applied, Applied::Updated("a".into()));
    assert_eq!(s.find("a"), key);
    let shape = s.doc().get_by_id("a").map(|o| o.shape.clone());
    assert_eq!(shape, Some(Shape::Rect { left: 50.0, top: 0.0, width: 10.0, height: 10.0 }));
    let seen = drain_suppressed(&mut s, &mut g);
    assert_eq!(seen.len(), 1);
    assert!(seen[0].1);
}

#[test]
fn modified_unknown_is_ignored() {
    let (mut s, mut g) = setup();
    let applied = apply(&mut s, &mut g, SyncEvent::Modified(rect_wire("ghost", 1.0)));
    assert_eq!(applied, Applied::Ignored(Ignored::UnknownObjectReference("ghost".into())));
    assert!(s.doc().is_empty());
    assert!(!s.take_render_request());
}

#[test]
fn modify_before_add_is_not_buffered() {
    let (mut s, mut g) = setup();
    apply(&mut s, &mut g, SyncEvent::Modified(rect_wire("x", 77.0)));
    apply(&mut s, &mut g, SyncEvent::Added(rect_wire("x", 1.0)));
    let left = s.doc().get_by_id("x").map(|o| o.shape.clone());
    assert_eq!(left, Some(Shape::Rect { left: 1.0, top: 0.0, width: 10.0, height: 10.0 }));
}

#[test]
fn malformed_modified_leaves_object_alone() {
    let (mut s, mut g) = setup();
    apply(&mut s, &mut g, SyncEvent::Added(rect_wire("a", 1.0)));
    drain_suppressed(&mut s, &mut g);
    let applied = apply(&mut s, &mut g, SyncEvent::Modified(obj(json!({"id": "a", "kind": "rect", "left": 3}))));
    assert!(matches!(applied, Applied::Dropped(_)));
    assert!(!s.has_pending());
    assert!(g.is_empty());
}

// =============================================================
// Removed / ClearAll
// =============================================================

#[test]
fn removed_deletes_and_marks() {
    let (mut s, mut g) = setup();
    apply(&mut s, &mut g, SyncEvent::Added(rect_wire("a", 1.0)));
    drain_suppressed(&mut s, &mut g);
    let applied = apply(&mut s, &mut g, SyncEvent::Removed(obj(json!({"id": "a"}))));
    assert_eq!(applied, Applied::Removed("a".into()));
    assert!(s.doc().is_empty());
    let note = s.next_lifecycle();
    assert!(matches!(note, Some(Lifecycle::Removed { .. })));
    assert!(note.is_some_and(|n| g.is_suppressed_and_clear(n.key())));
}

#[test]
fn removed_unknown_is_ignored() {
    let (mut s, mut g) = setup();
    let applied = apply(&mut s, &mut g, SyncEvent::Removed(obj(json!({"id": "nope"}))));
    assert_eq!(applied, Applied::Ignored(Ignored::UnknownObjectReference("nope".into())));
}

#[test]
fn clear_all_is_silent() {
    let (mut s, mut g) = setup();
    apply(&mut s, &mut g, SyncEvent::Added(rect_wire("a", 1.0)));
    apply(&mut s, &mut g, SyncEvent::Added(rect_wire("b", 1.0)));
    drain_suppressed(&mut s, &mut g);
    s.set_background("#222222");
    assert_eq!(apply(&mut s, &mut g, SyncEvent::ClearAll), Applied::Cleared);
    assert!(s.doc().is_empty());
    assert!(!s.has_pending());
    assert!(g.is_empty());
    assert_eq!(s.background(), crate::doc::DEFAULT_BACKGROUND);
}

// =============================================================
// FullSync
// =============================================================

#[test]
fn full_sync_replaces_everything() {
    let (mut s, mut g) = setup();
    for id in ["A", "B", "C"] {
        apply(&mut s, &mut g, SyncEvent::Added(rect_wire(id, 1.0)));
    }
    drain_suppressed(&mut s, &mut g);

    let applied = apply(
        &mut s,
        &mut g,
        SyncEvent::FullSync(vec![rect_wire("B", 42.0), rect_wire("D", 5.0)]),
    );
    assert_eq!(applied, Applied::Replaced { count: 2, skipped: 0 });
    assert_eq!(s.doc().ids(), vec!["B", "D"]);
    let b = s.doc().get_by_id("B").map(|o| o.shape.clone());
    assert_eq!(b, Some(Shape::Rect { left: 42.0, top: 0.0, width: 10.0, height: 10.0 }));
    let seen = drain_suppressed(&mut s, &mut g);
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|(_, suppressed)| *suppressed));
}

#[test]
fn full_sync_skips_malformed_entries() {
    let (mut s, mut g) = setup();
    let applied = apply(
        &mut s,
        &mut g,
        SyncEvent::FullSync(vec![rect_wire("ok", 1.0), obj(json!({"kind": "rect"}))]),
    );
    assert_eq!(applied, Applied::Replaced { count: 1, skipped: 1 });
    assert_eq!(s.doc().ids(), vec!["ok"]);
}

#[test]
fn full_sync_renders_once() {
    let (mut s, mut g) = setup();
    apply(&mut s, &mut g, SyncEvent::FullSync(vec![rect_wire("a", 1.0), rect_wire("b", 2.0)]));
    assert_eq!(s.renders(), 1);
}

#[test]
fn empty_full_sync_empties_canvas() {
    let (mut s, mut g) = setup();
    apply(&mut s, &mut g, SyncEvent::Added(rect_wire("a", 1.0)));
    drain_suppressed(&mut s, &mut g);
    apply(&mut s, &mut g, SyncEvent::FullSync(vec![]));
    assert!(s.doc().is_empty());
}

#[test]
fn local_objects_are_never_pre_marked() {
    let (mut s, mut g) = setup();
    let key = s.add(CanvasObject::rect(0.0, 0.0, 1.0, 1.0, Style::default()));
    apply(&mut s, &mut g, SyncEvent::Added(rect_wire("remote", 1.0)));
    assert!(!g.is_suppressed_and_clear(key));
}

#[test]
fn transport_events_pass_through() {
    let (mut s, mut g) = setup();
    assert_eq!(apply(&mut s, &mut g, SyncEvent::SyncRequest), Applied::Passthrough);
    assert_eq!(
        apply(&mut s, &mut g, SyncEvent::Connected { client_id: "c".into() }),
        Applied::Passthrough
    );
}
