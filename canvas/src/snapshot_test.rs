use super::*;
use crate::doc::{CanvasObject, Style};

#[test]
fn empty_store_yields_empty_sync() {
    assert_eq!(build_full_sync(&DocStore::new()), SyncEvent::FullSync(vec![]));
}

#[test]
fn sync_keeps_draw_order() {
    let mut doc = DocStore::new();
    doc.insert(CanvasObject::rect(0.0, 0.0, 1.0, 1.0, Style::default()).with_id("b"));
    doc.insert(CanvasObject::rect(0.0, 0.0, 1.0, 1.0, Style::default()).with_id("a"));
    let SyncEvent::FullSync(objects) = build_full_sync(&doc) else {
        panic!("expected full sync");
    };
    let ids: Vec<_> = objects.iter().filter_map(wire::wire_id).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn sync_skips_unidentified_objects() {
    let mut doc = DocStore::new();
    doc.insert(CanvasObject::line(0.0, 0.0, 5.0, 5.0, Style::default()));
    doc.insert(CanvasObject::line(0.0, 0.0, 5.0, 5.0, Style::default()).with_id("x"));
    let SyncEvent::FullSync(objects) = build_full_sync(&doc) else {
        panic!("expected full sync");
    };
    assert_eq!(objects.len(), 1);
    assert_eq!(wire::wire_id(&objects[0]), Some("x"));
}
