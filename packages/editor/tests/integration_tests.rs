//! Integration tests for the editor crate
//!
//! Exercises the draft store end to end through its public API:
//! - Undo/redo as an exact inverse of recorded edits
//! - Gesture coalescing and no-op elision
//! - History cap behaviour
//! - Commit and re-derivation from the committed source

use std::sync::Arc;

use deckhand_common::{props, EditorConfig};
use deckhand_editor::{
    ChangeSource, CommittedDeck, CommittedSource, Component, ComponentType, ComponentUpdate,
    DraftStore, EditError, Point, Rect, TransientGate,
};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn shape(id: &str, x: f64, y: f64) -> Component {
    Component::new(id, ComponentType::Shape).with_rect(Rect::new(x, y, 40.0, 20.0))
}

fn move_to(x: f64, y: f64) -> ComponentUpdate {
    ComponentUpdate::props(props(json!({ "position": { "x": x, "y": y } })))
}

fn deck() -> Arc<CommittedDeck> {
    Arc::new(CommittedDeck::new().with_slide(
        "s1",
        vec![
            Component::new("slide-background", ComponentType::Background),
            shape("a", 0.0, 0.0),
            shape("b", 100.0, 0.0),
        ],
    ))
}

#[test]
fn test_undo_is_inverse_of_edits() {
    init_tracing();
    let mut store = DraftStore::new(deck());

    let mut states = vec![store.snapshot("s1")];

    store.update_component("s1", "a", move_to(10.0, 10.0), false);
    states.push(store.snapshot("s1"));

    store.add_component("s1", shape("c", 50.0, 50.0), false);
    states.push(store.snapshot("s1"));

    store.update_component("s1", "c", props(json!({ "fill": "#ff0000" })), false);
    states.push(store.snapshot("s1"));

    store.remove_component("s1", "b", false).unwrap();
    states.push(store.snapshot("s1"));

    store.update_component("s1", "a", move_to(20.0, 5.0), false);
    states.push(store.snapshot("s1"));

    // Walk all the way back
    for expected in states.iter().rev().skip(1) {
        assert!(store.undo("s1"));
        assert_eq!(&store.snapshot("s1"), expected);
    }
    assert!(!store.can_undo("s1"));

    // And forward again
    for expected in states.iter().skip(1) {
        assert!(store.redo("s1"));
        assert_eq!(&store.snapshot("s1"), expected);
    }
    assert!(!store.can_redo("s1"));
}

#[test]
fn test_gesture_coalesces_to_one_entry() {
    let mut store = DraftStore::new(deck());
    store.update_component("s1", "b", move_to(90.0, 0.0), false);
    let before = store.history().len("s1");

    store.start_transient_operation("s1", "a");
    for step in 1..=25 {
        let offset = step as f64 * 4.0;
        store.update_component("s1", "a", move_to(offset, offset), true);
    }
    assert!(store.end_transient_operation("s1", "a"));

    assert_eq!(store.history().len("s1"), before + 1);

    // One undo returns to the pre-drag position
    assert!(store.undo("s1"));
    assert_eq!(store.component("s1", "a").unwrap().position(), Point::new(0.0, 0.0));
}

#[test]
fn test_recorded_updates_during_gesture_are_suppressed() {
    let mut store = DraftStore::new(deck());
    store.update_component("s1", "b", move_to(90.0, 0.0), false);
    let before = store.history().len("s1");

    store.start_transient_operation("s1", "a");
    store.update_component("s1", "a", move_to(1.0, 1.0), false);
    store.update_component("s1", "a", move_to(2.0, 2.0), false);
    store.end_transient_operation("s1", "a");

    assert!(store.history().len("s1") <= before + 1);
}

#[test]
fn test_noop_gesture_adds_nothing() {
    let mut store = DraftStore::new(deck());
    store.update_component("s1", "b", move_to(90.0, 0.0), false);
    let before = store.history().len("s1");

    store.start_transient_operation("s1", "a");
    store.update_component("s1", "a", move_to(30.0, 30.0), true);
    store.update_component("s1", "a", move_to(0.0, 0.0), true);
    assert!(!store.end_transient_operation("s1", "a"));

    assert_eq!(store.history().len("s1"), before);
}

#[test]
fn test_first_gesture_on_fresh_slide_records_baseline() {
    let mut store = DraftStore::new(deck());
    store.components("s1");

    store.start_transient_operation("s1", "a");
    assert!(store.end_transient_operation("s1", "a"));
    assert_eq!(store.history().len("s1"), 1);
}

#[test]
fn test_protected_deletion_keeps_count() {
    let mut store = DraftStore::new(deck());
    let count = store.components("s1").len();

    let result = store.remove_component("s1", "slide-background", false);
    assert_eq!(
        result,
        Err(EditError::ProtectedComponent {
            slide_id: "s1".to_string(),
            component_id: "slide-background".to_string(),
        })
    );
    assert_eq!(store.components("s1").len(), count);
    assert!(!store.has_unsaved_changes("s1"));
}

#[test]
fn test_history_cap_of_fifty() {
    let config = EditorConfig { history_cap: 50 };
    let mut store = DraftStore::with_config(deck(), &config, TransientGate::new());

    for step in 1..=60 {
        store.update_component("s1", "a", move_to(step as f64, 0.0), false);
    }

    assert_eq!(store.history().len("s1"), 50);
    assert_eq!(store.history().undo_levels("s1"), 49);

    let mut undone = 0;
    while store.undo("s1") {
        undone += 1;
    }
    assert_eq!(undone, 49);
    assert_eq!(store.component("s1", "a").unwrap().position(), Point::new(11.0, 0.0));
}

#[test]
fn test_separate_gates_do_not_interfere() {
    let deck = deck();
    let mut left = DraftStore::with_config(deck.clone(), &EditorConfig::default(), TransientGate::new());
    let mut right = DraftStore::with_config(deck, &EditorConfig::default(), TransientGate::new());

    left.start_transient_operation("s1", "a");
    assert!(right.update_component("s1", "b", move_to(5.0, 5.0), false));
    assert!(right.can_undo("s1"));
    assert!(!right.gate().is_active());

    left.cancel_transient_operation("a");
}

#[test]
fn test_shared_gate_suppresses_both_stores() {
    let deck = deck();
    let gate = TransientGate::new();
    let mut left = DraftStore::with_config(deck.clone(), &EditorConfig::default(), gate.clone());
    let mut right = DraftStore::with_config(deck, &EditorConfig::default(), gate);

    left.start_transient_operation("s1", "a");
    right.update_component("s1", "b", move_to(5.0, 5.0), false);
    assert!(!right.can_undo("s1"));
}

#[test]
fn test_commit_round_trips_into_next_session() {
    init_tracing();
    let deck = deck();
    let mut store = DraftStore::new(deck.clone());

    store.update_component("s1", "a", move_to(7.0, 3.0), false);
    store.select_components("s1", ["a", "b"]);
    let group_id = store.group_components("s1").unwrap();

    assert_eq!(store.commit(&*deck), Ok(1));
    assert_eq!(deck.flush_count(), 1);

    let committed = deck.load("s1").unwrap();
    assert!(committed.iter().any(|c| c.id == group_id));

    // A fresh session reads the committed result, sharing every slot
    let mut next = DraftStore::new(deck.clone());
    assert!(next.components("s1").iter().all(|slot| slot.is_shared()));
    assert_eq!(next.component("s1", "a").unwrap().position(), Point::new(7.0, 3.0));
    assert_eq!(
        next.component("s1", "a").unwrap().parent_id.as_deref(),
        Some(group_id.as_str())
    );
}

#[test]
fn test_external_restore_is_not_recorded() {
    let mut store = DraftStore::new(deck());
    let incoming = vec![Arc::new(shape("remote", 1.0, 1.0))];

    assert!(store.replace_components("s1", incoming, ChangeSource::ExternalRestore));
    assert!(!store.can_undo("s1"));
    assert_eq!(store.components("s1").len(), 1);
    assert!(store.has_unsaved_changes("s1"));
}
