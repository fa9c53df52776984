//! # History Engine
//!
//! Per-slide undo/redo over component snapshots.
//!
//! ## Design
//!
//! - Each slide keeps a linear sequence of snapshots plus a cursor
//! - The cursor entry is the state currently shown
//! - Recording after an undo discards the redo branch
//! - Identical consecutive snapshots are never stored twice
//! - The oldest entry is evicted once the cap is exceeded
//! - While a gesture holds the transient gate, recording is suppressed; the
//!   gesture's net effect is recorded once when it ends
//! - A gesture that ends while another still holds the gate parks its net
//!   effect; parked states are recorded once the gate releases
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = HistoryEngine::new(TransientGate::new());
//!
//! history.record("slide-1", &before);
//! history.record("slide-1", &after);
//!
//! // Returns the snapshot to restore
//! let restored = history.undo("slide-1");
//! ```

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use deckhand_common::{Component, EditorConfig};

use crate::transient::TransientGate;

/// One recorded state of a slide
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub components: Vec<Component>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SlideHistory {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
}

impl SlideHistory {
    fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }
}

#[derive(Debug)]
pub struct HistoryEngine {
    slides: HashMap<String, SlideHistory>,

    /// Maximum entries per slide (0 = unlimited)
    max_entries: usize,

    gate: TransientGate,

    /// Net gesture states waiting for the gate to release, by slide
    pending: HashMap<String, Vec<Component>>,
}

impl HistoryEngine {
    /// Create a history engine with the default cap (50)
    pub fn new(gate: TransientGate) -> Self {
        Self::from_config(&EditorConfig::default(), gate)
    }

    pub fn from_config(config: &EditorConfig, gate: TransientGate) -> Self {
        Self::with_max_entries(config.history_cap, gate)
    }

    pub fn with_max_entries(max_entries: usize, gate: TransientGate) -> Self {
        Self {
            slides: HashMap::new(),
            max_entries,
            gate,
            pending: HashMap::new(),
        }
    }

    pub fn gate(&self) -> &TransientGate {
        &self.gate
    }

    /// Record a snapshot. Returns whether an entry was written.
    pub fn record(&mut self, slide_id: &str, components: &[Component]) -> bool {
        if self.gate.is_active() {
            tracing::debug!("[History] suppressed for {} (gesture active)", slide_id);
            return false;
        }
        self.flush_pending();
        self.push(slide_id, components)
    }

    /// Record parked gesture states once no gesture holds the gate
    fn flush_pending(&mut self) {
        if self.pending.is_empty() || self.gate.is_active() {
            return;
        }
        let mut pending: Vec<_> = self.pending.drain().collect();
        pending.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (slide_id, components) in pending {
            self.push(&slide_id, &components);
        }
    }

    fn push(&mut self, slide_id: &str, components: &[Component]) -> bool {
        let history = self.slides.entry(slide_id.to_string()).or_default();

        if history
            .current()
            .is_some_and(|entry| entry.components == components)
        {
            return false;
        }

        // New state invalidates the redo branch
        if !history.entries.is_empty() {
            history.entries.truncate(history.cursor + 1);
        }

        history.entries.push_back(HistoryEntry {
            components: components.to_vec(),
            timestamp: Utc::now(),
        });
        history.cursor = history.entries.len() - 1;

        if self.max_entries > 0 && history.entries.len() > self.max_entries {
            history.entries.pop_front();
            history.cursor -= 1;
        }

        true
    }

    /// Step back. Returns the snapshot to restore.
    pub fn undo(&mut self, slide_id: &str) -> Option<Vec<Component>> {
        let history = self.slides.get_mut(slide_id)?;
        if history.cursor == 0 {
            return None;
        }
        history.cursor -= 1;
        history.current().map(|entry| entry.components.clone())
    }

    /// Step forward. Returns the snapshot to restore.
    pub fn redo(&mut self, slide_id: &str) -> Option<Vec<Component>> {
        let history = self.slides.get_mut(slide_id)?;
        if history.cursor + 1 >= history.entries.len() {
            return None;
        }
        history.cursor += 1;
        history.current().map(|entry| entry.components.clone())
    }

    pub fn can_undo(&self, slide_id: &str) -> bool {
        self.slides
            .get(slide_id)
            .is_some_and(|history| history.cursor > 0)
    }

    pub fn can_redo(&self, slide_id: &str) -> bool {
        self.slides
            .get(slide_id)
            .is_some_and(|history| history.cursor + 1 < history.entries.len())
    }

    /// Number of undo steps available
    pub fn undo_levels(&self, slide_id: &str) -> usize {
        self.slides.get(slide_id).map_or(0, |history| history.cursor)
    }

    /// Number of redo steps available
    pub fn redo_levels(&self, slide_id: &str) -> usize {
        self.slides
            .get(slide_id)
            .filter(|history| !history.entries.is_empty())
            .map_or(0, |history| history.entries.len() - history.cursor - 1)
    }

    /// Total entries stored for a slide
    pub fn len(&self, slide_id: &str) -> usize {
        self.slides
            .get(slide_id)
            .map_or(0, |history| history.entries.len())
    }

    pub fn has_history(&self, slide_id: &str) -> bool {
        self.len(slide_id) > 0
    }

    /// Cursor position for a slide, `None` without history
    pub fn cursor(&self, slide_id: &str) -> Option<usize> {
        self.slides
            .get(slide_id)
            .filter(|history| !history.entries.is_empty())
            .map(|history| history.cursor)
    }

    /// When the entry at `index` was recorded
    pub fn entry_timestamp(&self, slide_id: &str, index: usize) -> Option<DateTime<Utc>> {
        self.slides
            .get(slide_id)?
            .entries
            .get(index)
            .map(|entry| entry.timestamp)
    }

    /// Entry at the cursor
    pub fn current(&self, slide_id: &str) -> Option<&HistoryEntry> {
        self.slides.get(slide_id)?.current()
    }

    /// Begin a gesture on a component
    pub fn start_transient(&mut self, component_id: &str, slide_id: &str) {
        let should_record_baseline = !self.has_history(slide_id);
        self.gate
            .begin(component_id, slide_id, should_record_baseline);
    }

    /// End a gesture and record its net effect. `current` is the slide's
    /// components as they stand now. Returns whether an entry was written.
    pub fn end_transient(
        &mut self,
        component_id: &str,
        slide_id: &str,
        current: &[Component],
    ) -> bool {
        let Some(record) = self.gate.end(component_id) else {
            return false;
        };

        let changed = match self.current(slide_id) {
            Some(entry) => {
                entry.components.len() != current.len() || entry.components != current
            }
            None => true,
        };

        if !changed && !record.should_record_baseline {
            tracing::debug!("[History] gesture on {} netted no change", component_id);
            return false;
        }

        if self.gate.is_active() {
            tracing::debug!(
                "[History] parking gesture on {} until the gate releases",
                component_id
            );
            self.pending.insert(slide_id.to_string(), current.to_vec());
            return false;
        }

        self.pending.remove(slide_id);
        let written = self.push(slide_id, current);
        self.flush_pending();
        written
    }

    /// Abandon a gesture without recording anything
    pub fn cancel_transient(&mut self, component_id: &str) {
        self.gate.end(component_id);
        self.flush_pending();
    }

    /// Drop history for one slide, or for every slide plus all gesture state
    pub fn clear(&mut self, slide_id: Option<&str>) {
        match slide_id {
            Some(slide_id) => {
                self.slides.remove(slide_id);
                self.pending.remove(slide_id);
            }
            None => {
                self.slides.clear();
                self.pending.clear();
                self.gate.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_common::{ComponentType, Point, Rect};

    fn shape_at(x: f64) -> Vec<Component> {
        vec![Component::new("a", ComponentType::Shape).with_rect(Rect::new(x, 0.0, 10.0, 10.0))]
    }

    #[test]
    fn test_history_creation() {
        let history = HistoryEngine::new(TransientGate::new());
        assert!(!history.can_undo("s1"));
        assert!(!history.can_redo("s1"));
        assert_eq!(history.len("s1"), 0);
    }

    #[test]
    fn test_record_undo_redo() {
        let mut history = HistoryEngine::new(TransientGate::new());
        assert!(history.record("s1", &shape_at(0.0)));
        assert!(history.record("s1", &shape_at(5.0)));

        assert!(history.can_undo("s1"));
        let restored = history.undo("s1").unwrap();
        assert_eq!(restored[0].position(), Point::new(0.0, 0.0));
        assert!(!history.can_undo("s1"));
        assert!(history.can_redo("s1"));
        assert_eq!(history.cursor("s1"), Some(0));
        assert!(history.entry_timestamp("s1", 1).is_some());

        let restored = history.redo("s1").unwrap();
        assert_eq!(restored[0].position(), Point::new(5.0, 0.0));
        assert!(!history.can_redo("s1"));
    }

    #[test]
    fn test_out_of_bounds_is_noop() {
        let mut history = HistoryEngine::new(TransientGate::new());
        assert!(history.undo("s1").is_none());
        assert!(history.redo("s1").is_none());

        history.record("s1", &shape_at(0.0));
        assert!(history.undo("s1").is_none());
        assert!(history.redo("s1").is_none());
    }

    #[test]
    fn test_identical_snapshot_ignored() {
        let mut history = HistoryEngine::new(TransientGate::new());
        assert!(history.record("s1", &shape_at(0.0)));
        assert!(!history.record("s1", &shape_at(0.0)));
        assert_eq!(history.len("s1"), 1);
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut history = HistoryEngine::new(TransientGate::new());
        history.record("s1", &shape_at(0.0));
        history.record("s1", &shape_at(1.0));
        history.record("s1", &shape_at(2.0));
        history.undo("s1");
        history.undo("s1");
        assert_eq!(history.redo_levels("s1"), 2);

        history.record("s1", &shape_at(9.0));
        assert_eq!(history.redo_levels("s1"), 0);
        assert_eq!(history.len("s1"), 2);
    }

    #[test]
    fn test_max_entries_enforced() {
        let mut history = HistoryEngine::with_max_entries(3, TransientGate::new());
        for i in 0..5 {
            history.record("s1", &shape_at(i as f64));
        }
        assert_eq!(history.len("s1"), 3);
        assert_eq!(history.undo_levels("s1"), 2);

        // Oldest surviving entry is x = 2
        history.undo("s1");
        let oldest = history.undo("s1").unwrap();
        assert_eq!(oldest[0].position().x, 2.0);
    }

    #[test]
    fn test_gate_suppresses_all_slides() {
        let gate = TransientGate::new();
        let mut history = HistoryEngine::new(gate.clone());
        history.start_transient("a", "s1");

        assert!(!history.record("s2", &shape_at(0.0)));
        assert_eq!(history.len("s2"), 0);

        history.cancel_transient("a");
        assert!(history.record("s2", &shape_at(0.0)));
    }

    #[test]
    fn test_gesture_without_prior_history_records_baseline() {
        let mut history = HistoryEngine::new(TransientGate::new());
        history.start_transient("a", "s1");
        assert!(history.end_transient("a", "s1", &shape_at(0.0)));
        assert_eq!(history.len("s1"), 1);
    }

    #[test]
    fn test_noop_gesture_elided() {
        let mut history = HistoryEngine::new(TransientGate::new());
        history.record("s1", &shape_at(0.0));

        history.start_transient("a", "s1");
        assert!(!history.end_transient("a", "s1", &shape_at(0.0)));
        assert_eq!(history.len("s1"), 1);
    }

    #[test]
    fn test_nested_gesture_records_once() {
        let mut history = HistoryEngine::new(TransientGate::new());
        history.record("s1", &shape_at(0.0));

        history.start_transient("a", "s1");
        history.start_transient("a", "s1");
        assert!(!history.end_transient("a", "s1", &shape_at(3.0)));
        assert!(history.end_transient("a", "s1", &shape_at(3.0)));
        assert_eq!(history.len("s1"), 2);
    }

    #[test]
    fn test_overlapping_gestures_on_two_slides_both_record() {
        let mut history = HistoryEngine::new(TransientGate::new());
        history.record("s1", &shape_at(0.0));
        history.record("s2", &shape_at(0.0));

        history.start_transient("a", "s1");
        history.start_transient("b", "s2");

        // s1's gesture ends while s2's still holds the gate
        assert!(!history.end_transient("a", "s1", &shape_at(4.0)));
        assert_eq!(history.len("s1"), 1);

        assert!(history.end_transient("b", "s2", &shape_at(8.0)));
        assert_eq!(history.len("s1"), 2);
        assert_eq!(history.len("s2"), 2);

        let restored = history.undo("s1").unwrap();
        assert_eq!(restored[0].position().x, 0.0);
    }

    #[test]
    fn test_parked_gesture_recorded_after_cancel() {
        let mut history = HistoryEngine::new(TransientGate::new());
        history.record("s1", &shape_at(0.0));

        history.start_transient("a", "s1");
        history.start_transient("b", "s2");
        history.end_transient("a", "s1", &shape_at(6.0));
        history.cancel_transient("b");

        assert_eq!(history.len("s1"), 2);
        assert!(history.can_undo("s1"));
    }

    #[test]
    fn test_clear() {
        let mut history = HistoryEngine::new(TransientGate::new());
        history.record("s1", &shape_at(0.0));
        history.record("s2", &shape_at(0.0));
        history.clear(Some("s1"));
        assert_eq!(history.len("s1"), 0);
        assert_eq!(history.len("s2"), 1);

        history.start_transient("a", "s2");
        history.clear(None);
        assert_eq!(history.len("s2"), 0);
        assert!(!history.gate().is_active());
    }
}
