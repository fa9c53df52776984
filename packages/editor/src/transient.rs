//! # Transient Gate
//!
//! Tracks continuous gestures (drags, resizes) in progress. While any gesture
//! is active, history writes are suppressed for every slide sharing the gate.
//!
//! The gate is a cheap cloneable handle: the draft store and history engine of
//! one editor share a gate, separate editors get separate gates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Per-component gesture bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientRecord {
    pub slide_id: String,

    /// Slide had no history when the gesture began, so the end state must be
    /// recorded even if nothing changed
    pub should_record_baseline: bool,

    depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TransientGate {
    records: Arc<Mutex<HashMap<String, TransientRecord>>>,
}

impl TransientGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TransientRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open (or re-enter) a gesture on a component
    pub fn begin(&self, component_id: &str, slide_id: &str, should_record_baseline: bool) {
        let mut records = self.lock();
        let record = records
            .entry(component_id.to_string())
            .or_insert_with(|| TransientRecord {
                slide_id: slide_id.to_string(),
                should_record_baseline: false,
                depth: 0,
            });
        record.depth += 1;
        record.should_record_baseline |= should_record_baseline;
    }

    /// Close one level of a gesture. Returns the record once the outermost
    /// level closes; `None` while still nested or if the id is unknown.
    pub fn end(&self, component_id: &str) -> Option<TransientRecord> {
        let mut records = self.lock();
        let record = records.get_mut(component_id)?;
        record.depth = record.depth.saturating_sub(1);
        if record.depth > 0 {
            return None;
        }
        records.remove(component_id)
    }

    pub fn is_active(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn is_tracking(&self, component_id: &str) -> bool {
        self.lock().contains_key(component_id)
    }

    /// Number of components with an open gesture
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Drop every gesture
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop gestures on one slide
    pub fn clear_slide(&self, slide_id: &str) {
        self.lock().retain(|_, record| record.slide_id != slide_id);
    }
}
