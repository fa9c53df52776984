//! # External Collaborators
//!
//! Narrow interfaces to the parts of the application this engine does not own:
//! the committed (last saved) document, the persistence layer, the content
//! generator, and chart widgets. Each trait ships with an in-memory
//! implementation for tests and embedding.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use deckhand_common::Component;

use crate::errors::PersistenceError;

/// Batch of `(slide_id, components)` pairs handed to persistence
pub type FlushBatch = Vec<(String, Vec<Component>)>;

/// Source of last-committed slide content
pub trait CommittedSource: Send + Sync {
    /// Components of a committed slide, or `None` if the slide is unknown
    fn load(&self, slide_id: &str) -> Option<Vec<Arc<Component>>>;
}

/// Durable save of final slide content. Called once per session exit.
pub trait PersistenceSink: Send + Sync {
    fn flush(&self, batch: FlushBatch) -> Result<(), PersistenceError>;
}

/// Whether an external generator is still populating a slide
pub trait GenerationStatus: Send + Sync {
    fn is_generating(&self, slide_id: &str) -> bool;
}

/// Chart widgets keep their own per-component state outside the draft
pub trait ChartTracker: Send {
    fn detach(&mut self, slide_id: &str, component_id: &str);
}

/// In-memory committed document. Also accepts flushes, so a commit round
/// trips back into what the next session loads.
#[derive(Debug, Default)]
pub struct CommittedDeck {
    slides: RwLock<HashMap<String, Vec<Arc<Component>>>>,
    flushes: AtomicUsize,
}

impl CommittedDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style slide insertion
    pub fn with_slide(self, slide_id: impl Into<String>, components: Vec<Component>) -> Self {
        self.set_slide(slide_id, components);
        self
    }

    pub fn set_slide(&self, slide_id: impl Into<String>, components: Vec<Component>) {
        let components = components.into_iter().map(Arc::new).collect();
        self.slides
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(slide_id.into(), components);
    }

    /// Number of flushes received so far
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl CommittedSource for CommittedDeck {
    fn load(&self, slide_id: &str) -> Option<Vec<Arc<Component>>> {
        self.slides
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(slide_id)
            .cloned()
    }
}

impl PersistenceSink for CommittedDeck {
    fn flush(&self, batch: FlushBatch) -> Result<(), PersistenceError> {
        for (slide_id, components) in batch {
            self.set_slide(slide_id, components);
        }
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Set of slides currently being populated by a generator
#[derive(Debug, Default)]
pub struct GenerationFlags {
    slides: RwLock<HashSet<String>>,
}

impl GenerationFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, slide_id: impl Into<String>) {
        self.slides
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(slide_id.into());
    }

    pub fn finish(&self, slide_id: &str) {
        self.slides
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(slide_id);
    }
}

impl GenerationStatus for GenerationFlags {
    fn is_generating(&self, slide_id: &str) -> bool {
        self.slides
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(slide_id)
    }
}

/// Sink that keeps every batch it receives. Can be switched to reject
/// flushes for exercising failure paths.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<FlushBatch>>,
    reject: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rejecting(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<FlushBatch> {
        self.batches.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PersistenceSink for MemorySink {
    fn flush(&self, batch: FlushBatch) -> Result<(), PersistenceError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(PersistenceError::new("sink is rejecting writes"));
        }
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(batch);
        Ok(())
    }
}

/// Chart tracker for hosts without chart widgets
#[derive(Debug, Default)]
pub struct NoChartTracking;

impl ChartTracker for NoChartTracking {
    fn detach(&mut self, _slide_id: &str, _component_id: &str) {}
}
