//! # Deckhand Editor
//!
//! Draft editing engine for slide content.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ CommittedSource: last saved slides          │
//! └─────────────────────────────────────────────┘
//!                     ↓ (lazy, shared slots)
//! ┌─────────────────────────────────────────────┐
//! │ DraftStore: working copy per slide          │
//! │  - Component edits and layout operations    │
//! │  - Selection                                │
//! │  - Dirty tracking and commit                │
//! └─────────────────────────────────────────────┘
//!                     ↓ (snapshots)
//! ┌─────────────────────────────────────────────┐
//! │ HistoryEngine: per-slide undo/redo          │
//! │  - TransientGate coalesces gestures         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Committed data is read-only**: drafts share it until first write
//! 2. **Every edit is reversible**: mutations record before/after snapshots
//! 3. **Gestures are one step**: a drag records its net effect once
//! 4. **Stale ids are harmless**: unknown slides and components are no-ops
//!
//! ## Usage
//!
//! ```rust,ignore
//! use deckhand_editor::{CommittedDeck, DraftStore};
//!
//! let deck = Arc::new(CommittedDeck::new().with_slide("s1", components));
//! let mut store = DraftStore::new(deck.clone());
//!
//! store.update_component("s1", "title", props(json!({ "text": "Q3" })), false);
//! store.undo("s1");
//!
//! // Drag: many updates, one history entry
//! store.start_transient_operation("s1", "logo");
//! for point in drag_path {
//!     store.update_component("s1", "logo", move_to(point), true);
//! }
//! store.end_transient_operation("s1", "logo");
//!
//! store.commit(&*deck)?;
//! ```

mod collaborators;
mod defaults;
mod draft;
mod errors;
mod history;
mod layout;
mod session;
mod slot;
mod transient;

pub use collaborators::{
    ChartTracker, CommittedDeck, CommittedSource, FlushBatch, GenerationFlags, GenerationStatus,
    MemorySink, NoChartTracking, PersistenceSink,
};
pub use defaults::{apply_defaults, defaults_for};
pub use draft::{ComponentUpdate, DraftStore, OperationToken};
pub use errors::{EditError, PersistenceError};
pub use history::{HistoryEngine, HistoryEntry};
pub use slot::{ChangeSource, ComponentSlot};
pub use transient::{TransientGate, TransientRecord};

// Re-export the shared model for convenience
pub use deckhand_common::{Alignment, Axis, Component, ComponentType, Point, Props, Rect};
