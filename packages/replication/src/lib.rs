//! # Deckhand Replication
//!
//! Mirrors a deck into a CRDT document for multi-client collaboration.
//!
//! ## Architecture
//!
//! ```text
//! DocumentSnapshot
//!        ↓
//! DeferredInitializer ── settle delay, then batches ──┐
//!        ↓                                            │
//! TaskQueue (high FIFO, low FIFO)                     │ monitor polls
//!        ↓ one transaction per task                   │ progress
//! ReplicaBackend (YrsReplica over yrs::Doc)           │
//!        ↓                                            │
//! InitHandle::wait() → InitReport ←───────────────────┘
//! ```
//!
//! Values written to the replica pass through [`Sanitize`] first, so the
//! document only ever holds null, booleans, numbers, strings, arrays and maps.

mod errors;
mod initializer;
mod queue;
mod replica;
mod sanitize;

pub use errors::ReplicationError;
pub use initializer::{DeferredInitializer, InitHandle, InitProgress, InitReport};
pub use queue::{priority_for, ReplicationTask, TaskPriority, TaskQueue};
pub use replica::{ReplicaBackend, YrsReplica};
pub use sanitize::{sanitize_display, Sanitize};

// Re-export for backend implementors
pub use yrs::Any;
