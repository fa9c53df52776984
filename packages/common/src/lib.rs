//! # Deckhand Common
//!
//! Shared data model for the slide editing engine: components and their
//! geometry, document snapshots handed to replication, and the workspace
//! configuration file.

pub mod component;
pub mod config;
pub mod error;
pub mod geometry;
pub mod result;
pub mod snapshot;

pub use component::*;
pub use config::*;
pub use error::*;
pub use geometry::*;
pub use result::*;
pub use snapshot::*;
