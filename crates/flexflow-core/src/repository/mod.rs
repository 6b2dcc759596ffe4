//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (flexflow-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod graph;
pub mod history;
pub mod item;
