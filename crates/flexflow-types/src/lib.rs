//! Shared domain types for FlexFlow.
//!
//! This crate contains the domain types of the approval routing engine:
//! workflow graphs (Workflow, Node, Edge), routed items and their
//! placements, the decision history ledger, global configuration, and the
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod id;
pub mod item;
