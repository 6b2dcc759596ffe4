//! Workflow graph queries, edge rules, and authoring.

pub mod index;
pub mod service;
pub mod validate;
