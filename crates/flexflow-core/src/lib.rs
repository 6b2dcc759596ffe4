//! Approval routing engine and repository trait definitions for FlexFlow.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, plus the engine that routes items through a workflow
//! graph. It depends only on `flexflow-types` -- never on `flexflow-infra`
//! or any database/IO crate.

pub mod graph;
pub mod repository;
pub mod routing;

#[cfg(test)]
pub(crate) mod test_support;
