//! REST API handlers, one module per resource.

pub mod item;
pub mod workflow;
