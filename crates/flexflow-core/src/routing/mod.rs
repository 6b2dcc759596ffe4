//! Approval routing: item submission, the decision state machine, and the
//! per-item locking that keeps concurrent decisions consistent.

pub mod engine;
pub mod locks;
pub mod machine;
