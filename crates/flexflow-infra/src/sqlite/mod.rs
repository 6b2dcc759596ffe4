//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod graph;
pub mod history;
pub mod item;
pub mod pool;

mod convert;
