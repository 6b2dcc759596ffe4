//! Infrastructure layer for FlexFlow.
//!
//! Contains implementations of the repository traits defined in `flexflow-core`
//! backed by SQLite, plus the config loader and data directory resolution
//! shared by the CLI and the REST server.

pub mod config;
pub mod data_dir;
pub mod sqlite;
