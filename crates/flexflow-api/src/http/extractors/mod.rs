//! Request extractors.

pub mod user;
