//! HTTP/REST API layer for FlexFlow.
//!
//! Axum-based REST API at `/api/v1/` with the envelope response format and
//! CORS support. The acting user is taken from the `X-User-Id` header.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
