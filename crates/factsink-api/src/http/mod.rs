//! SNS HTTP(S) endpoint.
//!
//! Axum router with `POST /sns` and `GET /health`, envelope response format
//! and request tracing.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
