//! Object storage abstraction.
//!
//! Payloads referenced by notifications are read through [`ObjectStore`].
//! Implementations live in factsink-infra.

pub mod object_store;
