//! Core types and trait definitions for the RUAG attendance system.
//!
//! This crate is deliberately free of HTTP, database and runtime
//! dependencies. It holds the pure pieces of the check-in protocol: the
//! rotating kiosk token, the geofence, the on-time policy and the store
//! abstraction every backend implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod achievement;
pub mod error;
pub mod geo;
pub mod note;
pub mod person;
pub mod policy;
pub mod record;
pub mod store;
pub mod token;

pub use error::{Error, Result};
