//! SQLite backend for the RUAG attendance store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The one-record-per-person-per-day and
//! one-unlock-per-achievement rules are `UNIQUE` constraints in the schema;
//! violations come back as [`ruag_core::store::CreateError::Conflict`].

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
