//! SQLite backend for the laurel platform store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The backend also owns the two
//! operations with atomicity requirements: the rate-limit counter
//! (read-increment-compare in one transaction) and result finalization
//! (conditional UPDATE, compare-and-swap on the finalized flag).

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
