//! SQLite persistence for the Waygraph engine.
//!
//! Implements the `waygraph-core` seams over a single SQLite database:
//! [`SqliteWaypointStore`] for waypoint CRUD and geospatial queries (backed
//! by an R*-tree virtual table), [`SqliteSequences`] for atomic identifier
//! allocation, and the [`codec`] module for the store's native geospatial
//! encoding.
//!
//! Everything here is synchronous and free of in-process locking; the
//! engine's single-statement atomicity and file locking carry all
//! correctness under concurrency.

#![forbid(unsafe_code)]

pub mod codec;
mod sequence;
mod sqlite;

pub use sequence::{SequenceError, SqliteSequences};
pub use sqlite::{SqliteStoreError, SqliteWaypointStore, StoreOptions};
