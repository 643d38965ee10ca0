//! SQLite-backed named counters.
//!
//! `next_value` rides a single upsert with a `RETURNING` clause, so the
//! increment-and-fetch is atomic inside the storage engine. A client-side
//! read-then-write would hand two concurrent callers the same value; this
//! implementation cannot.

use rusqlite::Connection;
use thiserror::Error;
use waygraph_core::SequenceAllocator;

/// Errors raised by the SQLite sequence allocator.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// Reading the stored value failed.
    #[error("failed to read sequence {name:?}")]
    Read {
        /// Name of the sequence being read.
        name: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Overwriting the stored value failed.
    #[error("failed to overwrite sequence {name:?}")]
    Write {
        /// Name of the sequence being written.
        name: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The atomic increment-and-fetch failed.
    #[error("failed to increment sequence {name:?}")]
    Increment {
        /// Name of the sequence being incremented.
        name: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// [`SequenceAllocator`] over the `sequences` table of an open store.
///
/// Obtained from
/// [`SqliteWaypointStore::sequences`](crate::SqliteWaypointStore::sequences);
/// sequences absent from the table are seeded at the store's configured
/// seed on first use.
#[derive(Debug)]
pub struct SqliteSequences<'conn> {
    conn: &'conn Connection,
    seed: i64,
}

impl<'conn> SqliteSequences<'conn> {
    pub(crate) const fn new(conn: &'conn Connection, seed: i64) -> Self {
        Self { conn, seed }
    }
}

impl SequenceAllocator for SqliteSequences<'_> {
    type Error = SequenceError;

    fn current_value(&self, name: &str) -> Result<i64, Self::Error> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO sequences (name, value) VALUES (?1, ?2)",
                (name, self.seed),
            )
            .map_err(|source| SequenceError::Read {
                name: name.to_owned(),
                source,
            })?;
        self.conn
            .query_row(
                "SELECT value FROM sequences WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .map_err(|source| SequenceError::Read {
                name: name.to_owned(),
                source,
            })
    }

    fn set_value(&self, name: &str, value: i64) -> Result<(), Self::Error> {
        self.conn
            .execute(
                "INSERT INTO sequences (name, value) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value",
                (name, value),
            )
            .map(|_| ())
            .map_err(|source| SequenceError::Write {
                name: name.to_owned(),
                source,
            })
    }

    fn next_value(&self, name: &str) -> Result<i64, Self::Error> {
        // One statement: seed-or-increment and read back the result. The
        // engine serialises writers, so concurrent callers each observe a
        // distinct post-increment value.
        self.conn
            .query_row(
                "INSERT INTO sequences (name, value) VALUES (?1, ?2 + 1)
                 ON CONFLICT(name) DO UPDATE SET value = value + 1
                 RETURNING value",
                (name, self.seed),
                |row| row.get(0),
            )
            .map_err(|source| SequenceError::Increment {
                name: name.to_owned(),
                source,
            })
    }
}
