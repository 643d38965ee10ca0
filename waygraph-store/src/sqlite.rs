//! SQLite-backed waypoint store.
//!
//! Rows live in the `waypoints` table; each location is mirrored into the
//! `waypoints_geo` R*-tree virtual table as a degenerate cell, maintained in
//! the same transaction as the row so the index never diverges. Proximity
//! queries prefilter candidates through an R*-tree range join and refine
//! with exact great-circle distances, because the R*-tree stores 32-bit
//! floats rounded outward: the prefilter is conservative, the refine exact.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use rusqlite::Connection;
use thiserror::Error;
use waygraph_core::lifecycle::{assign_id, link_back_references};
use waygraph_core::{
    BoundingBox, Coordinates, ParseWaypointKindError, PathSegment, Waypoint, WaypointId,
    WaypointKind, WaypointStore,
};

use crate::codec::{self, CodecError, StoreCell, StorePoint};
use crate::sequence::{SequenceError, SqliteSequences};

/// Tuning knobs applied when opening a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long a blocked connection waits on the engine's file lock before
    /// surfacing `SQLITE_BUSY`.
    pub busy_timeout: Duration,
    /// Seed for sequences created implicitly on first use.
    pub sequence_seed: i64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            sequence_seed: 0,
        }
    }
}

/// Errors raised by the SQLite waypoint store.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Location of the database file.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Applying connection pragmas failed.
    #[error("failed to configure SQLite connection")]
    Configure {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the waypoint schema failed.
    #[error("failed to create waypoint schema")]
    CreateSchema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The identifier allocator failed; nothing was persisted.
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    /// Serialising the outgoing edges to JSON failed.
    #[error("failed to serialise paths for waypoint {id}")]
    SerializePaths {
        /// Identifier of the waypoint being persisted.
        id: WaypointId,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Beginning a write transaction failed.
    #[error("failed to begin waypoint write transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Writing a waypoint row failed.
    #[error("failed to persist waypoint {id}")]
    PersistRow {
        /// Identifier of the waypoint being persisted.
        id: WaypointId,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Updating the geospatial index failed.
    #[error("failed to index waypoint {id}")]
    IndexRow {
        /// Identifier of the waypoint being indexed.
        id: WaypointId,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Removing a waypoint failed.
    #[error("failed to delete waypoint {id}")]
    DeleteRow {
        /// Identifier of the waypoint being deleted.
        id: WaypointId,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Committing a write transaction failed.
    #[error("failed to commit waypoint write transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored kind column did not parse.
    #[error("failed to decode kind for waypoint {id}")]
    DecodeKind {
        /// Identifier of the offending row.
        id: WaypointId,
        /// The parse failure.
        #[source]
        source: ParseWaypointKindError,
    },
    /// A stored location did not decode into valid coordinates.
    #[error("failed to decode location for waypoint {id}")]
    DecodeLocation {
        /// Identifier of the offending row.
        id: WaypointId,
        /// The codec failure.
        #[source]
        source: CodecError,
    },
    /// A stored edge list was not valid JSON.
    #[error("failed to decode paths for waypoint {id}")]
    DecodePaths {
        /// Identifier of the offending row.
        id: WaypointId,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Generic SQLite error while reading waypoint rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS waypoints (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    name TEXT,
    lon REAL NOT NULL,
    lat REAL NOT NULL,
    paths TEXT NOT NULL
);
CREATE VIRTUAL TABLE IF NOT EXISTS waypoints_geo USING rtree(
    id, min_lon, max_lon, min_lat, max_lat
);
CREATE TABLE IF NOT EXISTS sequences (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
";

const SELECT_BY_ID: &str = "SELECT id, kind, name, lon, lat, paths FROM waypoints WHERE id = ?1";

const SELECT_ALL: &str = "SELECT id, kind, name, lon, lat, paths FROM waypoints ORDER BY id";

const SELECT_IN_CELL: &str = "SELECT w.id, w.kind, w.name, w.lon, w.lat, w.paths
 FROM waypoints AS w
 JOIN waypoints_geo AS g ON g.id = w.id
 WHERE g.max_lon >= ?1 AND g.min_lon <= ?2
   AND g.max_lat >= ?3 AND g.min_lat <= ?4
 ORDER BY w.id";

const SELECT_POIS_IN_CELL: &str = "SELECT w.id, w.kind, w.name, w.lon, w.lat, w.paths
 FROM waypoints AS w
 JOIN waypoints_geo AS g ON g.id = w.id
 WHERE g.max_lon >= ?1 AND g.min_lon <= ?2
   AND g.max_lat >= ?3 AND g.min_lat <= ?4
   AND w.kind = 'POI'
 ORDER BY w.id";

const SELECT_POIS_BY_NAME: &str = "SELECT id, kind, name, lon, lat, paths
 FROM waypoints
 WHERE kind = 'POI'
   AND name IS NOT NULL
   AND instr(lower(name), lower(?1)) > 0
 ORDER BY id";

const SELECT_POIS_IN_CELL_BY_NAME: &str = "SELECT w.id, w.kind, w.name, w.lon, w.lat, w.paths
 FROM waypoints AS w
 JOIN waypoints_geo AS g ON g.id = w.id
 WHERE g.max_lon >= ?1 AND g.min_lon <= ?2
   AND g.max_lat >= ?3 AND g.min_lat <= ?4
   AND w.kind = 'POI'
   AND w.name IS NOT NULL
   AND instr(lower(w.name), lower(?5)) > 0
 ORDER BY w.id";

/// Read-write waypoint store over a single SQLite database.
///
/// The database holds the waypoint rows, the geospatial index and the
/// `sequences` table, so one file carries everything the persistence core
/// needs. Several store instances, in one process or many, may open the
/// same file; the engine's own locking is the only synchronisation.
///
/// # Examples
/// ```no_run
/// use waygraph_core::{Coordinates, Waypoint, WaypointStore};
/// use waygraph_store::SqliteWaypointStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteWaypointStore::open("waypoints.db")?;
/// let cafe = store.save(Waypoint::poi("Cafe", Coordinates::new(19.05, -98.28)?))?;
/// assert!(cafe.id.is_some());
/// # Ok(())
/// # }
/// ```
pub struct SqliteWaypointStore {
    conn: Connection,
    sequence_seed: i64,
}

impl fmt::Debug for SqliteWaypointStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteWaypointStore")
            .field("sequence_seed", &self.sequence_seed)
            .finish_non_exhaustive()
    }
}

impl SqliteWaypointStore {
    /// Open (creating if necessary) a store at `path` with default options.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialised.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteStoreError> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Open (creating if necessary) a store at `path`.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialised.
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        options: StoreOptions,
    ) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| SqliteStoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("opened waypoint store at {}", path.display());
        Self::initialise(conn, options)
    }

    /// Open a transient in-memory store, useful for tests.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when the database cannot be initialised.
    pub fn open_in_memory_with(options: StoreOptions) -> Result<Self, SqliteStoreError> {
        let conn = Connection::open_in_memory().map_err(|source| SqliteStoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::initialise(conn, options)
    }

    /// Open a transient in-memory store with default options.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when the database cannot be initialised.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        Self::open_in_memory_with(StoreOptions::default())
    }

    fn initialise(conn: Connection, options: StoreOptions) -> Result<Self, SqliteStoreError> {
        if options.busy_timeout.is_zero() {
            warn!("zero busy timeout; concurrent writers will fail immediately");
        }
        conn.busy_timeout(options.busy_timeout)
            .map_err(|source| SqliteStoreError::Configure { source })?;
        // journal_mode reports the resulting mode as a row; in-memory
        // databases stay on "memory" and that is fine.
        conn.pragma_update_and_check(None, "journal_mode", "wal", |_row| Ok(()))
            .map_err(|source| SqliteStoreError::Configure { source })?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|source| SqliteStoreError::Configure { source })?;
        conn.execute_batch(SCHEMA)
            .map_err(|source| SqliteStoreError::CreateSchema { source })?;
        Ok(Self {
            conn,
            sequence_seed: options.sequence_seed,
        })
    }

    /// The sequence allocator sharing this store's connection.
    pub const fn sequences(&self) -> SqliteSequences<'_> {
        SqliteSequences::new(&self.conn, self.sequence_seed)
    }

    fn load_rows<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<Waypoint>, SqliteStoreError> {
        let mut statement = self.conn.prepare(sql)?;
        let mut rows = statement.query(params)?;
        let mut waypoints = Vec::new();
        while let Some(row) = rows.next()? {
            waypoints.push(decode_row(row)?);
        }
        Ok(waypoints)
    }

    fn load_in_cell(
        &self,
        sql: &str,
        cell: StoreCell,
    ) -> Result<Vec<Waypoint>, SqliteStoreError> {
        self.load_rows(
            sql,
            (cell.min_lon, cell.max_lon, cell.min_lat, cell.max_lat),
        )
    }
}

fn decode_row(row: &rusqlite::Row<'_>) -> Result<Waypoint, SqliteStoreError> {
    let id: WaypointId = row.get(0)?;
    let kind_raw: String = row.get(1)?;
    let name: Option<String> = row.get(2)?;
    let lon: f64 = row.get(3)?;
    let lat: f64 = row.get(4)?;
    let paths_json: String = row.get(5)?;

    let kind: WaypointKind = kind_raw
        .parse()
        .map_err(|source| SqliteStoreError::DecodeKind { id, source })?;
    let location = codec::point_from_store(StorePoint { lon, lat })
        .map_err(|source| SqliteStoreError::DecodeLocation { id, source })?;
    let paths: Vec<PathSegment> = serde_json::from_str(&paths_json)
        .map_err(|source| SqliteStoreError::DecodePaths { id, source })?;

    let mut waypoint = Waypoint {
        id: Some(id),
        kind,
        name,
        location,
        paths,
    };
    link_back_references(&mut waypoint);
    Ok(waypoint)
}

impl WaypointStore for SqliteWaypointStore {
    type Error = SqliteStoreError;

    fn find_by_id(&self, id: WaypointId) -> Result<Option<Waypoint>, Self::Error> {
        Ok(self.load_rows(SELECT_BY_ID, [id])?.pop())
    }

    fn find_all(&self) -> Result<Vec<Waypoint>, Self::Error> {
        self.load_rows(SELECT_ALL, [])
    }

    fn save(&self, mut waypoint: Waypoint) -> Result<Waypoint, Self::Error> {
        // The id is bound before anything reaches the store; an allocator
        // failure aborts the save with nothing persisted.
        let id = assign_id(&self.sequences(), &mut waypoint)?;
        let point = codec::point_to_store(waypoint.location);
        let paths_json = serde_json::to_string(&waypoint.paths)
            .map_err(|source| SqliteStoreError::SerializePaths { id, source })?;

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|source| SqliteStoreError::BeginTransaction { source })?;
        tx.execute(
            "INSERT OR REPLACE INTO waypoints (id, kind, name, lon, lat, paths)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                id,
                waypoint.kind.as_str(),
                waypoint.name.as_deref(),
                point.lon,
                point.lat,
                paths_json.as_str(),
            ),
        )
        .map_err(|source| SqliteStoreError::PersistRow { id, source })?;
        tx.execute("DELETE FROM waypoints_geo WHERE id = ?1", [id])
            .map_err(|source| SqliteStoreError::IndexRow { id, source })?;
        tx.execute(
            "INSERT INTO waypoints_geo (id, min_lon, max_lon, min_lat, max_lat)
             VALUES (?1, ?2, ?2, ?3, ?3)",
            (id, point.lon, point.lat),
        )
        .map_err(|source| SqliteStoreError::IndexRow { id, source })?;
        tx.commit()
            .map_err(|source| SqliteStoreError::Commit { source })?;

        debug!("persisted waypoint {id}");
        link_back_references(&mut waypoint);
        Ok(waypoint)
    }

    fn delete_by_id(&self, id: WaypointId) -> Result<(), Self::Error> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|source| SqliteStoreError::BeginTransaction { source })?;
        let removed = tx
            .execute("DELETE FROM waypoints WHERE id = ?1", [id])
            .map_err(|source| SqliteStoreError::DeleteRow { id, source })?;
        tx.execute("DELETE FROM waypoints_geo WHERE id = ?1", [id])
            .map_err(|source| SqliteStoreError::DeleteRow { id, source })?;
        tx.commit()
            .map_err(|source| SqliteStoreError::Commit { source })?;
        if removed > 0 {
            debug!("deleted waypoint {id}");
        }
        Ok(())
    }

    fn find_nearest(
        &self,
        location: Coordinates,
        max_distance_m: f64,
    ) -> Result<Option<Waypoint>, Self::Error> {
        let cell = codec::search_cell(location, max_distance_m);
        let candidates = self.load_in_cell(SELECT_IN_CELL, cell)?;
        Ok(candidates
            .into_iter()
            .map(|w| (w.location.distance_m(location), w))
            .filter(|(distance, _)| *distance <= max_distance_m)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, waypoint)| waypoint))
    }

    fn find_pois_within_circle(
        &self,
        center: Coordinates,
        radius_m: f64,
    ) -> Result<Vec<Waypoint>, Self::Error> {
        let cell = codec::search_cell(center, radius_m);
        let candidates = self.load_in_cell(SELECT_POIS_IN_CELL, cell)?;
        Ok(candidates
            .into_iter()
            .filter(|w| w.location.distance_m(center) <= radius_m)
            .collect())
    }

    fn find_pois_by_name_like(&self, partial_name: &str) -> Result<Vec<Waypoint>, Self::Error> {
        self.load_rows(SELECT_POIS_BY_NAME, [partial_name])
    }

    fn find_names_within_circle_like(
        &self,
        partial_name: &str,
        center: Coordinates,
        radius_m: f64,
    ) -> Result<Vec<String>, Self::Error> {
        let cell = codec::search_cell(center, radius_m);
        let candidates = self.load_rows(
            SELECT_POIS_IN_CELL_BY_NAME,
            (
                cell.min_lon,
                cell.max_lon,
                cell.min_lat,
                cell.max_lat,
                partial_name,
            ),
        )?;
        Ok(candidates
            .into_iter()
            .filter(|w| w.location.distance_m(center) <= radius_m)
            .filter_map(|w| w.name)
            .collect())
    }

    fn find_within_bounds(&self, bounds: BoundingBox) -> Result<Vec<Waypoint>, Self::Error> {
        let cell = codec::cell_from_bbox(bounds);
        let candidates = self.load_in_cell(SELECT_IN_CELL, cell)?;
        Ok(candidates
            .into_iter()
            .filter(|w| bounds.contains(w.location))
            .collect())
    }
}
