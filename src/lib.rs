//! Facade crate for the Waygraph persistence engine.
//!
//! Re-exports the core domain types, the storage seams and the explicit
//! lifecycle pipeline, plus the SQLite store implementation behind the
//! `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use waygraph_core::{
    BoundingBox, BoundingBoxError, Coordinates, CoordinatesError, ParseWaypointKindError,
    PathSegment, SequenceAllocator, WAYPOINT_ID_SEQUENCE, Waypoint, WaypointId, WaypointKind,
    WaypointStore, lifecycle, test_support,
};

#[cfg(feature = "store-sqlite")]
pub use waygraph_store::{
    SequenceError, SqliteSequences, SqliteStoreError, SqliteWaypointStore, StoreOptions, codec,
};
