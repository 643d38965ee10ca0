//! Core domain types and storage seams for the Waygraph engine.
//!
//! The crate models a navigation graph of waypoints (points of interest
//! and walkway junctions joined by directed paths) together with the seams
//! a persistence layer implements: the [`WaypointStore`] query surface, the
//! [`SequenceAllocator`] that mints identifiers, and the explicit
//! [`lifecycle`] pipeline that binds ids before insert and derives edge
//! back references after load.
//!
//! Implementations live elsewhere (`waygraph-store` provides the SQLite
//! one); [`test_support`] ships in-memory doubles for tests and doctests.

#![forbid(unsafe_code)]

mod coords;
pub mod lifecycle;
pub mod sequence;
mod store;
pub mod test_support;
mod waypoint;

pub use coords::{BoundingBox, BoundingBoxError, Coordinates, CoordinatesError};
pub use sequence::{SequenceAllocator, WAYPOINT_ID_SEQUENCE};
pub use store::WaypointStore;
pub use waypoint::{ParseWaypointKindError, PathSegment, Waypoint, WaypointId, WaypointKind};
