//! The data-access seam for the waypoint graph.
//!
//! `WaypointStore` defines CRUD plus the geospatial queries the REST layer
//! consumes. Implementations return domain values, never raw store records,
//! and use absence rather than an error to represent "not found".

use crate::{BoundingBox, Coordinates, Waypoint, WaypointId};

/// Persistent access to the waypoint collection.
///
/// All proximity predicates use great-circle distance in metres and are
/// answered through a geospatial index over the waypoint locations rather
/// than a full scan. Operations are synchronous; cancellation and timeout
/// policy belong to the caller and the driver configuration.
///
/// Name matching is a case-insensitive substring test; backends may fold
/// case for ASCII only.
///
/// # Examples
/// ```
/// use waygraph_core::test_support::MemoryStore;
/// use waygraph_core::{Coordinates, Waypoint, WaypointStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::default();
/// let cafe = store.save(Waypoint::poi("Cafe", Coordinates::new(19.05, -98.28)?))?;
/// let found = store.find_nearest(Coordinates::new(19.05, -98.28)?, 500.0)?;
/// assert_eq!(found.and_then(|w| w.id), cafe.id);
/// # Ok(())
/// # }
/// ```
pub trait WaypointStore {
    /// Error raised when the storage backend fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch a waypoint by identifier; `None` when absent.
    fn find_by_id(&self, id: WaypointId) -> Result<Option<Waypoint>, Self::Error>;

    /// All waypoints, ordered by identifier.
    fn find_all(&self) -> Result<Vec<Waypoint>, Self::Error>;

    /// Persist `waypoint`, minting an identifier first when it has none.
    ///
    /// A waypoint with an id is fully replaced. Returns the persisted
    /// entity with its id populated and back references derived.
    fn save(&self, waypoint: Waypoint) -> Result<Waypoint, Self::Error>;

    /// Remove a waypoint by identifier; a no-op when absent.
    fn delete_by_id(&self, id: WaypointId) -> Result<(), Self::Error>;

    /// The waypoint of any kind closest to `location` within
    /// `max_distance_m` metres; `None` when nothing qualifies. Equidistant
    /// candidates tie-break in an unspecified order.
    fn find_nearest(
        &self,
        location: Coordinates,
        max_distance_m: f64,
    ) -> Result<Option<Waypoint>, Self::Error>;

    /// Points of interest within `radius_m` metres of `center`. Walkways
    /// are excluded even when geographically closer. Result order is
    /// unspecified.
    fn find_pois_within_circle(
        &self,
        center: Coordinates,
        radius_m: f64,
    ) -> Result<Vec<Waypoint>, Self::Error>;

    /// Points of interest whose name contains `partial_name`,
    /// case-insensitively.
    fn find_pois_by_name_like(&self, partial_name: &str) -> Result<Vec<Waypoint>, Self::Error>;

    /// Names of the points of interest matching both the substring and the
    /// circle-containment predicates.
    fn find_names_within_circle_like(
        &self,
        partial_name: &str,
        center: Coordinates,
        radius_m: f64,
    ) -> Result<Vec<String>, Self::Error>;

    /// Waypoints of any kind inside `bounds`, boundary inclusive.
    fn find_within_bounds(&self, bounds: BoundingBox) -> Result<Vec<Waypoint>, Self::Error>;
}
