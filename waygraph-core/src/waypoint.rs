//! The waypoint graph model: nodes and their outgoing paths.
//!
//! Waypoints are points of interest or walkway junctions. Paths are directed
//! edges stored in the forward direction only; the reverse reference is
//! derived in memory after a load and never persisted.

use thiserror::Error;

use crate::Coordinates;

/// Identifier minted for a persisted waypoint.
pub type WaypointId = i64;

/// The two node flavours of the navigation graph.
///
/// The stored form round-trips through [`WaypointKind::as_str`] and
/// [`str::parse`].
///
/// # Examples
/// ```
/// use waygraph_core::WaypointKind;
///
/// assert_eq!(WaypointKind::Poi.as_str(), "POI");
/// assert_eq!("WALKWAY".parse(), Ok(WaypointKind::Walkway));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaypointKind {
    /// A named point of interest.
    Poi,
    /// An unnamed junction on a walkway.
    Walkway,
}

/// Error returned when parsing a [`WaypointKind`] from its stored form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown waypoint kind {value:?}")]
pub struct ParseWaypointKindError {
    /// The unrecognised stored value.
    pub value: String,
}

impl WaypointKind {
    /// The stored string form of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poi => "POI",
            Self::Walkway => "WALKWAY",
        }
    }
}

impl std::fmt::Display for WaypointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WaypointKind {
    type Err = ParseWaypointKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "POI" => Ok(Self::Poi),
            "WALKWAY" => Ok(Self::Walkway),
            other => Err(ParseWaypointKindError {
                value: other.to_owned(),
            }),
        }
    }
}

/// A directed edge from one waypoint to another.
///
/// Only the forward target is persisted (serialised as `toWaypoint`). The
/// back reference is recomputed on every load by
/// [`link_back_references`](crate::lifecycle::link_back_references), so the
/// two directions cannot diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathSegment {
    /// Identifier of the waypoint this edge points at.
    #[cfg_attr(feature = "serde", serde(rename = "toWaypoint"))]
    pub to_waypoint: WaypointId,
    /// Identifier of the owning waypoint, derived in memory after a load.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub from_waypoint: Option<WaypointId>,
}

impl PathSegment {
    /// Construct a forward edge towards `target`.
    pub const fn to(target: WaypointId) -> Self {
        Self {
            to_waypoint: target,
            from_waypoint: None,
        }
    }
}

/// A node in the navigation graph.
///
/// Created with `id` unset; the lifecycle pipeline binds the id at first
/// save and updates reuse it. The name-presence rule (present iff the kind
/// is POI) belongs to the validation layer in front of this crate; the
/// constructors merely make the conventional shapes easy to build.
///
/// # Examples
/// ```
/// use waygraph_core::{Coordinates, PathSegment, Waypoint, WaypointKind};
///
/// # fn main() -> Result<(), waygraph_core::CoordinatesError> {
/// let cafe = Waypoint::poi("Cafe", Coordinates::new(19.054492, -98.283176)?)
///     .with_paths(vec![PathSegment::to(4)]);
/// assert_eq!(cafe.id, None);
/// assert_eq!(cafe.kind, WaypointKind::Poi);
/// assert_eq!(cafe.name.as_deref(), Some("Cafe"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    /// Identifier, absent until the first save assigns one.
    pub id: Option<WaypointId>,
    /// Node flavour.
    pub kind: WaypointKind,
    /// Display name; by convention present only for POIs.
    pub name: Option<String>,
    /// Geographic position.
    pub location: Coordinates,
    /// Outgoing edges, in declaration order.
    pub paths: Vec<PathSegment>,
}

impl Waypoint {
    /// Construct an unsaved point of interest.
    pub fn poi(name: impl Into<String>, location: Coordinates) -> Self {
        Self {
            id: None,
            kind: WaypointKind::Poi,
            name: Some(name.into()),
            location,
            paths: Vec::new(),
        }
    }

    /// Construct an unsaved walkway junction.
    pub const fn walkway(location: Coordinates) -> Self {
        Self {
            id: None,
            kind: WaypointKind::Walkway,
            name: None,
            location,
            paths: Vec::new(),
        }
    }

    /// Replace the outgoing edges, consuming and returning the waypoint.
    #[must_use]
    pub fn with_paths(mut self, paths: Vec<PathSegment>) -> Self {
        self.paths = paths;
        self
    }
}
