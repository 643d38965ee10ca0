//! Geographic primitives shared by the waypoint model and the stores.
//!
//! Coordinates are WGS84 degrees. Constructors validate ranges and return
//! `Result` to surface invalid input early; distances are great-circle
//! metres.

use geo::{Distance, Haversine, Point};
use thiserror::Error;

/// A latitude/longitude pair in WGS84 degrees.
///
/// Latitude is constrained to `[-90, 90]` and longitude to `[-180, 180]`.
/// Non-finite values are rejected by the constructor.
///
/// # Examples
/// ```
/// use waygraph_core::Coordinates;
///
/// # fn main() -> Result<(), waygraph_core::CoordinatesError> {
/// let cafe = Coordinates::new(19.054492, -98.283176)?;
/// assert_eq!(cafe.lat(), 19.054492);
/// assert_eq!(cafe.lng(), -98.283176);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

/// Errors returned by [`Coordinates::new`].
#[derive(Debug, Error, PartialEq)]
pub enum CoordinatesError {
    /// Latitude was outside `[-90, 90]` or not finite.
    #[error("latitude {value} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// The rejected latitude in degrees.
        value: f64,
    },
    /// Longitude was outside `[-180, 180]` or not finite.
    #[error("longitude {value} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// The rejected longitude in degrees.
        value: f64,
    },
}

impl Coordinates {
    /// Validate and construct a coordinate pair.
    ///
    /// # Errors
    /// Returns [`CoordinatesError`] when either component is out of range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinatesError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinatesError::LatitudeOutOfRange { value: lat });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinatesError::LongitudeOutOfRange { value: lng });
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    pub const fn lat(self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub const fn lng(self) -> f64 {
        self.lng
    }

    /// Great-circle distance to `other` in metres.
    ///
    /// Uses the haversine formula over a spherical earth, the metric all
    /// proximity queries share.
    ///
    /// # Examples
    /// ```
    /// use waygraph_core::Coordinates;
    ///
    /// # fn main() -> Result<(), waygraph_core::CoordinatesError> {
    /// let greenwich = Coordinates::new(51.4779, -0.0015)?;
    /// let paris = Coordinates::new(48.8566, 2.3522)?;
    /// let d = greenwich.distance_m(paris);
    /// assert!((330_000.0..360_000.0).contains(&d));
    /// # Ok(())
    /// # }
    /// ```
    pub fn distance_m(self, other: Self) -> f64 {
        Haversine.distance(
            Point::new(self.lng, self.lat),
            Point::new(other.lng, other.lat),
        )
    }
}

/// An axis-aligned latitude/longitude rectangle used as a query shape.
///
/// The corners are ordered: the bottom-left corner is south-west of the
/// top-right corner on both axes. Containment includes boundary points.
///
/// Boxes that would cross the antimeridian are not modelled; callers MUST
/// split such areas into two boxes and query each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    bottom_left: Coordinates,
    top_right: Coordinates,
}

/// Errors returned by [`BoundingBox::new`].
#[derive(Debug, Error, PartialEq)]
pub enum BoundingBoxError {
    /// The bottom-left corner was north of the top-right corner.
    #[error("bottom-left latitude {bottom} exceeds top-right latitude {top}")]
    LatitudeInverted {
        /// Latitude of the bottom-left corner.
        bottom: f64,
        /// Latitude of the top-right corner.
        top: f64,
    },
    /// The bottom-left corner was east of the top-right corner.
    #[error("bottom-left longitude {bottom} exceeds top-right longitude {top}")]
    LongitudeInverted {
        /// Longitude of the bottom-left corner.
        bottom: f64,
        /// Longitude of the top-right corner.
        top: f64,
    },
}

impl BoundingBox {
    /// Validate and construct a bounding box from its corners.
    ///
    /// # Errors
    /// Returns [`BoundingBoxError`] when the corners are inverted on either
    /// axis.
    ///
    /// # Examples
    /// ```
    /// use waygraph_core::{BoundingBox, Coordinates};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let sw = Coordinates::new(-1.0, -1.0)?;
    /// let ne = Coordinates::new(1.0, 1.0)?;
    /// let bbox = BoundingBox::new(sw, ne)?;
    /// assert!(bbox.contains(Coordinates::new(0.0, 0.0)?));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(bottom_left: Coordinates, top_right: Coordinates) -> Result<Self, BoundingBoxError> {
        if bottom_left.lat() > top_right.lat() {
            return Err(BoundingBoxError::LatitudeInverted {
                bottom: bottom_left.lat(),
                top: top_right.lat(),
            });
        }
        if bottom_left.lng() > top_right.lng() {
            return Err(BoundingBoxError::LongitudeInverted {
                bottom: bottom_left.lng(),
                top: top_right.lng(),
            });
        }
        Ok(Self {
            bottom_left,
            top_right,
        })
    }

    /// The south-west corner.
    pub const fn bottom_left(self) -> Coordinates {
        self.bottom_left
    }

    /// The north-east corner.
    pub const fn top_right(self) -> Coordinates {
        self.top_right
    }

    /// Whether `point` lies inside the box. Boundary points are inside.
    pub fn contains(self, point: Coordinates) -> bool {
        (self.bottom_left.lat()..=self.top_right.lat()).contains(&point.lat())
            && (self.bottom_left.lng()..=self.top_right.lng()).contains(&point.lng())
    }
}
