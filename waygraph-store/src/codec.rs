//! Conversions between domain geometry and the store's native encoding.
//!
//! SQLite holds each waypoint location twice: as exact `lon`/`lat` row
//! columns (longitude-first, matching the stored document shape) and as a
//! degenerate R*-tree cell used for range queries. This module owns both
//! directions of that mapping plus the circle-to-envelope translation the
//! proximity queries prefilter with.

use thiserror::Error;
use waygraph_core::{BoundingBox, Coordinates, CoordinatesError};

/// Mean earth radius in metres; the same sphere the haversine metric uses.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A location in the store's native axis order: longitude first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorePoint {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

/// An axis-aligned R*-tree range over longitude and latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreCell {
    /// Western edge in degrees.
    pub min_lon: f64,
    /// Eastern edge in degrees.
    pub max_lon: f64,
    /// Southern edge in degrees.
    pub min_lat: f64,
    /// Northern edge in degrees.
    pub max_lat: f64,
}

/// Errors raised when translating between domain and store geometry.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// A stored point did not decode into valid coordinates.
    #[error("stored point is not a valid coordinate pair")]
    InvalidPoint {
        /// The coordinate validation failure.
        #[source]
        source: CoordinatesError,
    },
    /// Decoding a cell back into a bounding box is unsupported by
    /// contract; no query path requires it.
    #[error("decoding a store cell back into a bounding box is unsupported")]
    CellDecodeUnsupported,
}

/// Encode coordinates into the store's point representation.
pub const fn point_to_store(point: Coordinates) -> StorePoint {
    StorePoint {
        lon: point.lng(),
        lat: point.lat(),
    }
}

/// Decode a stored point back into coordinates.
///
/// The round trip through [`point_to_store`] is lossless.
///
/// # Errors
/// Returns [`CodecError::InvalidPoint`] when the stored values are out of
/// range, which indicates a corrupted row.
pub fn point_from_store(point: StorePoint) -> Result<Coordinates, CodecError> {
    Coordinates::new(point.lat, point.lon).map_err(|source| CodecError::InvalidPoint { source })
}

/// Encode an optional location; `None` passes through unchanged.
pub const fn opt_point_to_store(point: Option<Coordinates>) -> Option<StorePoint> {
    match point {
        Some(value) => Some(point_to_store(value)),
        None => None,
    }
}

/// Decode an optional stored point; `None` passes through unchanged.
///
/// # Errors
/// Returns [`CodecError::InvalidPoint`] when a present value is out of
/// range.
pub fn opt_point_from_store(point: Option<StorePoint>) -> Result<Option<Coordinates>, CodecError> {
    point.map(point_from_store).transpose()
}

/// Encode a bounding box as an R*-tree range. One-directional by contract.
pub const fn cell_from_bbox(bounds: BoundingBox) -> StoreCell {
    StoreCell {
        min_lon: bounds.bottom_left().lng(),
        max_lon: bounds.top_right().lng(),
        min_lat: bounds.bottom_left().lat(),
        max_lat: bounds.top_right().lat(),
    }
}

/// Refuse to decode a cell into a bounding box.
///
/// # Errors
/// Always returns [`CodecError::CellDecodeUnsupported`].
pub fn bbox_from_cell(_cell: StoreCell) -> Result<BoundingBox, CodecError> {
    Err(CodecError::CellDecodeUnsupported)
}

/// The R*-tree range covering a circle of `radius_m` metres around
/// `center`.
///
/// The envelope is a conservative prefilter: it always contains the full
/// circle, and callers refine candidates with exact great-circle
/// distances. Latitude is clamped to `[-90, 90]` and longitude to
/// `[-180, 180]`; circles that would cross the antimeridian are not
/// modelled, matching the bounding-box contract.
#[expect(
    clippy::float_arithmetic,
    reason = "degree-envelope arithmetic around the query circle"
)]
pub fn search_cell(center: Coordinates, radius_m: f64) -> StoreCell {
    let lat_delta = (radius_m / EARTH_RADIUS_M).to_degrees();
    let cos_lat = center.lat().to_radians().cos();
    // Near the poles a longitude band degenerates; fall back to the full
    // span rather than divide by ~zero.
    let lon_delta = if cos_lat <= f64::EPSILON {
        360.0
    } else {
        lat_delta / cos_lat
    };
    StoreCell {
        min_lon: (center.lng() - lon_delta).max(-180.0),
        max_lon: (center.lng() + lon_delta).min(180.0),
        min_lat: (center.lat() - lat_delta).max(-90.0),
        max_lat: (center.lat() + lat_delta).min(90.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn coords(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).expect("valid coordinates")
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(19.054492, -98.283176)]
    #[case(-90.0, 180.0)]
    fn point_round_trip_is_lossless(#[case] lat: f64, #[case] lng: f64) {
        let original = coords(lat, lng);
        let stored = point_to_store(original);
        assert_eq!(stored.lon, lng);
        assert_eq!(stored.lat, lat);
        assert_eq!(point_from_store(stored), Ok(original));
    }

    #[rstest]
    fn corrupt_points_fail_to_decode() {
        let stored = StorePoint {
            lon: 0.0,
            lat: 95.0,
        };
        assert!(matches!(
            point_from_store(stored),
            Err(CodecError::InvalidPoint { .. })
        ));
    }

    #[rstest]
    fn none_passes_through_both_directions() {
        assert_eq!(opt_point_to_store(None), None);
        assert_eq!(opt_point_from_store(None), Ok(None));
    }

    #[rstest]
    fn some_passes_through_both_directions() {
        let original = coords(1.0, 2.0);
        let stored = opt_point_to_store(Some(original)).expect("encoded point");
        assert_eq!(opt_point_from_store(Some(stored)), Ok(Some(original)));
    }

    #[rstest]
    fn bbox_encodes_to_its_corner_ranges() {
        let bounds =
            BoundingBox::new(coords(-1.0, -2.0), coords(3.0, 4.0)).expect("valid box");
        let cell = cell_from_bbox(bounds);
        assert_eq!(cell.min_lon, -2.0);
        assert_eq!(cell.max_lon, 4.0);
        assert_eq!(cell.min_lat, -1.0);
        assert_eq!(cell.max_lat, 3.0);
    }

    #[rstest]
    fn cell_decode_always_fails() {
        let cell = StoreCell {
            min_lon: 0.0,
            max_lon: 1.0,
            min_lat: 0.0,
            max_lat: 1.0,
        };
        assert_eq!(bbox_from_cell(cell), Err(CodecError::CellDecodeUnsupported));
    }

    #[rstest]
    fn search_cell_contains_points_at_the_radius() {
        let center = coords(19.054492, -98.283176);
        let cell = search_cell(center, 5_000.0);
        // A point almost exactly 5 km north of the centre.
        let north = coords(19.099492, -98.283176);
        assert!(center.distance_m(north) < 5_050.0);
        assert!(north.lat() <= cell.max_lat && north.lat() >= cell.min_lat);
        assert!(north.lng() <= cell.max_lon && north.lng() >= cell.min_lon);
    }

    #[rstest]
    fn search_cell_clamps_at_the_poles() {
        let cell = search_cell(coords(89.9999, 0.0), 100_000.0);
        assert_eq!(cell.max_lat, 90.0);
        assert_eq!(cell.min_lon, -180.0);
        assert_eq!(cell.max_lon, 180.0);
    }

    #[rstest]
    fn search_cell_clamps_at_the_antimeridian() {
        let cell = search_cell(coords(0.0, 179.99), 10_000.0);
        assert_eq!(cell.max_lon, 180.0);
        assert!(cell.min_lon < 179.99);
    }
}
