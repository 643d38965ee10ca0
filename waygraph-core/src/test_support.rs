//! Test-only, in-memory implementations of the storage seams, used by unit
//! tests, integration tests and doctests.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Mutex, PoisonError};

use crate::lifecycle::{assign_id, link_back_references};
use crate::sequence::SequenceAllocator;
use crate::{BoundingBox, Coordinates, Waypoint, WaypointId, WaypointKind, WaypointStore};

/// In-memory [`SequenceAllocator`] backed by a mutex-guarded map.
///
/// Sequences are seeded lazily at the configured seed (0 by default).
#[derive(Debug, Default)]
pub struct CounterAllocator {
    seed: i64,
    values: Mutex<HashMap<String, i64>>,
}

impl CounterAllocator {
    /// Create an allocator whose sequences start at `seed`.
    pub fn with_seed(seed: i64) -> Self {
        Self {
            seed,
            values: Mutex::new(HashMap::new()),
        }
    }

    fn entry(&self, name: &str) -> i64 {
        *self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_owned())
            .or_insert(self.seed)
    }
}

impl SequenceAllocator for CounterAllocator {
    type Error = Infallible;

    fn current_value(&self, name: &str) -> Result<i64, Self::Error> {
        Ok(self.entry(name))
    }

    fn set_value(&self, name: &str, value: i64) -> Result<(), Self::Error> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned(), value);
        Ok(())
    }

    fn next_value(&self, name: &str) -> Result<i64, Self::Error> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let value = values.entry(name.to_owned()).or_insert(self.seed);
        *value += 1;
        Ok(*value)
    }
}

/// In-memory [`WaypointStore`] performing linear scans.
///
/// Intended only for small test datasets; it runs the same lifecycle
/// pipeline as the persistent stores so contract tests exercise identical
/// behaviour.
#[derive(Debug, Default)]
pub struct MemoryStore {
    allocator: CounterAllocator,
    waypoints: Mutex<Vec<Waypoint>>,
}

impl MemoryStore {
    fn rows(&self) -> std::sync::MutexGuard<'_, Vec<Waypoint>> {
        self.waypoints.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn hydrated(mut waypoint: Waypoint) -> Waypoint {
    link_back_references(&mut waypoint);
    waypoint
}

fn by_id(waypoints: Vec<Waypoint>) -> Vec<Waypoint> {
    let mut sorted = waypoints;
    sorted.sort_unstable_by_key(|w| w.id);
    sorted
}

impl WaypointStore for MemoryStore {
    type Error = Infallible;

    fn find_by_id(&self, id: WaypointId) -> Result<Option<Waypoint>, Self::Error> {
        Ok(self
            .rows()
            .iter()
            .find(|w| w.id == Some(id))
            .cloned()
            .map(hydrated))
    }

    fn find_all(&self) -> Result<Vec<Waypoint>, Self::Error> {
        Ok(by_id(self.rows().iter().cloned().map(hydrated).collect()))
    }

    fn save(&self, mut waypoint: Waypoint) -> Result<Waypoint, Self::Error> {
        let id = assign_id(&self.allocator, &mut waypoint)
            .unwrap_or_else(|never| match never {});
        let mut rows = self.rows();
        if let Some(slot) = rows.iter_mut().find(|w| w.id == Some(id)) {
            *slot = waypoint.clone();
        } else {
            rows.push(waypoint.clone());
        }
        drop(rows);
        Ok(hydrated(waypoint))
    }

    fn delete_by_id(&self, id: WaypointId) -> Result<(), Self::Error> {
        self.rows().retain(|w| w.id != Some(id));
        Ok(())
    }

    fn find_nearest(
        &self,
        location: Coordinates,
        max_distance_m: f64,
    ) -> Result<Option<Waypoint>, Self::Error> {
        Ok(self
            .rows()
            .iter()
            .map(|w| (w.location.distance_m(location), w.clone()))
            .filter(|(distance, _)| *distance <= max_distance_m)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, waypoint)| hydrated(waypoint)))
    }

    fn find_pois_within_circle(
        &self,
        center: Coordinates,
        radius_m: f64,
    ) -> Result<Vec<Waypoint>, Self::Error> {
        Ok(by_id(
            self.rows()
                .iter()
                .filter(|w| w.kind == WaypointKind::Poi)
                .filter(|w| w.location.distance_m(center) <= radius_m)
                .cloned()
                .map(hydrated)
                .collect(),
        ))
    }

    fn find_pois_by_name_like(&self, partial_name: &str) -> Result<Vec<Waypoint>, Self::Error> {
        let needle = partial_name.to_lowercase();
        Ok(by_id(
            self.rows()
                .iter()
                .filter(|w| w.kind == WaypointKind::Poi)
                .filter(|w| {
                    w.name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
                })
                .cloned()
                .map(hydrated)
                .collect(),
        ))
    }

    fn find_names_within_circle_like(
        &self,
        partial_name: &str,
        center: Coordinates,
        radius_m: f64,
    ) -> Result<Vec<String>, Self::Error> {
        let matches = self.find_pois_by_name_like(partial_name)?;
        Ok(matches
            .into_iter()
            .filter(|w| w.location.distance_m(center) <= radius_m)
            .filter_map(|w| w.name)
            .collect())
    }

    fn find_within_bounds(&self, bounds: BoundingBox) -> Result<Vec<Waypoint>, Self::Error> {
        Ok(by_id(
            self.rows()
                .iter()
                .filter(|w| bounds.contains(w.location))
                .cloned()
                .map(hydrated)
                .collect(),
        ))
    }
}
