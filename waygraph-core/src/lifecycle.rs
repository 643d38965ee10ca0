//! Explicit insert/load pipelines for waypoint persistence.
//!
//! There are no framework-dispatched callbacks: stores call these steps in
//! a fixed order. The insert pipeline is `assign_id` → encode → persist; the
//! load pipeline is decode → `link_back_references`.

use crate::sequence::{SequenceAllocator, WAYPOINT_ID_SEQUENCE};
use crate::{Waypoint, WaypointId};

/// Bind an identifier to `waypoint` when it has none.
///
/// The id is fetched from the `waypoint_id` sequence strictly before the
/// record is encoded or written, so the store never sees a placeholder. A
/// waypoint that already carries an id keeps it; updates reuse the
/// existing identity.
///
/// # Errors
/// Propagates the allocator's failure; the caller must abort the save with
/// nothing persisted.
///
/// # Examples
/// ```
/// use waygraph_core::lifecycle::assign_id;
/// use waygraph_core::test_support::CounterAllocator;
/// use waygraph_core::{Coordinates, Waypoint};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let counters = CounterAllocator::default();
/// let mut wp = Waypoint::poi("Cafe", Coordinates::new(0.0, 0.0)?);
/// let id = assign_id(&counters, &mut wp)?;
/// assert_eq!(wp.id, Some(id));
/// # Ok(())
/// # }
/// ```
pub fn assign_id<A: SequenceAllocator>(
    allocator: &A,
    waypoint: &mut Waypoint,
) -> Result<WaypointId, A::Error> {
    if let Some(id) = waypoint.id {
        return Ok(id);
    }
    let id = allocator.next_value(WAYPOINT_ID_SEQUENCE)?;
    waypoint.id = Some(id);
    Ok(id)
}

/// Derive the in-memory back reference of every outgoing edge.
///
/// Runs after every materialisation from storage. Only the forward target
/// is ever persisted; recomputing the reverse pointer here guarantees the
/// two directions cannot diverge after partial updates.
pub fn link_back_references(waypoint: &mut Waypoint) {
    for path in &mut waypoint.paths {
        path.from_waypoint = waypoint.id;
    }
}
