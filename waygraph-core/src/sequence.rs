//! Named monotonic counters used to mint waypoint identifiers.
//!
//! The store has no native auto-increment, so identifiers come from a
//! sequence record keyed by name. Correctness under concurrent callers is
//! delegated entirely to the backing store's atomic increment-and-fetch;
//! implementations MUST NOT emulate it with a read-then-write.

/// Name of the sequence that mints [`WaypointId`](crate::WaypointId) values.
pub const WAYPOINT_ID_SEQUENCE: &str = "waypoint_id";

/// A named, monotonically non-decreasing counter store.
///
/// Sequences are created implicitly at the implementation's seed on first
/// use; an unknown name is never an error. Storage failures are fatal to
/// the caller; no retry policy exists at this layer.
///
/// # Examples
/// ```
/// use waygraph_core::sequence::{SequenceAllocator, WAYPOINT_ID_SEQUENCE};
/// use waygraph_core::test_support::CounterAllocator;
///
/// let counters = CounterAllocator::default();
/// assert_eq!(counters.current_value(WAYPOINT_ID_SEQUENCE), Ok(0));
/// assert_eq!(counters.next_value(WAYPOINT_ID_SEQUENCE), Ok(1));
/// assert_eq!(counters.next_value(WAYPOINT_ID_SEQUENCE), Ok(2));
/// ```
pub trait SequenceAllocator {
    /// Error raised when the backing store fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current value of the named sequence, seeding it if absent.
    fn current_value(&self, name: &str) -> Result<i64, Self::Error>;

    /// Unconditionally overwrite the stored value, creating the sequence if
    /// it does not exist. Intended for administrative reset and tests.
    fn set_value(&self, name: &str, value: i64) -> Result<(), Self::Error>;

    /// Atomically increment the stored value by one and return the result.
    ///
    /// Under K concurrent callers for one name the returned values are
    /// pairwise distinct and form exactly the contiguous range
    /// `previous + 1 ..= previous + K`.
    fn next_value(&self, name: &str) -> Result<i64, Self::Error>;
}
