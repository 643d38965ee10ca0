//! Behaviour of the SQLite waypoint store against the persistence
//! contract: round trips, full replacement, geospatial queries and derived
//! back references.

use rstest::{fixture, rstest};
use waygraph_core::{
    BoundingBox, Coordinates, PathSegment, Waypoint, WaypointKind, WaypointStore,
};
use waygraph_store::SqliteWaypointStore;

fn coords(lat: f64, lng: f64) -> Coordinates {
    Coordinates::new(lat, lng).expect("valid coordinates")
}

#[fixture]
fn store() -> SqliteWaypointStore {
    SqliteWaypointStore::open_in_memory().expect("open in-memory store")
}

/// Two named POIs and one walkway junction around Cholula.
#[fixture]
fn populated(store: SqliteWaypointStore) -> SqliteWaypointStore {
    store
        .save(Waypoint::poi("Cafe Aroma", coords(19.054492, -98.283176)))
        .expect("save cafe");
    store
        .save(Waypoint::poi("Museo Regional", coords(19.0560, -98.2850)))
        .expect("save museum");
    store
        .save(Waypoint::walkway(coords(19.0545, -98.2832)))
        .expect("save junction");
    store
}

#[rstest]
fn round_trips_a_waypoint(store: SqliteWaypointStore) {
    let saved = store
        .save(
            Waypoint::poi("Cafe", coords(19.054492, -98.283176))
                .with_paths(vec![PathSegment::to(4), PathSegment::to(7)]),
        )
        .expect("save waypoint");
    let id = saved.id.expect("assigned id");

    let loaded = store.find_by_id(id).expect("query").expect("present");
    assert_eq!(loaded.kind, WaypointKind::Poi);
    assert_eq!(loaded.name.as_deref(), Some("Cafe"));
    assert_eq!(loaded.location, coords(19.054492, -98.283176));
    let targets: Vec<_> = loaded.paths.iter().map(|p| p.to_waypoint).collect();
    assert_eq!(targets, vec![4, 7]);
}

#[rstest]
fn assigns_ids_from_the_waypoint_sequence(store: SqliteWaypointStore) {
    let first = store
        .save(Waypoint::poi("a", coords(0.0, 0.0)))
        .expect("save first");
    let second = store
        .save(Waypoint::walkway(coords(1.0, 1.0)))
        .expect("save second");

    assert_eq!(first.id, Some(1));
    assert_eq!(second.id, Some(2));
}

#[rstest]
fn replaces_the_whole_record_on_update(store: SqliteWaypointStore) {
    let saved = store
        .save(Waypoint::poi("Old Name", coords(1.0, 1.0)).with_paths(vec![PathSegment::to(9)]))
        .expect("save original");
    let id = saved.id.expect("assigned id");

    let mut replacement = Waypoint::poi("New Name", coords(2.0, 2.0));
    replacement.id = Some(id);
    store.save(replacement).expect("replace");

    let loaded = store.find_by_id(id).expect("query").expect("present");
    assert_eq!(loaded.name.as_deref(), Some("New Name"));
    assert_eq!(loaded.location, coords(2.0, 2.0));
    assert!(loaded.paths.is_empty(), "stale paths must not survive");
    assert_eq!(store.find_all().expect("list").len(), 1);
}

#[rstest]
fn derives_back_references_on_load(store: SqliteWaypointStore) {
    let saved = store
        .save(
            Waypoint::walkway(coords(0.0, 0.0))
                .with_paths(vec![PathSegment::to(11), PathSegment::to(12)]),
        )
        .expect("save junction");
    let id = saved.id.expect("assigned id");

    let loaded = store.find_by_id(id).expect("query").expect("present");
    assert_eq!(loaded.paths.len(), 2);
    assert!(loaded.paths.iter().all(|p| p.from_waypoint == Some(id)));
}

#[rstest]
fn stored_paths_carry_no_back_reference() {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    let db_path = dir.path().join("waypoints.db");
    let store = SqliteWaypointStore::open(&db_path).expect("open store");
    let id = store
        .save(Waypoint::walkway(coords(0.0, 0.0)).with_paths(vec![PathSegment::to(5)]))
        .expect("save junction")
        .id
        .expect("assigned id");
    drop(store);

    let conn = rusqlite::Connection::open(&db_path).expect("reopen database");
    let paths_json: String = conn
        .query_row("SELECT paths FROM waypoints WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .expect("read stored paths");
    assert_eq!(paths_json, r#"[{"toWaypoint":5}]"#);
}

#[rstest]
fn find_by_id_returns_none_for_unknown(store: SqliteWaypointStore) {
    assert!(store.find_by_id(40_400).expect("query").is_none());
}

#[rstest]
fn delete_is_idempotent(store: SqliteWaypointStore) {
    let id = store
        .save(Waypoint::poi("a", coords(0.0, 0.0)))
        .expect("save")
        .id
        .expect("assigned id");

    store.delete_by_id(id).expect("delete");
    store.delete_by_id(id).expect("delete again is a no-op");
    assert!(store.find_by_id(id).expect("query").is_none());
}

#[rstest]
fn find_all_lists_waypoints_in_id_order(populated: SqliteWaypointStore) {
    let all = populated.find_all().expect("list");
    let ids: Vec<_> = all.iter().filter_map(|w| w.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[rstest]
fn nearest_returns_none_when_everything_is_too_far(populated: SqliteWaypointStore) {
    let antipode = coords(-19.05, 81.72);
    assert!(populated
        .find_nearest(antipode, 10_000.0)
        .expect("query")
        .is_none());
}

#[rstest]
fn nearest_prefers_the_closest_candidate(populated: SqliteWaypointStore) {
    let near_cafe = coords(19.0544, -98.2831);
    let found = populated
        .find_nearest(near_cafe, 5_000.0)
        .expect("query")
        .expect("candidate");
    assert_eq!(found.name.as_deref(), Some("Cafe Aroma"));
}

#[rstest]
fn nearest_considers_walkways_too(populated: SqliteWaypointStore) {
    let on_junction = coords(19.0545, -98.2832);
    let found = populated
        .find_nearest(on_junction, 5_000.0)
        .expect("query")
        .expect("candidate");
    assert_eq!(found.kind, WaypointKind::Walkway);
}

#[rstest]
fn nearest_respects_the_distance_cap(populated: SqliteWaypointStore) {
    // About 240 m from the cafe; a 100 m cap excludes everything.
    let nearby = coords(19.0566, -98.2832);
    assert!(populated
        .find_nearest(nearby, 100.0)
        .expect("query")
        .is_none());
}

#[rstest]
fn circle_query_excludes_walkways(populated: SqliteWaypointStore) {
    let center = coords(19.0545, -98.2832);
    let pois = populated
        .find_pois_within_circle(center, 5_000.0)
        .expect("query");
    assert_eq!(pois.len(), 2);
    assert!(pois.iter().all(|w| w.kind == WaypointKind::Poi));
}

#[rstest]
fn circle_query_excludes_distant_pois(populated: SqliteWaypointStore) {
    assert!(populated
        .find_pois_within_circle(coords(0.0, 0.0), 1.0)
        .expect("query")
        .is_empty());
}

#[rstest]
#[case("cafe")]
#[case("CAFE")]
#[case("fe Ar")]
fn name_search_is_case_insensitive_substring(
    populated: SqliteWaypointStore,
    #[case] needle: &str,
) {
    let matches = populated.find_pois_by_name_like(needle).expect("query");
    assert_eq!(matches.len(), 1);
    assert_eq!(
        matches.first().and_then(|w| w.name.as_deref()),
        Some("Cafe Aroma")
    );
}

#[rstest]
fn name_search_never_matches_walkways(populated: SqliteWaypointStore) {
    // Every stored name contains an "a"; the junction has none at all.
    let matches = populated.find_pois_by_name_like("a").expect("query");
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|w| w.kind == WaypointKind::Poi));
}

#[rstest]
fn combined_search_requires_both_predicates(populated: SqliteWaypointStore) {
    let center = coords(19.0545, -98.2832);

    let names = populated
        .find_names_within_circle_like("museo", center, 5_000.0)
        .expect("query");
    assert_eq!(names, vec![String::from("Museo Regional")]);

    let elsewhere = populated
        .find_names_within_circle_like("museo", coords(0.0, 0.0), 1.0)
        .expect("query");
    assert!(elsewhere.is_empty());
}

#[rstest]
fn bounds_query_is_inclusive_and_kind_agnostic(populated: SqliteWaypointStore) {
    let bounds = BoundingBox::new(coords(19.05, -98.29), coords(19.06, -98.28)).expect("valid box");
    let inside = populated.find_within_bounds(bounds).expect("query");
    assert_eq!(inside.len(), 3);

    let empty = BoundingBox::new(coords(0.0, 0.0), coords(1.0, 1.0)).expect("valid box");
    assert!(populated.find_within_bounds(empty).expect("query").is_empty());
}

#[rstest]
fn persists_across_reopen() {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    let db_path = dir.path().join("waypoints.db");

    let id = {
        let store = SqliteWaypointStore::open(&db_path).expect("open store");
        store
            .save(Waypoint::poi("Cafe", coords(19.054492, -98.283176)))
            .expect("save cafe")
            .id
            .expect("assigned id")
    };

    let reopened = SqliteWaypointStore::open(&db_path).expect("reopen store");
    let loaded = reopened.find_by_id(id).expect("query").expect("present");
    assert_eq!(loaded.name.as_deref(), Some("Cafe"));
}
