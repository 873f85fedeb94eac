//! End-to-end tests for the review workflow: load, filter, review,
//! persist, reload.

use std::io::Write;
use std::sync::Arc;

use indexmap::IndexMap;
use tempfile::{NamedTempFile, TempDir};

use sitevet::{
    neighbors_within, select, MemoryRemote, Predicates, RecordId, RecordTable, RemoteOutcome,
    ReviewSession, SyncEngine, ValidationStatus, DEFAULT_RADIUS_KM, STATUS_COLUMN,
};

/// Helper to create a temporary CSV file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

/// A dataset resembling the real validation table: a couple of close sites,
/// a bad numeric cell, a missing coordinate, and an image URL.
fn create_test_data() -> NamedTempFile {
    let content = "Country,Latitude,Longitude,Circular_Tank_Count,Desgin_Capacity,Url_Image\n\
                   Egypt,30.0,31.0,4,125000,https://example.com/a.tif\n\
                   Egypt,30.03,31.0,unknown,,https://example.com/b.png\n\
                   Jordan,31.95,35.91,2,40000,\n\
                   Morocco,,,-,,\n";
    create_test_file(content)
}

fn load_table(file: &NamedTempFile) -> RecordTable {
    RecordTable::load(file.path()).expect("Load failed")
}

// =============================================================================
// Load and round-trip
// =============================================================================

#[test]
fn test_load_normalizes_bad_cells() {
    let file = create_test_data();
    let table = load_table(&file);

    assert_eq!(table.len(), 4);
    assert!(table.headers().iter().any(|h| h == STATUS_COLUMN));
    // "unknown" tank count became no value
    assert_eq!(table.get(RecordId(1)).unwrap().numeric("Circular_Tank_Count"), None);
    // "-" capacity became no value, and the record has no location
    let morocco = table.get(RecordId(3)).unwrap();
    assert_eq!(morocco.numeric("Desgin_Capacity"), None);
    assert!(morocco.location().is_none());
}

#[test]
fn test_persist_then_load_round_trips() {
    let file = create_test_data();
    let table = load_table(&file);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.csv");
    let mut engine = SyncEngine::local_only(&path);
    engine.persist(&table).unwrap();

    let reloaded = RecordTable::load(&path).unwrap();
    assert_eq!(reloaded.headers(), table.headers());
    assert_eq!(reloaded.len(), table.len());
    for (a, b) in table.records().iter().zip(reloaded.records()) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.fields(), b.fields());
    }
}

// =============================================================================
// Spatial context
// =============================================================================

#[test]
fn test_neighbor_scenario_from_the_field() {
    let file = create_test_data();
    let table = load_table(&file);

    // A at (30.0, 31.0), B at (30.03, 31.0): ~3.3 km apart.
    let at_5km = neighbors_within(&table, RecordId(0), DEFAULT_RADIUS_KM).unwrap();
    assert_eq!(at_5km.len(), 1);
    assert_eq!(at_5km[0].id, RecordId(1));
    assert!(at_5km[0].distance_km > 3.0 && at_5km[0].distance_km < 3.7);

    let at_1km = neighbors_within(&table, RecordId(0), 1.0).unwrap();
    assert!(at_1km.is_empty());
}

#[test]
fn test_unlocated_records_stay_out_of_spatial_ops_but_filter_fine() {
    let file = create_test_data();
    let table = load_table(&file);

    let neighbors = neighbors_within(&table, RecordId(0), 20_000.0).unwrap();
    assert!(neighbors.iter().all(|n| n.id != RecordId(3)));

    // Still filterable by category.
    let selection = select(&table, &Predicates::new().allow("Country", ["Morocco"]), 0, 10);
    assert_eq!(selection.ids(), &[RecordId(3)]);
}

// =============================================================================
// Review workflow
// =============================================================================

#[test]
fn test_full_review_pass() {
    let file = create_test_data();
    let table = load_table(&file);
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("data.csv");
    let remote = Arc::new(MemoryRemote::new());
    let sync = SyncEngine::new(&local, Box::new(remote.clone()));
    let mut session = ReviewSession::new(table, sync);

    session.apply_filters(&Predicates::new().allow("Country", ["Egypt"]), 0, 10);
    let ids = session.selection().ids().to_vec();
    assert_eq!(ids, vec![RecordId(0), RecordId(1)]);

    // Edit the first record, then accept it; reject the second.
    let mut updates: IndexMap<String, String> = session
        .record_view(ids[0])
        .unwrap()
        .record
        .fields()
        .clone();
    updates.insert("Circular_Tank_Count".to_string(), "5".to_string());
    session.begin_edit(ids[0]).unwrap();
    session.submit_edit(ids[0], &updates).unwrap();
    session.accept(ids[0]).unwrap();
    session.reject(ids[1]).unwrap();

    // Decisions are durable locally and remotely.
    let reloaded = RecordTable::load(&local).unwrap();
    assert_eq!(reloaded.get(RecordId(0)).unwrap().status(), ValidationStatus::Accepted);
    assert_eq!(
        reloaded.get(RecordId(0)).unwrap().numeric("Circular_Tank_Count"),
        Some(5.0)
    );
    assert_eq!(reloaded.get(RecordId(1)).unwrap().status(), ValidationStatus::Rejected);
    assert_eq!(remote.content().unwrap(), reloaded.to_csv().unwrap());
}

#[test]
fn test_second_pass_can_filter_out_decided_records() {
    let file = create_test_data();
    let table = load_table(&file);
    let dir = TempDir::new().unwrap();
    let sync = SyncEngine::local_only(dir.path().join("data.csv"));
    let mut session = ReviewSession::new(table, sync);

    session.accept(RecordId(0)).unwrap();
    session.reject(RecordId(1)).unwrap();

    let unreviewed_only = Predicates::new().allow(STATUS_COLUMN, [""]);
    let selection = session.apply_filters(&unreviewed_only, 0, 100);
    assert_eq!(selection.ids(), &[RecordId(2), RecordId(3)]);
}

#[test]
fn test_misconfigured_range_degrades_to_nothing_to_review() {
    let file = create_test_data();
    let table = load_table(&file);
    let dir = TempDir::new().unwrap();
    let sync = SyncEngine::local_only(dir.path().join("data.csv"));
    let mut session = ReviewSession::new(table, sync);

    let selection = session.apply_filters(&Predicates::new(), 5, 3);
    assert!(selection.is_empty());
    assert!(selection.notice().is_some());
}

// =============================================================================
// Concurrent-edit risk
// =============================================================================

#[test]
fn test_conflicting_remote_write_is_detected_and_overwritten() {
    let file = create_test_data();
    let table = load_table(&file);
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("data.csv");
    let remote = Arc::new(MemoryRemote::new());
    let sync = SyncEngine::new(&local, Box::new(remote.clone()));
    let mut session = ReviewSession::new(table, sync);

    let report = session.accept(RecordId(0)).unwrap();
    assert!(matches!(report.remote, RemoteOutcome::Created { .. }));

    // Another session commits in between.
    remote.put_external("Country,Validation_Status\nElsewhere,Accepted\n");

    let report = session.reject(RecordId(1)).unwrap();
    assert!(matches!(report.remote, RemoteOutcome::ConflictOverwritten { .. }));

    // Last-writer-wins: the remote now holds this session's table, and the
    // local write completed first.
    assert!(remote.content().unwrap().contains("Jordan"));
    let reloaded = RecordTable::load(&local).unwrap();
    assert_eq!(reloaded.get(RecordId(1)).unwrap().status(), ValidationStatus::Rejected);
}

#[test]
fn test_remote_outage_keeps_decision_and_recovers() {
    let file = create_test_data();
    let table = load_table(&file);
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("data.csv");
    let remote = Arc::new(MemoryRemote::new());
    remote.set_offline(true);
    let sync = SyncEngine::new(&local, Box::new(remote.clone()));
    let mut session = ReviewSession::new(table, sync);

    let report = session.accept(RecordId(0)).unwrap();
    assert!(report.remote_pending());

    // The decision is already durable locally.
    let reloaded = RecordTable::load(&local).unwrap();
    assert_eq!(reloaded.get(RecordId(0)).unwrap().status(), ValidationStatus::Accepted);
    assert!(remote.content().is_none());

    // Next persist retries the remote leg.
    remote.set_offline(false);
    let report = session.reject(RecordId(1)).unwrap();
    assert!(!report.remote_pending());
    assert!(remote.content().unwrap().contains("Rejected"));
}
