//! End-to-end test of the call history pipeline over a real SQLite database
//!
//! Exercises the full path: seeded call log → aggregation with contact-id
//! merging → bind-time lookups → background resolution → repair writes back
//! into the store → coalesced refresh → cold restart on reactivation.

use callflow::history_core::{CallRecord, CallType};
use callflow::resolver_core::ResolutionState;
use callflow::session::CallHistorySession;
use callflow::store::{CallLogSource, DeleteFilter, SqliteCallLog, SqliteContactDirectory};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn record(number: &str, timestamp_ms: i64, call_type: CallType) -> CallRecord {
    CallRecord {
        id: 0,
        number: number.to_string(),
        timestamp_ms,
        duration_secs: 60,
        call_type,
        cached_name: None,
        cached_number_type: 0,
        cached_number_label: None,
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    call_log: SqliteCallLog,
    session: CallHistorySession,
}

fn build_fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("callflow.db");

    let call_log = SqliteCallLog::new(&db_path).unwrap();
    let directory = SqliteContactDirectory::new(&db_path).unwrap();

    directory
        .add_contact("Alice", "+6591234567", 2, Some("mobile"))
        .unwrap();

    // Three spellings of Alice's number, newest first, plus an unknown caller
    call_log.log_call(&record("91234567", 4000, CallType::Incoming)).unwrap();
    call_log.log_call(&record("+6591234567", 3000, CallType::Missed)).unwrap();
    call_log.log_call(&record("0891234567", 2000, CallType::Outgoing)).unwrap();
    call_log.log_call(&record("5550001111", 1000, CallType::Incoming)).unwrap();

    let session = CallHistorySession::new(
        Arc::new(call_log.clone()),
        Arc::new(directory),
        None,
        Duration::from_millis(10),
    );

    Fixture {
        _dir: dir,
        call_log,
        session,
    }
}

#[test]
fn test_aggregation_collapses_number_variants() {
    let mut f = build_fixture();
    f.session.activate().unwrap();

    assert_eq!(f.session.len(), 2);

    let alice = f.session.entry(0).unwrap();
    assert_eq!(alice.number, "91234567");
    assert_eq!(alice.occurrence_count, 3);
    // Frozen at the first-seen (newest) record
    assert_eq!(alice.timestamp_ms, 4000);
    assert_eq!(alice.call_type, CallType::Incoming);
    // Ingest-time contact probe attached the directory id
    assert!(alice.contact_id >= 0);

    let unknown = f.session.entry(1).unwrap();
    assert_eq!(unknown.number, "5550001111");
    assert_eq!(unknown.occurrence_count, 1);
}

#[test]
fn test_activation_acknowledges_missed_calls() {
    let mut f = build_fixture();
    assert_eq!(f.call_log.new_missed_count().unwrap(), 1);

    f.session.activate().unwrap();
    assert_eq!(f.call_log.new_missed_count().unwrap(), 0);
}

#[test]
fn test_resolution_enriches_rows_and_repairs_store() {
    let mut f = build_fixture();
    f.session.activate().unwrap();

    // First bind renders degraded and queues the lookups
    let degraded = f.session.bind(0).unwrap();
    assert!(degraded.name.is_none());
    assert!(!degraded.from_directory);
    f.session.bind(1).unwrap();

    f.session.start_resolution_now();
    assert!(f.session.wait_refresh(Duration::from_secs(5)));

    // Alice resolved, the unknown number is negative-cached
    let resolved = f.session.bind(0).unwrap();
    assert_eq!(resolved.name.as_deref(), Some("Alice"));
    assert_eq!(resolved.number_label.as_deref(), Some("mobile"));
    assert!(resolved.from_directory);
    assert!(matches!(
        f.session.resolution("5550001111"),
        ResolutionState::QueriedNoMatch
    ));

    // The repair write landed on every row reaching Alice's number
    let repaired_names: Vec<_> = f
        .call_log
        .recent_calls()
        .unwrap()
        .into_iter()
        .filter(|r| r.cached_name.as_deref() == Some("Alice"))
        .map(|r| r.number)
        .collect();
    assert!(repaired_names.contains(&"91234567".to_string()));
    assert!(repaired_names.contains(&"+6591234567".to_string()));
}

#[test]
fn test_reactivation_resolves_from_scratch() {
    let mut f = build_fixture();
    f.session.activate().unwrap();

    f.session.bind(0).unwrap();
    f.session.start_resolution_now();
    assert!(f.session.wait_refresh(Duration::from_secs(5)));
    assert!(f.session.resolution("91234567").is_resolved());

    f.session.deactivate();
    f.session.activate().unwrap();

    // Cold cache after reactivation; nothing leaked from the old session
    assert!(matches!(
        f.session.resolution("91234567"),
        ResolutionState::NotQueried
    ));
    assert!(!f.session.poll_refresh());
}

#[test]
fn test_delete_by_number_clears_all_variants() {
    let mut f = build_fixture();
    f.session.activate().unwrap();
    assert_eq!(f.session.len(), 2);

    let deleted = f
        .session
        .delete(DeleteFilter::ByNumber("+6591234567".to_string()))
        .unwrap();
    assert_eq!(deleted, 3);

    assert_eq!(f.session.len(), 1);
    assert_eq!(f.session.entry(0).unwrap().number, "5550001111");
}

#[test]
fn test_totals_survive_aggregation() {
    let mut f = build_fixture();
    f.session.activate().unwrap();

    let totals = f.session.call_totals().unwrap();
    // Two incoming and one outgoing at 60 s each; the missed call counts for
    // nothing
    assert_eq!(totals.total_incoming_secs, 120);
    assert_eq!(totals.total_outgoing_secs, 60);
}
