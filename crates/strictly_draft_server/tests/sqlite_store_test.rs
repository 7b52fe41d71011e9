//! Tests for the SQLite draft store.

use std::sync::Arc;

use chrono::Utc;
use tempfile::NamedTempFile;

use strictly_draft::{
    Card, Catalog, Draft, DraftId, DraftStatus, PickEvent, PlayerId, RulesConfig, Session,
    SessionStatus, UnitClass,
};
use strictly_draft_server::{
    AppendOutcome, DraftService, DraftStore, PickOutcome, SqliteStore, StoreErrorKind,
    UpdateOutcome,
};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready store.
fn setup_test_db() -> (NamedTempFile, SqliteStore) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let store = SqliteStore::new(db_path).expect("Failed to create store");
    store.run_migrations().expect("Migrations failed");
    (db_file, store)
}

fn catalog() -> Catalog {
    Catalog::from_cards([
        Card::new("zeus", "Zeus", 6).with_class(UnitClass::God),
        Card::new("odin", "Odin", 5).with_class(UnitClass::God),
        Card::new("hydra", "Hydra", 4).with_class(UnitClass::Monster),
        Card::new("archer", "Archer", 2).with_class(UnitClass::Troop),
    ])
    .expect("Catalog failed")
}

/// Stores a session and a draft in `DRAFT` without a roll.
fn seed_draft(store: &SqliteStore) -> Draft {
    let session = Session::new("s1".into(), "alice".into(), "bob".into()).unwrap();
    store.insert_session(&session).expect("Insert session failed");
    let mut draft = Draft::invite("d1".into(), "s1".into(), "alice".into(), "bob".into(), 10).unwrap();
    draft.transition(DraftStatus::Draft).unwrap();
    store.insert_draft(&draft).expect("Insert draft failed");
    draft
}

fn event(draft: &DraftId, player: &str, card: &str, seq: u64) -> PickEvent {
    PickEvent::new(draft.clone(), player.into(), card.into(), seq, Utc::now())
}

#[test]
fn test_migrations_are_idempotent() {
    let (_db, store) = setup_test_db();
    assert_eq!(store.run_migrations().expect("Second run failed"), 0);
}

#[test]
fn test_empty_path_is_rejected() {
    let err = SqliteStore::new("  ".to_string()).unwrap_err();
    assert_eq!(err.kind, StoreErrorKind::Backend);
}

#[test]
fn test_draft_round_trips_through_rows() {
    let (_db, store) = setup_test_db();
    let draft = seed_draft(&store);
    let loaded = store.load_draft(draft.id()).expect("Load failed");
    assert_eq!(loaded, draft);

    let err = store.load_draft(&"missing".into()).unwrap_err();
    assert_eq!(err.kind, StoreErrorKind::NotFound);
}

#[test]
fn test_stale_revision_is_a_conflict() {
    let (_db, store) = setup_test_db();
    let draft = seed_draft(&store);

    let mut first = draft.clone();
    first.transition(DraftStatus::DraftResetRequest).unwrap();
    assert_eq!(
        store.compare_and_update_draft(&first, 0).unwrap(),
        UpdateOutcome::Applied { revision: 1 }
    );
    let mut second = draft.clone();
    second.transition(DraftStatus::Error).unwrap();
    assert_eq!(store.compare_and_update_draft(&second, 0).unwrap(), UpdateOutcome::Conflict);

    let loaded = store.load_draft(draft.id()).unwrap();
    assert_eq!(*loaded.status(), DraftStatus::DraftResetRequest);
    assert_eq!(*loaded.revision(), 1);
}

#[test]
fn test_append_checks_sequence_and_card() {
    let (_db, store) = setup_test_db();
    let draft = seed_draft(&store);
    let id = draft.id();

    assert_eq!(
        store.append_if_sequence_matches(id, 1, 1, &event(id, "alice", "zeus", 1)).unwrap(),
        AppendOutcome::Appended
    );
    // Stale expectation.
    assert_eq!(
        store.append_if_sequence_matches(id, 1, 1, &event(id, "bob", "odin", 1)).unwrap(),
        AppendOutcome::Conflict
    );
    // Card already taken.
    assert_eq!(
        store.append_if_sequence_matches(id, 1, 2, &event(id, "bob", "zeus", 2)).unwrap(),
        AppendOutcome::Conflict
    );
    // Old attempt.
    assert_eq!(
        store.append_if_sequence_matches(id, 2, 1, &event(id, "bob", "odin", 1)).unwrap(),
        AppendOutcome::Conflict
    );

    let log = store.read_log(id, 1).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].card_id().as_str(), "zeus");
    assert_eq!(*log[0].seq(), 1);
}

#[test]
fn test_concurrent_appends_store_exactly_one() {
    let (_db, store) = setup_test_db();
    let draft = seed_draft(&store);
    let id = draft.id().clone();

    let outcomes: Vec<AppendOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = ["zeus", "odin", "hydra", "archer"]
            .into_iter()
            .map(|card| {
                let store = store.clone();
                let id = id.clone();
                scope.spawn(move || {
                    store
                        .append_if_sequence_matches(&id, 1, 1, &event(&id, "alice", card, 1))
                        .expect("Append failed")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("Thread panicked"))
            .collect()
    });

    let appended = outcomes
        .iter()
        .filter(|o| **o == AppendOutcome::Appended)
        .count();
    assert_eq!(appended, 1);
    assert_eq!(store.read_log(&id, 1).unwrap().len(), 1);
}

#[test]
fn test_service_runs_over_sqlite() {
    let (_db, store) = setup_test_db();
    let service = DraftService::new(store, Arc::new(catalog()), RulesConfig::default())
        .unwrap()
        .with_seed(5);
    let alice = PlayerId::from("alice");
    let bob = PlayerId::from("bob");

    let session = service.create_session(alice.clone(), bob.clone()).unwrap();
    let draft = service.invite_to_draft(session.id(), &alice, None).unwrap();
    let draft = service.accept_invitation(draft.id(), &bob).unwrap();
    let roll = service.resolve_first_turn(draft.id()).unwrap();
    assert_eq!(Some(&roll), draft.initial_roll().as_ref());

    let (first, _) = draft.seating().unwrap();
    let outcome = service
        .propose_pick(draft.id(), first, &"zeus".into())
        .unwrap();
    assert!(matches!(outcome, PickOutcome::Allowed(_)));

    let stored = service.store().load_session(session.id()).unwrap();
    assert_eq!(*stored.status(), SessionStatus::Draft);
    assert_eq!(stored.games().len(), 1);
    assert_eq!(service.store().read_log(draft.id(), 1).unwrap().len(), 1);
}
