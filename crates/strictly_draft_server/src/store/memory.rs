//! In-memory store for tests and single-process use.

use super::{AppendOutcome, DraftStore, StoreError, UpdateOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use strictly_draft::{Draft, DraftId, DraftStatus, PickEvent, Session, SessionId};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Default)]
struct Tables {
    drafts: HashMap<DraftId, Draft>,
    logs: HashMap<(DraftId, u32), Vec<PickEvent>>,
    sessions: HashMap<SessionId, Session>,
}

/// Store backed by maps behind one lock. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::backend("In-memory store lock poisoned"))
    }
}

impl DraftStore for InMemoryStore {
    #[instrument(skip(self, draft), fields(draft = %draft.id()))]
    fn insert_draft(&self, draft: &Draft) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.drafts.contains_key(draft.id()) {
            return Err(StoreError::backend(format!("Draft '{}' already exists", draft.id())));
        }
        tables.drafts.insert(draft.id().clone(), draft.clone());
        debug!("Draft inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_draft(&self, id: &DraftId) -> Result<Draft, StoreError> {
        self.tables()?
            .drafts
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("Draft '{}' not found", id)))
    }

    #[instrument(skip(self, draft), fields(draft = %draft.id()))]
    fn compare_and_update_draft(
        &self,
        draft: &Draft,
        expected_revision: u64,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut tables = self.tables()?;
        let stored = tables
            .drafts
            .get_mut(draft.id())
            .ok_or_else(|| StoreError::not_found(format!("Draft '{}' not found", draft.id())))?;
        if *stored.revision() != expected_revision {
            warn!(stored = stored.revision(), expected_revision, "Draft revision moved");
            return Ok(UpdateOutcome::Conflict);
        }
        let revision = expected_revision + 1;
        let mut next = draft.clone();
        next.set_revision(revision);
        *stored = next;
        Ok(UpdateOutcome::Applied { revision })
    }

    #[instrument(skip(self))]
    fn read_log(&self, draft_id: &DraftId, attempt: u32) -> Result<Vec<PickEvent>, StoreError> {
        Ok(self
            .tables()?
            .logs
            .get(&(draft_id.clone(), attempt))
            .cloned()
            .unwrap_or_default())
    }

    #[instrument(skip(self, event), fields(card = %event.card_id()))]
    fn append_if_sequence_matches(
        &self,
        draft_id: &DraftId,
        attempt: u32,
        expected_next_seq: u64,
        event: &PickEvent,
    ) -> Result<AppendOutcome, StoreError> {
        let mut tables = self.tables()?;
        let draft = tables
            .drafts
            .get(draft_id)
            .ok_or_else(|| StoreError::not_found(format!("Draft '{}' not found", draft_id)))?;
        if *draft.attempt() != attempt || *draft.status() != DraftStatus::Draft {
            warn!(status = %draft.status(), "Draft no longer accepting picks");
            return Ok(AppendOutcome::Conflict);
        }
        let log = tables.logs.entry((draft_id.clone(), attempt)).or_default();
        let next_seq = log.last().map_or(1, |e| e.seq() + 1);
        if next_seq != expected_next_seq
            || *event.seq() != expected_next_seq
            || log.iter().any(|e| e.card_id() == event.card_id())
        {
            warn!(next_seq, expected_next_seq, "Append lost the race");
            return Ok(AppendOutcome::Conflict);
        }
        log.push(event.clone());
        debug!(seq = next_seq, "Pick appended");
        Ok(AppendOutcome::Appended)
    }

    #[instrument(skip(self, session), fields(session = %session.id()))]
    fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.sessions.contains_key(session.id()) {
            return Err(StoreError::backend(format!(
                "Session '{}' already exists",
                session.id()
            )));
        }
        tables.sessions.insert(session.id().clone(), session.clone());
        debug!("Session inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.tables()?
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("Session '{}' not found", id)))
    }

    #[instrument(skip(self, session), fields(session = %session.id()))]
    fn compare_and_update_session(
        &self,
        session: &Session,
        expected_revision: u64,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut tables = self.tables()?;
        let stored = tables
            .sessions
            .get_mut(session.id())
            .ok_or_else(|| StoreError::not_found(format!("Session '{}' not found", session.id())))?;
        if *stored.revision() != expected_revision {
            warn!(stored = stored.revision(), expected_revision, "Session revision moved");
            return Ok(UpdateOutcome::Conflict);
        }
        let revision = expected_revision + 1;
        let mut next = session.clone();
        next.set_revision(revision);
        *stored = next;
        Ok(UpdateOutcome::Applied { revision })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn drafting() -> Draft {
        let mut draft = Draft::invite("d".into(), "s".into(), "a".into(), "b".into(), 10).unwrap();
        draft.transition(DraftStatus::Draft).unwrap();
        draft
    }

    fn event(seq: u64, card: &str) -> PickEvent {
        PickEvent::new("d".into(), "a".into(), card.into(), seq, Utc::now())
    }

    #[test]
    fn test_append_requires_expected_sequence() {
        let store = InMemoryStore::new();
        store.insert_draft(&drafting()).unwrap();
        let id = DraftId::from("d");
        assert_eq!(
            store.append_if_sequence_matches(&id, 1, 1, &event(1, "x")).unwrap(),
            AppendOutcome::Appended
        );
        assert_eq!(
            store.append_if_sequence_matches(&id, 1, 1, &event(1, "y")).unwrap(),
            AppendOutcome::Conflict
        );
        assert_eq!(store.read_log(&id, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_append_rejected_outside_drafting() {
        let store = InMemoryStore::new();
        let draft = Draft::invite("d".into(), "s".into(), "a".into(), "b".into(), 10).unwrap();
        store.insert_draft(&draft).unwrap();
        let outcome = store
            .append_if_sequence_matches(&"d".into(), 1, 1, &event(1, "x"))
            .unwrap();
        assert_eq!(outcome, AppendOutcome::Conflict);
    }

    #[test]
    fn test_stale_revision_conflicts() {
        let store = InMemoryStore::new();
        let draft = drafting();
        store.insert_draft(&draft).unwrap();
        assert_eq!(
            store.compare_and_update_draft(&draft, 0).unwrap(),
            UpdateOutcome::Applied { revision: 1 }
        );
        assert_eq!(
            store.compare_and_update_draft(&draft, 0).unwrap(),
            UpdateOutcome::Conflict
        );
        assert_eq!(*store.load_draft(draft.id()).unwrap().revision(), 1);
    }

    #[test]
    fn test_missing_records_report_not_found() {
        let store = InMemoryStore::new();
        let err = store.load_session(&"nope".into()).unwrap_err();
        assert_eq!(err.kind, crate::StoreErrorKind::NotFound);
    }
}
