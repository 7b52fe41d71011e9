//! Diesel-backed [`DraftStore`].

use diesel::connection::SimpleConnection;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::MigrationHarness;
use tracing::{debug, info, instrument, warn};

use crate::db::models::{from_column, to_column};
use crate::db::{
    DraftChanges, DraftRow, MIGRATIONS, NewDraftRow, NewPickEventRow, NewSessionRow,
    PickEventRow, SessionChanges, SessionRow, schema,
};
use crate::store::{AppendOutcome, DraftStore, StoreError, UpdateOutcome};
use strictly_draft::{Draft, DraftId, DraftStatus, PickEvent, Session, SessionId};

/// Milliseconds a connection waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// SQLite store. Opens a connection per call.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: String,
}

impl SqliteStore {
    /// Creates a store for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, StoreError> {
        if db_path.trim().is_empty() {
            return Err(StoreError::backend("Database path is empty"));
        }
        info!(path = %db_path, "Creating SqliteStore");
        Ok(Self { db_path })
    }

    /// Applies any pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, StoreError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::backend(format!("Migrations failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            StoreError::backend(format!("Failed to connect to '{}': {}", self.db_path, e))
        })?;
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            BUSY_TIMEOUT_MS
        ))?;
        Ok(conn)
    }
}

fn is_unique_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

impl DraftStore for SqliteStore {
    #[instrument(skip(self, draft), fields(draft = %draft.id()))]
    fn insert_draft(&self, draft: &Draft) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let row = NewDraftRow::from_draft(draft)?;
        diesel::insert_into(schema::drafts::table)
            .values(&row)
            .execute(&mut conn)?;
        info!(status = %draft.status(), "Draft inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_draft(&self, id: &DraftId) -> Result<Draft, StoreError> {
        let mut conn = self.connection()?;
        let row = schema::drafts::table
            .find(id.as_str())
            .select(DraftRow::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| StoreError::not_found(format!("Draft '{}' not found", id)))?;
        row.into_draft()
    }

    #[instrument(skip(self, draft), fields(draft = %draft.id()))]
    fn compare_and_update_draft(
        &self,
        draft: &Draft,
        expected_revision: u64,
    ) -> Result<UpdateOutcome, StoreError> {
        use schema::drafts::dsl;
        let mut conn = self.connection()?;
        let revision = expected_revision + 1;
        let changes = DraftChanges::from_draft(draft, revision)?;
        let expected: i64 = to_column(expected_revision, "revision")?;

        let updated = diesel::update(
            dsl::drafts
                .filter(dsl::id.eq(draft.id().as_str()))
                .filter(dsl::revision.eq(expected)),
        )
        .set(&changes)
        .execute(&mut conn)?;

        if updated == 1 {
            debug!(revision, "Draft updated");
            return Ok(UpdateOutcome::Applied { revision });
        }
        let exists = dsl::drafts
            .find(draft.id().as_str())
            .select(dsl::id)
            .first::<String>(&mut conn)
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::not_found(format!("Draft '{}' not found", draft.id())));
        }
        warn!(expected_revision, "Draft revision moved");
        Ok(UpdateOutcome::Conflict)
    }

    #[instrument(skip(self))]
    fn read_log(&self, draft_id: &DraftId, attempt: u32) -> Result<Vec<PickEvent>, StoreError> {
        use schema::pick_events::dsl;
        let mut conn = self.connection()?;
        let attempt: i32 = to_column(u64::from(attempt), "attempt")?;
        let rows = dsl::pick_events
            .filter(dsl::draft_id.eq(draft_id.as_str()))
            .filter(dsl::attempt.eq(attempt))
            .order(dsl::seq.asc())
            .select(PickEventRow::as_select())
            .load(&mut conn)?;
        debug!(count = rows.len(), "Log loaded");
        rows.into_iter().map(PickEventRow::into_event).collect()
    }

    #[instrument(skip(self, event), fields(card = %event.card_id()))]
    fn append_if_sequence_matches(
        &self,
        draft_id: &DraftId,
        attempt: u32,
        expected_next_seq: u64,
        event: &PickEvent,
    ) -> Result<AppendOutcome, StoreError> {
        let mut conn = self.connection()?;
        let row = NewPickEventRow::from_event(event, attempt)?;
        let attempt_col: i32 = to_column(u64::from(attempt), "attempt")?;

        conn.immediate_transaction::<_, StoreError, _>(|conn| {
            let (status, current_attempt) = schema::drafts::table
                .find(draft_id.as_str())
                .select((schema::drafts::status, schema::drafts::attempt))
                .first::<(String, i32)>(conn)
                .optional()?
                .ok_or_else(|| StoreError::not_found(format!("Draft '{}' not found", draft_id)))?;
            if current_attempt != attempt_col || status != DraftStatus::Draft.as_ref() {
                warn!(status = %status, current_attempt, "Draft no longer accepting picks");
                return Ok(AppendOutcome::Conflict);
            }

            let last: Option<i64> = schema::pick_events::table
                .filter(schema::pick_events::draft_id.eq(draft_id.as_str()))
                .filter(schema::pick_events::attempt.eq(attempt_col))
                .select(max(schema::pick_events::seq))
                .first(conn)?;
            let next_seq = match last {
                Some(seq) => from_column::<u64>(seq, "seq")? + 1,
                None => 1,
            };
            if next_seq != expected_next_seq || *event.seq() != expected_next_seq {
                warn!(next_seq, expected_next_seq, "Append lost the race");
                return Ok(AppendOutcome::Conflict);
            }

            match diesel::insert_into(schema::pick_events::table)
                .values(&row)
                .execute(conn)
            {
                Ok(_) => {
                    debug!(seq = next_seq, "Pick appended");
                    Ok(AppendOutcome::Appended)
                }
                Err(err) if is_unique_violation(&err) => {
                    warn!(error = %err, "Pick already taken");
                    Ok(AppendOutcome::Conflict)
                }
                Err(err) => Err(err.into()),
            }
        })
    }

    #[instrument(skip(self, session), fields(session = %session.id()))]
    fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let row = NewSessionRow::from_session(session)?;
        diesel::insert_into(schema::sessions::table)
            .values(&row)
            .execute(&mut conn)?;
        info!("Session inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        let mut conn = self.connection()?;
        let row = schema::sessions::table
            .find(id.as_str())
            .select(SessionRow::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| StoreError::not_found(format!("Session '{}' not found", id)))?;
        row.into_session()
    }

    #[instrument(skip(self, session), fields(session = %session.id()))]
    fn compare_and_update_session(
        &self,
        session: &Session,
        expected_revision: u64,
    ) -> Result<UpdateOutcome, StoreError> {
        use schema::sessions::dsl;
        let mut conn = self.connection()?;
        let revision = expected_revision + 1;
        let changes = SessionChanges::from_session(session, revision)?;
        let expected: i64 = to_column(expected_revision, "revision")?;

        let updated = diesel::update(
            dsl::sessions
                .filter(dsl::id.eq(session.id().as_str()))
                .filter(dsl::revision.eq(expected)),
        )
        .set(&changes)
        .execute(&mut conn)?;

        if updated == 1 {
            debug!(revision, "Session updated");
            return Ok(UpdateOutcome::Applied { revision });
        }
        let exists = dsl::sessions
            .find(session.id().as_str())
            .select(dsl::id)
            .first::<String>(&mut conn)
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::not_found(format!(
                "Session '{}' not found",
                session.id()
            )));
        }
        warn!(expected_revision, "Session revision moved");
        Ok(UpdateOutcome::Conflict)
    }
}
