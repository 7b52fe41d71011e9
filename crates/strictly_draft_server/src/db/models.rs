//! Database rows and their conversions to draft types.

use chrono::{NaiveDateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use std::str::FromStr;
use tracing::instrument;

use crate::db::schema;
use crate::store::StoreError;
use strictly_draft::{
    CardId, Draft, DraftParts, DraftStatus, GameEntry, InitialRoll, PickEvent, Session,
    SessionStatus,
};

/// Converts a stored signed integer back to an unsigned domain value.
#[track_caller]
pub(crate) fn from_column<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T, StoreError> {
    T::try_from(value)
        .map_err(|_| StoreError::corrupt(format!("Column '{}' out of range: {}", column, value)))
}

/// Converts an unsigned domain value into a signed column.
#[track_caller]
pub(crate) fn to_column<T: TryFrom<u64>>(value: u64, column: &str) -> Result<T, StoreError> {
    T::try_from(value)
        .map_err(|_| StoreError::backend(format!("Value for '{}' too large: {}", column, value)))
}

/// Draft database row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::drafts)]
pub struct DraftRow {
    id: String,
    session_id: String,
    player1_id: String,
    player2_id: String,
    status: String,
    points_budget: i32,
    attempt: i32,
    initial_roll: Option<String>,
    pool: Option<String>,
    reset_requested_by: Option<String>,
    revision: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl DraftRow {
    /// Decodes the row into a [`Draft`].
    ///
    /// # Errors
    ///
    /// Returns a corrupt [`StoreError`] if any column cannot be decoded.
    #[instrument(skip(self), fields(draft = %self.id))]
    pub fn into_draft(self) -> Result<Draft, StoreError> {
        let status = DraftStatus::from_str(&self.status)
            .map_err(|_| StoreError::corrupt(format!("Unknown draft status '{}'", self.status)))?;
        let initial_roll = self
            .initial_roll
            .as_deref()
            .map(serde_json::from_str::<InitialRoll>)
            .transpose()?;
        let pool = self
            .pool
            .as_deref()
            .map(serde_json::from_str::<Vec<CardId>>)
            .transpose()?;
        Ok(Draft::from_parts(DraftParts {
            id: self.id.into(),
            session_id: self.session_id.into(),
            player1: self.player1_id.into(),
            player2: self.player2_id.into(),
            status,
            points_budget: from_column(self.points_budget.into(), "points_budget")?,
            attempt: from_column(self.attempt.into(), "attempt")?,
            initial_roll,
            pool,
            reset_requested_by: self.reset_requested_by.map(Into::into),
            revision: from_column(self.revision, "revision")?,
        }))
    }
}

/// Insertable draft row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::drafts)]
pub struct NewDraftRow {
    id: String,
    session_id: String,
    player1_id: String,
    player2_id: String,
    status: String,
    points_budget: i32,
    attempt: i32,
    initial_roll: Option<String>,
    pool: Option<String>,
    reset_requested_by: Option<String>,
    revision: i64,
}

impl NewDraftRow {
    /// Encodes a draft for insertion.
    pub fn from_draft(draft: &Draft) -> Result<Self, StoreError> {
        let changes = DraftChanges::from_draft(draft, *draft.revision())?;
        Ok(Self::new(
            draft.id().to_string(),
            draft.session_id().to_string(),
            draft.player1().to_string(),
            draft.player2().to_string(),
            changes.status,
            to_column(u64::from(*draft.points_budget()), "points_budget")?,
            changes.attempt,
            changes.initial_roll,
            changes.pool,
            changes.reset_requested_by,
            changes.revision,
        ))
    }
}

/// Mutable draft columns written by a conditional update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::drafts)]
#[diesel(treat_none_as_null = true)]
pub struct DraftChanges {
    status: String,
    attempt: i32,
    initial_roll: Option<String>,
    pool: Option<String>,
    reset_requested_by: Option<String>,
    revision: i64,
    updated_at: NaiveDateTime,
}

impl DraftChanges {
    /// Encodes the mutable part of a draft under a new revision.
    pub fn from_draft(draft: &Draft, revision: u64) -> Result<Self, StoreError> {
        Ok(Self {
            status: draft.status().to_string(),
            attempt: to_column(u64::from(*draft.attempt()), "attempt")?,
            initial_roll: draft
                .initial_roll()
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            pool: draft.pool().as_ref().map(serde_json::to_string).transpose()?,
            reset_requested_by: draft.reset_requested_by().as_ref().map(ToString::to_string),
            revision: to_column(revision, "revision")?,
            updated_at: Utc::now().naive_utc(),
        })
    }
}

/// Pick event database row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::pick_events)]
pub struct PickEventRow {
    id: i32,
    draft_id: String,
    attempt: i32,
    seq: i64,
    player_id: String,
    card_id: String,
    picked_at: NaiveDateTime,
}

impl PickEventRow {
    /// Decodes the row into a [`PickEvent`].
    pub fn into_event(self) -> Result<PickEvent, StoreError> {
        Ok(PickEvent::new(
            self.draft_id.into(),
            self.player_id.into(),
            self.card_id.into(),
            from_column(self.seq, "seq")?,
            self.picked_at.and_utc(),
        ))
    }
}

/// Insertable pick event row.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::pick_events)]
pub struct NewPickEventRow {
    draft_id: String,
    attempt: i32,
    seq: i64,
    player_id: String,
    card_id: String,
    picked_at: NaiveDateTime,
}

impl NewPickEventRow {
    /// Encodes an event of the given attempt.
    pub fn from_event(event: &PickEvent, attempt: u32) -> Result<Self, StoreError> {
        Ok(Self::new(
            event.draft_id().to_string(),
            to_column(u64::from(attempt), "attempt")?,
            to_column(*event.seq(), "seq")?,
            event.player_id().to_string(),
            event.card_id().to_string(),
            event.picked_at().naive_utc(),
        ))
    }
}

/// Session database row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::sessions)]
pub struct SessionRow {
    id: String,
    player1_id: String,
    player2_id: String,
    player1_score: i32,
    player2_score: i32,
    games: String,
    status: String,
    revision: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl SessionRow {
    /// Decodes the row into a [`Session`].
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn into_session(self) -> Result<Session, StoreError> {
        let status = SessionStatus::from_str(&self.status).map_err(|_| {
            StoreError::corrupt(format!("Unknown session status '{}'", self.status))
        })?;
        let games: Vec<GameEntry> = serde_json::from_str(&self.games)?;
        Ok(Session::restore(
            self.id.into(),
            self.player1_id.into(),
            self.player2_id.into(),
            (
                from_column(self.player1_score.into(), "player1_score")?,
                from_column(self.player2_score.into(), "player2_score")?,
            ),
            games,
            status,
            from_column(self.revision, "revision")?,
        ))
    }
}

/// Insertable session row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::sessions)]
pub struct NewSessionRow {
    id: String,
    player1_id: String,
    player2_id: String,
    player1_score: i32,
    player2_score: i32,
    games: String,
    status: String,
    revision: i64,
}

impl NewSessionRow {
    /// Encodes a session for insertion.
    pub fn from_session(session: &Session) -> Result<Self, StoreError> {
        let changes = SessionChanges::from_session(session, *session.revision())?;
        Ok(Self {
            id: session.id().to_string(),
            player1_id: session.player1().to_string(),
            player2_id: session.player2().to_string(),
            player1_score: changes.player1_score,
            player2_score: changes.player2_score,
            games: changes.games,
            status: changes.status,
            revision: changes.revision,
        })
    }
}

/// Mutable session columns written by a conditional update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::sessions)]
pub struct SessionChanges {
    player1_score: i32,
    player2_score: i32,
    games: String,
    status: String,
    revision: i64,
    updated_at: NaiveDateTime,
}

impl SessionChanges {
    /// Encodes the mutable part of a session under a new revision.
    pub fn from_session(session: &Session, revision: u64) -> Result<Self, StoreError> {
        Ok(Self {
            player1_score: to_column(u64::from(*session.player1_score()), "player1_score")?,
            player2_score: to_column(u64::from(*session.player2_score()), "player2_score")?,
            games: serde_json::to_string(session.games())?,
            status: session.status().to_string(),
            revision: to_column(revision, "revision")?,
            updated_at: Utc::now().naive_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_row_round_trips_status_text() {
        let draft = Draft::invite("d".into(), "s".into(), "a".into(), "b".into(), 12)
            .unwrap()
            .with_pool(vec!["zeus".into()]);
        let row = NewDraftRow::from_draft(&draft).unwrap();
        assert_eq!(row.status, "INVITE_TO_DRAFT");
        assert_eq!(row.pool.as_deref(), Some(r#"["zeus"]"#));
        assert_eq!(row.points_budget, 12);
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let now = Utc::now().naive_utc();
        let row = DraftRow {
            id: "d".into(),
            session_id: "s".into(),
            player1_id: "a".into(),
            player2_id: "b".into(),
            status: "PAUSED".into(),
            points_budget: 10,
            attempt: 1,
            initial_roll: None,
            pool: None,
            reset_requested_by: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        };
        let err = row.into_draft().unwrap_err();
        assert_eq!(err.kind, crate::StoreErrorKind::Corrupt);
    }

    #[test]
    fn test_negative_revision_is_corrupt() {
        assert!(from_column::<u64>(-1, "revision").is_err());
        assert_eq!(from_column::<u32>(7, "attempt").unwrap(), 7);
    }
}
