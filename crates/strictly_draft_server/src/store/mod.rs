//! Storage collaborators for drafts, pick logs and sessions.
//!
//! A store never decides anything about the game. It offers conditional
//! writes so the request layer can serialize competing requests: picks are
//! appended only if the expected next sequence number still matches, and
//! records are replaced only if their revision is unchanged.

mod error;
mod memory;

pub use error::{StoreError, StoreErrorKind};
pub use memory::InMemoryStore;

use strictly_draft::{Draft, DraftId, PickEvent, Session, SessionId};

/// Result of a conditional append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The event is now part of the log.
    Appended,
    /// The log, attempt or status moved on; nothing was written.
    Conflict,
}

/// Result of a conditional record update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record was written with this new revision.
    Applied {
        /// Revision now stored.
        revision: u64,
    },
    /// The stored revision differs from the expected one; nothing was written.
    Conflict,
}

/// Persistence used by the draft service.
pub trait DraftStore: Send + Sync {
    /// Stores a new draft.
    fn insert_draft(&self, draft: &Draft) -> Result<(), StoreError>;

    /// Loads a draft.
    fn load_draft(&self, id: &DraftId) -> Result<Draft, StoreError>;

    /// Replaces a draft if the stored revision equals `expected_revision`.
    fn compare_and_update_draft(
        &self,
        draft: &Draft,
        expected_revision: u64,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Reads one attempt's log in sequence order.
    fn read_log(&self, draft_id: &DraftId, attempt: u32) -> Result<Vec<PickEvent>, StoreError>;

    /// Appends `event` only if the draft is still drafting on `attempt` and the
    /// attempt's next sequence number is `expected_next_seq`.
    fn append_if_sequence_matches(
        &self,
        draft_id: &DraftId,
        attempt: u32,
        expected_next_seq: u64,
        event: &PickEvent,
    ) -> Result<AppendOutcome, StoreError>;

    /// Stores a new session.
    fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Loads a session.
    fn load_session(&self, id: &SessionId) -> Result<Session, StoreError>;

    /// Replaces a session if the stored revision equals `expected_revision`.
    fn compare_and_update_session(
        &self,
        session: &Session,
        expected_revision: u64,
    ) -> Result<UpdateOutcome, StoreError>;
}
