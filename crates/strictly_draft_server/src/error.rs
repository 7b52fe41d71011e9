//! Request-layer error type.

use crate::store::{StoreError, StoreErrorKind};
use strictly_draft::{
    CoreError, DraftId, DraftStatus, ErrorClass, PlayerId, PoolError, Readiness,
};

/// Errors returned by [`crate::DraftService`] operations.
#[derive(Debug, Clone, derive_more::Display)]
pub enum ServiceError {
    /// Draft or session rules rejected the request.
    #[display("{}", _0)]
    Core(CoreError),

    /// The draft pool could not be generated.
    #[display("{}", _0)]
    Pool(PoolError),

    /// Storage failed.
    #[display("{}", _0)]
    Store(StoreError),

    /// Another request changed the record first. Re-fetch and retry.
    #[display("Conflict: {}", _0)]
    Conflict(String),

    /// The draft or session does not exist.
    #[display("Not found: {}", _0)]
    NotFound(String),

    /// The player is not part of the draft or session.
    #[display("Player {} is not a participant", _0)]
    NotParticipant(PlayerId),

    /// Picks are only accepted while drafting.
    #[display("Draft is not accepting picks (status {})", _0)]
    NotDrafting(DraftStatus),

    /// The draft has no recorded first-turn roll yet.
    #[display("First turn of draft {} is not resolved", _0)]
    FirstTurnUnresolved(DraftId),

    /// A player cannot start the game with their drafted cards.
    #[display("Player {} is not ready: {:?}", player, readiness)]
    NotReady {
        /// Player who is not ready.
        player: PlayerId,
        /// What is missing.
        readiness: Readiness,
    },

    /// The player may not take this action.
    #[display("Not permitted: {}", _0)]
    NotPermitted(String),

    /// A request could not be decoded.
    #[display("Bad request: {}", _0)]
    BadRequest(String),

    /// A result could not be encoded.
    #[display("Encoding failed: {}", _0)]
    Encoding(String),
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Classifies the error for retry and escalation decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            ServiceError::Core(err) => err.class(),
            ServiceError::Conflict(_) => ErrorClass::Transient,
            ServiceError::Store(err) => match err.kind {
                StoreErrorKind::Busy | StoreErrorKind::Backend => ErrorClass::Transient,
                StoreErrorKind::Corrupt => ErrorClass::Fatal,
                StoreErrorKind::NotFound => ErrorClass::UserActionable,
            },
            ServiceError::Pool(_) | ServiceError::Encoding(_) => ErrorClass::Fatal,
            ServiceError::NotFound(_)
            | ServiceError::NotParticipant(_)
            | ServiceError::NotDrafting(_)
            | ServiceError::FirstTurnUnresolved(_)
            | ServiceError::NotReady { .. }
            | ServiceError::NotPermitted(_)
            | ServiceError::BadRequest(_) => ErrorClass::UserActionable,
        }
    }

    /// Returns true if the request can be retried as-is with fresh state.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        ServiceError::Core(err)
    }
}

impl From<PoolError> for ServiceError {
    fn from(err: PoolError) -> Self {
        ServiceError::Pool(err)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err.kind {
            StoreErrorKind::Busy => ServiceError::Conflict(err.message),
            StoreErrorKind::NotFound => ServiceError::NotFound(err.message),
            StoreErrorKind::Corrupt | StoreErrorKind::Backend => ServiceError::Store(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_store_surfaces_as_conflict() {
        let err = ServiceError::from(StoreError::new(StoreErrorKind::Busy, "database is locked"));
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let err = ServiceError::from(StoreError::not_found("Draft 'x' not found"));
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(err.class(), ErrorClass::UserActionable);
    }

    #[test]
    fn test_corrupt_history_is_fatal() {
        let err = ServiceError::from(CoreError::malformed("duplicate card"));
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert!(!err.is_retryable());
    }
}
