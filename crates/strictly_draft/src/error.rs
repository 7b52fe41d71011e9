//! Error types for the draft core.

use serde::{Deserialize, Serialize};

/// How a failure should be handled by whoever receives it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum ErrorClass {
    /// Reported to the caller verbatim; the client may pick another action.
    UserActionable,
    /// Safe to retry with freshly read state.
    Transient,
    /// Data integrity problem; the affected draft or session moves to `ERROR`.
    Fatal,
}

/// Errors raised by the pure draft logic.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum CoreError {
    /// The pick history cannot be trusted (unknown card, duplicate, bad ordering, bad blob).
    #[display("Malformed history: {}", _0)]
    MalformedHistory(String),

    /// A status change that the lifecycle does not allow.
    #[display("Illegal {} transition: {} -> {}", scope, from, to)]
    IllegalTransition {
        /// Which state machine rejected the change ("draft" or "session").
        scope: &'static str,
        /// Status at the time of the attempt.
        from: String,
        /// Status that was requested.
        to: String,
    },

    /// A player id that does not belong to the draft or session.
    #[display("Player {} is not a participant", _0)]
    UnknownPlayer(String),

    /// Rules configuration that cannot be played.
    #[display("Invalid rules: {}", _0)]
    InvalidRules(String),

    /// Catalog data that cannot be loaded.
    #[display("Invalid catalog: {}", _0)]
    InvalidCatalog(String),
}

impl std::error::Error for CoreError {}

impl CoreError {
    /// Classifies the error for retry and escalation decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            CoreError::IllegalTransition { .. } | CoreError::UnknownPlayer(_) => {
                ErrorClass::UserActionable
            }
            CoreError::MalformedHistory(_)
            | CoreError::InvalidRules(_)
            | CoreError::InvalidCatalog(_) => ErrorClass::Fatal,
        }
    }

    /// Shorthand for a malformed-history error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        CoreError::MalformedHistory(reason.into())
    }
}
