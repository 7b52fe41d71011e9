//! Strictly Draft - two-player card draft rules
//!
//! Pure game logic with no I/O. The pick log is the only source of truth;
//! everything else about a draft is recomputed from it.
//!
//! # Architecture
//!
//! - **History**: append-only [`DraftLog`] and its versioned blob ([`DraftHistory`])
//! - **Reconstruction**: [`reconstruct`] replays a log into [`DerivedDraftState`]
//! - **Validation**: [`PickValidator`] decides [`PickDecision`]s under a [`RulesConfig`]
//! - **Lifecycle**: [`DraftStatus`] and [`SessionStatus`] state machines
//! - **Setup**: [`resolve_first_player`] and [`generate_pool`]
//!
//! # Example
//!
//! ```
//! use strictly_draft::{
//!     reconstruct, resolve_from_throws, Card, Catalog, Draft, DraftStatus, PickDecision,
//!     PickValidator, PlayerId, ProposedPick, RulesConfig,
//! };
//!
//! let catalog = Catalog::from_cards([Card::new("zeus", "Zeus", 6)]).unwrap();
//! let (alice, bob) = (PlayerId::from("alice"), PlayerId::from("bob"));
//! let mut draft = Draft::invite("d1".into(), "s1".into(), alice.clone(), bob.clone(), 10).unwrap();
//! draft.transition(DraftStatus::Draft).unwrap();
//! draft.record_roll(resolve_from_throws(&alice, &bob, [(2, 5)]).unwrap());
//!
//! let (first, second) = draft.seating().unwrap();
//! let state = reconstruct(&[], &catalog, first, second).unwrap();
//! let rules = RulesConfig::default();
//! let decision = PickValidator::new(&catalog, &rules)
//!     .validate(&state, &draft, &ProposedPick::new(bob, "zeus".into()));
//! assert_eq!(decision, PickDecision::Allowed);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod card;
mod draft;
mod error;
mod history;
mod ids;
mod invariants;
mod pool;
mod reconstruct;
mod roll;
mod rules;
mod session;
mod validation;

// Crate-level exports - Identifiers and errors
pub use error::{CoreError, ErrorClass};
pub use ids::{CardId, DraftId, PlayerId, SessionId};

// Crate-level exports - Catalog
pub use card::{Card, Catalog, Origin, UnitClass};

// Crate-level exports - History
pub use history::{DraftHistory, DraftLog, HISTORY_SCHEMA_VERSION, PickEvent};

// Crate-level exports - Reconstruction and validation
pub use reconstruct::{DerivedDraftState, PlayerLedger, reconstruct};
pub use rules::{ClassCap, OriginCap, RulesConfig};
pub use validation::{DenyReason, PickDecision, PickValidator, ProposedPick, Readiness};

// Crate-level exports - Invariants
pub use invariants::{
    AlternatingTurn, BudgetConserved, DraftInvariants, Invariant, InvariantSet,
    InvariantViolation, MonotonicSequence, ReplayView, UniquePicks,
};

// Crate-level exports - Lifecycle
pub use draft::{Draft, DraftAction, DraftParts, DraftRecord, DraftStatus};
pub use session::{GameEntry, Session, SessionAction, SessionStatus, WinCondition};

// Crate-level exports - Setup
pub use pool::{DraftPool, MAX_POOL_ITERATIONS, PoolConfig, PoolError, generate_pool};
pub use roll::{DEFAULT_DIE_FACES, InitialRoll, resolve_first_player, resolve_from_throws};
