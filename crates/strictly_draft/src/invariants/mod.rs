//! Draft invariants.
//!
//! Properties every accepted log must satisfy. They are checked after each
//! accepted pick in debug builds and can be tested on their own.

mod alternating_turn;
mod budget_conserved;
mod monotonic_sequence;
mod unique_picks;

pub use alternating_turn::AlternatingTurn;
pub use budget_conserved::BudgetConserved;
pub use monotonic_sequence::MonotonicSequence;
pub use unique_picks::UniquePicks;

use crate::{DerivedDraftState, PickEvent};
use derive_new::new;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{}", description)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of invariants.
pub trait InvariantSet<S> {
    /// Checks every invariant, collecting all violations.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

invariant_set!(I1, I2);
invariant_set!(I1, I2, I3);
invariant_set!(I1, I2, I3, I4);

/// A log together with the state replayed from it.
#[derive(Debug, Clone, Copy, new)]
pub struct ReplayView<'a> {
    /// Events in log order.
    pub events: &'a [PickEvent],
    /// State reconstructed from `events`.
    pub state: &'a DerivedDraftState,
    /// Points budget of the draft.
    pub budget: u32,
}

/// Every draft invariant as one composable set.
pub type DraftInvariants = (BudgetConserved, AlternatingTurn, UniquePicks, MonotonicSequence);
