//! Budget conservation: no player ever spends more than the budget.

use super::{Invariant, ReplayView};

/// Invariant: both players' spend stays within the draft budget.
pub struct BudgetConserved;

impl<'a> Invariant<ReplayView<'a>> for BudgetConserved {
    fn holds(view: &ReplayView<'a>) -> bool {
        *view.state.first().spent() <= view.budget && *view.state.second().spent() <= view.budget
    }

    fn description() -> &'static str {
        "Each player's spend stays within the points budget"
    }
}
