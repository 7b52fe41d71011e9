//! Unique picks: a card is taken at most once per draft.

use super::{Invariant, ReplayView};
use std::collections::BTreeSet;

/// Invariant: no card appears twice in the log, and the derived picked set
/// is exactly the set of logged cards.
pub struct UniquePicks;

impl<'a> Invariant<ReplayView<'a>> for UniquePicks {
    fn holds(view: &ReplayView<'a>) -> bool {
        let logged: BTreeSet<_> = view.events.iter().map(|e| e.card_id()).collect();
        logged.len() == view.events.len()
            && logged.len() == view.state.picked().len()
            && logged.iter().all(|id| view.state.picked().contains(*id))
    }

    fn description() -> &'static str {
        "No card is picked more than once"
    }
}
