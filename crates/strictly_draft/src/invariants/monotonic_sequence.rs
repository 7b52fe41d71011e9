//! Monotonic sequence: sequence numbers strictly increase and are never reused.

use super::{Invariant, ReplayView};

/// Invariant: sequence numbers are positive and strictly increasing.
pub struct MonotonicSequence;

impl<'a> Invariant<ReplayView<'a>> for MonotonicSequence {
    fn holds(view: &ReplayView<'a>) -> bool {
        view.events.first().is_none_or(|e| *e.seq() > 0)
            && view.events.windows(2).all(|w| w[0].seq() < w[1].seq())
            && *view.state.picks_made() == view.events.len()
    }

    fn description() -> &'static str {
        "Sequence numbers strictly increase"
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{event, replay};
    use super::*;

    #[test]
    fn test_gaps_hold() {
        let events = [event(1, "a", "zeus"), event(5, "b", "odin")];
        let state = replay(&events);
        assert!(MonotonicSequence::holds(&ReplayView::new(&events, &state, 20)));
    }

    #[test]
    fn test_repeated_sequence_violates() {
        let events = [event(1, "a", "zeus"), event(2, "b", "odin")];
        let state = replay(&events);
        let repeated = [event(1, "a", "zeus"), event(1, "b", "odin")];
        assert!(!MonotonicSequence::holds(&ReplayView::new(&repeated, &state, 20)));
    }
}
