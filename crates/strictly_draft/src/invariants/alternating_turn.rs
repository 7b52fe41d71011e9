//! Alternating turn: picks go first, second, first, second, ...

use super::{Invariant, ReplayView};

/// Invariant: the event at index `i` was made by the first player when `i`
/// is even and by the second player otherwise, and the next turn follows
/// the same rule.
pub struct AlternatingTurn;

impl<'a> Invariant<ReplayView<'a>> for AlternatingTurn {
    fn holds(view: &ReplayView<'a>) -> bool {
        let first = view.state.first().player();
        let second = view.state.second().player();
        let seat = |index: usize| if index % 2 == 0 { first } else { second };

        let alternates = view
            .events
            .iter()
            .enumerate()
            .all(|(i, event)| event.player_id() == seat(i));

        alternates && view.state.next_turn() == seat(view.events.len())
    }

    fn description() -> &'static str {
        "Players alternate picks starting with the roll winner"
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{event, replay};
    use super::*;

    #[test]
    fn test_alternating_sequence_holds() {
        let events = [event(1, "a", "zeus"), event(2, "b", "odin"), event(3, "a", "archer")];
        let state = replay(&events);
        assert!(AlternatingTurn::holds(&ReplayView::new(&events, &state, 20)));
    }

    #[test]
    fn test_same_player_twice_violates() {
        let state = replay(&[event(1, "a", "zeus")]);
        let doubled = [event(1, "a", "zeus"), event(2, "a", "odin")];
        assert!(!AlternatingTurn::holds(&ReplayView::new(&doubled, &state, 20)));
    }
}
