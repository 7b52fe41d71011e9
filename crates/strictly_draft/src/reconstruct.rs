//! Draft state reconstruction.
//!
//! Current state is never stored. It is rebuilt by replaying the whole log
//! against the catalog every time it is needed, so it cannot drift from the
//! events that produced it.

use crate::history::check_ordering;
use crate::{CardId, Catalog, CoreError, Origin, PickEvent, PlayerId, UnitClass};
use derive_getters::Getters;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// Everything one player has accumulated so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct PlayerLedger {
    /// Owner of the ledger.
    player: PlayerId,
    /// Cards owned, in pick order.
    cards: Vec<CardId>,
    /// Points spent.
    spent: u32,
    /// Owned cards per class tag.
    class_counts: BTreeMap<UnitClass, u32>,
    /// Owned cards per origin tag.
    origin_counts: BTreeMap<Origin, u32>,
}

impl PlayerLedger {
    fn empty(player: PlayerId) -> Self {
        Self {
            player,
            cards: Vec::new(),
            spent: 0,
            class_counts: BTreeMap::new(),
            origin_counts: BTreeMap::new(),
        }
    }

    /// Class tags the player owns at least one card of.
    pub fn classes(&self) -> BTreeSet<UnitClass> {
        self.class_counts.keys().copied().collect()
    }

    /// Origin tags the player owns at least one card of.
    pub fn origins(&self) -> BTreeSet<Origin> {
        self.origin_counts.keys().copied().collect()
    }

    /// Number of owned cards carrying the class.
    pub fn class_count(&self, class: UnitClass) -> u32 {
        self.class_counts.get(&class).copied().unwrap_or(0)
    }

    /// Number of owned cards carrying the origin.
    pub fn origin_count(&self, origin: Origin) -> u32 {
        self.origin_counts.get(&origin).copied().unwrap_or(0)
    }

    /// Returns true if the player owns a card of the class.
    pub fn holds_class(&self, class: UnitClass) -> bool {
        self.class_count(class) > 0
    }

    /// Points left under the given budget.
    pub fn remaining(&self, budget: u32) -> u32 {
        budget.saturating_sub(self.spent)
    }
}

/// State derived from a pick log. Computed, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct DerivedDraftState {
    /// Ledger of the player who picks on even positions.
    first: PlayerLedger,
    /// Ledger of the player who picks on odd positions.
    second: PlayerLedger,
    /// Cards taken by either player.
    picked: BTreeSet<CardId>,
    /// Catalog cards nobody has taken.
    remaining: BTreeSet<CardId>,
    /// Player who acts next.
    next_turn: PlayerId,
    /// Number of picks replayed.
    picks_made: usize,
}

impl DerivedDraftState {
    /// Ledger for a participant, or `None` for anyone else.
    pub fn ledger(&self, player: &PlayerId) -> Option<&PlayerLedger> {
        if &self.first.player == player {
            Some(&self.first)
        } else if &self.second.player == player {
            Some(&self.second)
        } else {
            None
        }
    }

    /// Player who picks first in this draft.
    pub fn first_player(&self) -> &PlayerId {
        &self.first.player
    }

    /// Ledger of the player to move.
    pub fn mover(&self) -> &PlayerLedger {
        if self.picks_made % 2 == 0 {
            &self.first
        } else {
            &self.second
        }
    }

    /// Points spent by both players together.
    pub fn total_spent(&self) -> u64 {
        u64::from(self.first.spent) + u64::from(self.second.spent)
    }
}

/// Replays a pick log against the catalog.
///
/// `first` is the player the initial roll chose; `second` is the other
/// participant. Pure: the same inputs always produce the same state.
///
/// # Errors
///
/// Returns [`CoreError::MalformedHistory`] if an event references a card the
/// catalog does not know, repeats a card, breaks sequence ordering, belongs
/// to another draft, or was made by the player who was not on turn.
#[instrument(skip(events, catalog), fields(picks = events.len(), first = %first))]
pub fn reconstruct(
    events: &[PickEvent],
    catalog: &Catalog,
    first: &PlayerId,
    second: &PlayerId,
) -> Result<DerivedDraftState, CoreError> {
    if first == second {
        return Err(CoreError::malformed(format!(
            "player '{}' cannot draft against themselves",
            first
        )));
    }
    check_ordering(events)?;

    let mut ledgers = [
        PlayerLedger::empty(first.clone()),
        PlayerLedger::empty(second.clone()),
    ];
    let mut picked = BTreeSet::new();
    let draft_id = events.first().map(|e| e.draft_id());

    for (index, event) in events.iter().enumerate() {
        if Some(event.draft_id()) != draft_id {
            return Err(CoreError::malformed(format!(
                "event {} belongs to draft '{}'",
                event.seq(),
                event.draft_id()
            )));
        }
        let ledger = &mut ledgers[index % 2];
        if event.player_id() != &ledger.player {
            return Err(CoreError::malformed(format!(
                "event {} picked by '{}' on the turn of '{}'",
                event.seq(),
                event.player_id(),
                ledger.player
            )));
        }
        let card = catalog.get(event.card_id()).ok_or_else(|| {
            CoreError::malformed(format!("card '{}' is not in the catalog", event.card_id()))
        })?;

        ledger.cards.push(card.id().clone());
        ledger.spent = ledger.spent.checked_add(card.cost()).ok_or_else(|| {
            CoreError::malformed(format!(
                "event {} overflows the spend of '{}'",
                event.seq(),
                ledger.player
            ))
        })?;
        for class in card.classes() {
            *ledger.class_counts.entry(*class).or_insert(0) += 1;
        }
        if let Some(origin) = card.origin() {
            *ledger.origin_counts.entry(origin).or_insert(0) += 1;
        }
        picked.insert(card.id().clone());
    }

    let remaining = catalog
        .ids()
        .filter(|id| !picked.contains(*id))
        .cloned()
        .collect();
    let next_turn = if events.len() % 2 == 0 { first.clone() } else { second.clone() };
    let [first, second] = ledgers;

    debug!(
        next_turn = %next_turn,
        first_spent = first.spent,
        second_spent = second.spent,
        "Draft state reconstructed"
    );

    Ok(DerivedDraftState {
        first,
        second,
        picked,
        remaining,
        next_turn,
        picks_made: events.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Card, DraftId};
    use chrono::Utc;

    fn catalog() -> Catalog {
        Catalog::from_cards([
            Card::new("zeus", "Zeus", 6).with_class(UnitClass::God).with_origin(Origin::Pantheon),
            Card::new("odin", "Odin", 6).with_class(UnitClass::God).with_origin(Origin::Ragnarok),
            Card::new("hoplite", "Hoplite", 2).with_class(UnitClass::Troop).with_origin(Origin::Pantheon),
        ])
        .unwrap()
    }

    fn event(seq: u64, player: &str, card: &str) -> PickEvent {
        PickEvent::new(DraftId::from("d"), player.into(), card.into(), seq, Utc::now())
    }

    fn a() -> PlayerId {
        PlayerId::from("a")
    }

    fn b() -> PlayerId {
        PlayerId::from("b")
    }

    #[test]
    fn test_empty_log_first_player_moves() {
        let state = reconstruct(&[], &catalog(), &a(), &b()).unwrap();
        assert_eq!(state.next_turn(), &a());
        assert_eq!(state.remaining().len(), 3);
        assert_eq!(*state.first().spent(), 0);
    }

    #[test]
    fn test_replay_accumulates_tags_and_spend() {
        let events = [event(1, "a", "zeus"), event(2, "b", "odin"), event(3, "a", "hoplite")];
        let state = reconstruct(&events, &catalog(), &a(), &b()).unwrap();
        let ledger = state.ledger(&a()).unwrap();
        assert_eq!(*ledger.spent(), 8);
        assert_eq!(ledger.origin_count(Origin::Pantheon), 2);
        assert!(ledger.holds_class(UnitClass::God));
        assert!(ledger.holds_class(UnitClass::Troop));
        assert_eq!(state.next_turn(), &b());
        assert!(state.remaining().is_empty());
        assert_eq!(state.total_spent(), 14);
    }

    #[test]
    fn test_sequence_gaps_are_allowed() {
        let events = [event(3, "a", "zeus"), event(10, "b", "odin")];
        assert!(reconstruct(&events, &catalog(), &a(), &b()).is_ok());
    }

    #[test]
    fn test_unknown_card_is_malformed() {
        let events = [event(1, "a", "loki")];
        let err = reconstruct(&events, &catalog(), &a(), &b()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedHistory(msg) if msg.contains("loki")));
    }

    #[test]
    fn test_out_of_turn_event_is_malformed() {
        let events = [event(1, "a", "zeus"), event(2, "a", "odin")];
        assert!(reconstruct(&events, &catalog(), &a(), &b()).is_err());
    }

    #[test]
    fn test_foreign_draft_event_is_malformed() {
        let foreign = PickEvent::new(DraftId::from("other"), b(), "odin".into(), 2, Utc::now());
        let events = [event(1, "a", "zeus"), foreign];
        assert!(reconstruct(&events, &catalog(), &a(), &b()).is_err());
    }

    #[test]
    fn test_same_player_twice_rejected() {
        assert!(reconstruct(&[], &catalog(), &a(), &a()).is_err());
    }

    #[test]
    fn test_spend_overflow_is_malformed() {
        let catalog = Catalog::from_cards([
            Card::new("one", "One", 1),
            Card::new("two", "Two", 1),
            Card::new("huge", "Huge", u32::MAX),
        ])
        .unwrap();
        let events = [event(1, "a", "one"), event(2, "b", "two"), event(3, "a", "huge")];
        let err = reconstruct(&events, &catalog, &a(), &b()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedHistory(msg) if msg.contains("overflows")));
    }
}
