//! Pick validation engine.
//!
//! Checks run in a fixed order and the first failure wins, so each denial
//! carries exactly one unambiguous reason. Nothing here mutates state.

use crate::{
    Card, CardId, Catalog, CoreError, DerivedDraftState, Draft, ErrorClass, PlayerId,
    PlayerLedger, RulesConfig, UnitClass,
};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A player asking to take a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct ProposedPick {
    /// Player making the pick.
    pub player: PlayerId,
    /// Card requested.
    pub card_id: CardId,
}

/// Why a pick was refused.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
pub enum DenyReason {
    /// The player is not on turn.
    #[display("It is not this player's turn")]
    WrongTurn,
    /// The card was already taken by either player.
    #[display("Card already picked")]
    CardAlreadyPicked,
    /// The card is not part of this draft's catalog.
    #[display("Card not found")]
    CardNotFound,
    /// The card costs more than the player has left.
    #[display("Points budget exceeded")]
    BudgetExceeded,
    /// The player already holds the maximum for the card's origin.
    #[display("Origin limit reached")]
    OriginCapExceeded,
    /// The player already holds the maximum for one of the card's classes.
    #[display("Class limit reached")]
    ClassCapExceeded,
    /// Taking the card would leave too few points for a required class.
    #[display("Points must be kept for a required card")]
    ReserveRequired,
}

impl DenyReason {
    /// Classifies the denial for the caller.
    ///
    /// A card missing from the catalog means client and server disagree on
    /// the card set, which is a data problem rather than a bad move.
    pub fn class(self) -> ErrorClass {
        match self {
            DenyReason::CardNotFound => ErrorClass::Fatal,
            DenyReason::WrongTurn
            | DenyReason::CardAlreadyPicked
            | DenyReason::BudgetExceeded
            | DenyReason::OriginCapExceeded
            | DenyReason::ClassCapExceeded
            | DenyReason::ReserveRequired => ErrorClass::UserActionable,
        }
    }
}

/// Outcome of validating a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickDecision {
    /// The pick may be appended.
    Allowed,
    /// The pick must not be appended.
    Denied(DenyReason),
}

impl PickDecision {
    /// Returns true for [`PickDecision::Allowed`].
    pub fn is_allowed(self) -> bool {
        matches!(self, PickDecision::Allowed)
    }
}

/// Whether a player may start a game with what they drafted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readiness {
    /// Nothing is missing.
    Ready,
    /// The player holds no card of a required class.
    MissingClass(UnitClass),
    /// The player still has points to spend.
    PointsUnspent(u32),
}

// Each precondition below is one step of the ordered check.

struct OnTurn;

impl OnTurn {
    fn check(state: &DerivedDraftState, pick: &ProposedPick) -> Result<(), DenyReason> {
        if state.next_turn() == &pick.player {
            Ok(())
        } else {
            Err(DenyReason::WrongTurn)
        }
    }
}

struct NotYetPicked;

impl NotYetPicked {
    fn check(state: &DerivedDraftState, pick: &ProposedPick) -> Result<(), DenyReason> {
        if state.picked().contains(&pick.card_id) {
            Err(DenyReason::CardAlreadyPicked)
        } else {
            Ok(())
        }
    }
}

struct WithinBudget;

impl WithinBudget {
    fn check(ledger: &PlayerLedger, card: &Card, budget: u32) -> Result<(), DenyReason> {
        match ledger.spent().checked_add(card.cost()) {
            Some(total) if total <= budget => Ok(()),
            _ => Err(DenyReason::BudgetExceeded),
        }
    }
}

struct WithinOriginCaps;

impl WithinOriginCaps {
    fn check(ledger: &PlayerLedger, card: &Card, rules: &RulesConfig) -> Result<(), DenyReason> {
        let Some(origin) = card.origin() else {
            return Ok(());
        };
        let exceeded = rules
            .origin_caps()
            .iter()
            .any(|cap| cap.origin == origin && ledger.origin_count(origin) >= cap.max);
        if exceeded {
            Err(DenyReason::OriginCapExceeded)
        } else {
            Ok(())
        }
    }
}

struct WithinClassCaps;

impl WithinClassCaps {
    fn check(
        ledger: &PlayerLedger,
        card: &Card,
        rules: &RulesConfig,
        catalog: &Catalog,
    ) -> Result<(), DenyReason> {
        for cap in rules.class_caps().iter().filter(|cap| cap.matches(card)) {
            let held = ledger
                .cards()
                .iter()
                .filter_map(|id| catalog.get(id))
                .filter(|owned| cap.matches(owned))
                .count();
            if held >= cap.max as usize {
                return Err(DenyReason::ClassCapExceeded);
            }
        }
        Ok(())
    }
}

struct KeepsReserve;

impl KeepsReserve {
    fn check(
        state: &DerivedDraftState,
        ledger: &PlayerLedger,
        card: &Card,
        budget: u32,
        rules: &RulesConfig,
        catalog: &Catalog,
    ) -> Result<(), DenyReason> {
        let Some(class) = *rules.reserve_for() else {
            return Ok(());
        };
        if ledger.holds_class(class) || card.has_class(class) {
            return Ok(());
        }
        let cheapest = state
            .remaining()
            .iter()
            .filter(|id| *id != card.id())
            .filter_map(|id| catalog.get(id))
            .filter(|c| c.has_class(class))
            .map(Card::cost)
            .min();
        match cheapest {
            Some(cost) => {
                let total = ledger
                    .spent()
                    .checked_add(card.cost())
                    .and_then(|spent| spent.checked_add(cost));
                match total {
                    Some(total) if total <= budget => Ok(()),
                    _ => Err(DenyReason::ReserveRequired),
                }
            }
            None => Ok(()),
        }
    }
}

/// Decides whether picks are legal under a catalog and a rule set.
#[derive(Debug, Clone, Copy, new)]
pub struct PickValidator<'a> {
    catalog: &'a Catalog,
    rules: &'a RulesConfig,
}

impl<'a> PickValidator<'a> {
    /// Validates a proposed pick against the derived state.
    ///
    /// Order: turn, already picked, unknown card, budget, origin caps, class
    /// caps, reserve.
    #[instrument(skip(self, state, draft), fields(player = %pick.player, card = %pick.card_id))]
    pub fn validate(
        &self,
        state: &DerivedDraftState,
        draft: &Draft,
        pick: &ProposedPick,
    ) -> PickDecision {
        match self.check(state, *draft.points_budget(), pick) {
            Ok(()) => {
                debug!("Pick allowed");
                PickDecision::Allowed
            }
            Err(reason) => {
                debug!(reason = %reason, "Pick denied");
                PickDecision::Denied(reason)
            }
        }
    }

    fn check(
        &self,
        state: &DerivedDraftState,
        budget: u32,
        pick: &ProposedPick,
    ) -> Result<(), DenyReason> {
        OnTurn::check(state, pick)?;
        NotYetPicked::check(state, pick)?;
        let card = self
            .catalog
            .get(&pick.card_id)
            .ok_or(DenyReason::CardNotFound)?;
        let ledger = state.mover();
        WithinBudget::check(ledger, card, budget)?;
        WithinOriginCaps::check(ledger, card, self.rules)?;
        WithinClassCaps::check(ledger, card, self.rules, self.catalog)?;
        KeepsReserve::check(state, ledger, card, budget, self.rules, self.catalog)?;
        Ok(())
    }

    /// Every remaining card the player on turn may take.
    pub fn legal_picks(&self, state: &DerivedDraftState, draft: &Draft) -> Vec<CardId> {
        let budget = *draft.points_budget();
        state
            .remaining()
            .iter()
            .filter(|id| {
                let pick = ProposedPick::new(state.next_turn().clone(), (*id).clone());
                self.check(state, budget, &pick).is_ok()
            })
            .cloned()
            .collect()
    }

    /// Returns true once drafting is over: both players spent everything, or
    /// the player on turn has nothing legal to take.
    #[instrument(skip_all)]
    pub fn is_complete(&self, state: &DerivedDraftState, draft: &Draft) -> bool {
        let budget = *draft.points_budget();
        let all_spent = *state.first().spent() == budget && *state.second().spent() == budget;
        all_spent || self.legal_picks(state, draft).is_empty()
    }

    /// Checks whether a player may start a game with their drafted cards.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownPlayer`] if the player is not drafting.
    pub fn readiness(
        &self,
        state: &DerivedDraftState,
        draft: &Draft,
        player: &PlayerId,
    ) -> Result<Readiness, CoreError> {
        let ledger = state
            .ledger(player)
            .ok_or_else(|| CoreError::UnknownPlayer(player.to_string()))?;
        if let Some(class) = *self.rules.reserve_for() {
            if !ledger.holds_class(class) {
                return Ok(Readiness::MissingClass(class));
            }
        }
        let left = ledger.remaining(*draft.points_budget());
        if *self.rules.require_full_spend() && left > 0 {
            return Ok(Readiness::PointsUnspent(left));
        }
        Ok(Readiness::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassCap, DraftStatus, Origin, OriginCap, reconstruct, resolve_from_throws};

    fn catalog() -> Catalog {
        Catalog::from_cards([
            Card::new("zeus", "Zeus", 6).with_class(UnitClass::God).with_origin(Origin::Pantheon),
            Card::new("odin", "Odin", 5).with_class(UnitClass::God).with_origin(Origin::Ragnarok),
            Card::new("hydra", "Hydra", 5).with_class(UnitClass::Monster).with_origin(Origin::Pantheon),
            Card::new("fenrir", "Fenrir", 5).with_class(UnitClass::Monster).with_origin(Origin::Ragnarok),
            Card::new("hoplite", "Hoplite", 2).with_class(UnitClass::Troop).with_origin(Origin::Pantheon),
            Card::new("archer", "Archer", 1).with_class(UnitClass::Troop).with_origin(Origin::Ragnarok),
        ])
        .unwrap()
    }

    fn draft(budget: u32) -> Draft {
        let mut draft = Draft::invite("d".into(), "s".into(), "a".into(), "b".into(), budget).unwrap();
        draft.transition(DraftStatus::Draft).unwrap();
        draft.record_roll(resolve_from_throws(&"a".into(), &"b".into(), [(6, 1)]).unwrap());
        draft
    }

    fn state(catalog: &Catalog, picks: &[(&str, &str)]) -> DerivedDraftState {
        let events: Vec<_> = picks
            .iter()
            .enumerate()
            .map(|(i, (player, card))| {
                crate::PickEvent::new(
                    "d".into(),
                    (*player).into(),
                    (*card).into(),
                    i as u64 + 1,
                    chrono::Utc::now(),
                )
            })
            .collect();
        reconstruct(&events, catalog, &"a".into(), &"b".into()).unwrap()
    }

    fn pick(player: &str, card: &str) -> ProposedPick {
        ProposedPick::new(player.into(), card.into())
    }

    #[test]
    fn test_wrong_turn_checked_before_everything() {
        let catalog = catalog();
        let rules = RulesConfig::default();
        let validator = PickValidator::new(&catalog, &rules);
        let state = state(&catalog, &[("a", "zeus")]);
        // Already picked and unknown, but the turn check wins.
        assert_eq!(
            validator.validate(&state, &draft(10), &pick("a", "zeus")),
            PickDecision::Denied(DenyReason::WrongTurn)
        );
        assert_eq!(
            validator.validate(&state, &draft(10), &pick("a", "nope")),
            PickDecision::Denied(DenyReason::WrongTurn)
        );
    }

    #[test]
    fn test_unknown_card_is_fatal_denial() {
        let catalog = catalog();
        let rules = RulesConfig::default();
        let validator = PickValidator::new(&catalog, &rules);
        let decision = validator.validate(&state(&catalog, &[]), &draft(10), &pick("a", "nope"));
        assert_eq!(decision, PickDecision::Denied(DenyReason::CardNotFound));
        assert_eq!(DenyReason::CardNotFound.class(), ErrorClass::Fatal);
    }

    #[test]
    fn test_origin_cap_checked_before_class_cap() {
        let catalog = catalog();
        let rules = RulesConfig::default()
            .with_points_budget(20)
            .with_origin_cap(OriginCap { origin: Origin::Pantheon, max: 1 })
            .with_class_cap(ClassCap::new(UnitClass::God, 1));
        let validator = PickValidator::new(&catalog, &rules);
        let state = state(&catalog, &[("a", "zeus"), ("b", "archer")]);
        assert_eq!(
            validator.validate(&state, &draft(20), &pick("a", "hydra")),
            PickDecision::Denied(DenyReason::OriginCapExceeded)
        );
        assert_eq!(
            validator.validate(&state, &draft(20), &pick("a", "odin")),
            PickDecision::Denied(DenyReason::ClassCapExceeded)
        );
    }

    #[test]
    fn test_cost_tier_cap_allows_other_tiers() {
        let catalog = catalog();
        let rules = RulesConfig::default()
            .with_class_cap(ClassCap::new(UnitClass::Monster, 1).at_cost(5))
            .with_class_cap(ClassCap::new(UnitClass::Troop, 1).at_cost(5));
        let validator = PickValidator::new(&catalog, &rules);
        let state = state(&catalog, &[("a", "hydra"), ("b", "archer")]);
        assert_eq!(
            validator.validate(&state, &draft(20), &pick("a", "fenrir")),
            PickDecision::Denied(DenyReason::ClassCapExceeded)
        );
        assert!(validator.validate(&state, &draft(20), &pick("a", "hoplite")).is_allowed());
    }

    #[test]
    fn test_reserve_blocks_pick_that_prices_out_a_god() {
        let catalog = catalog();
        let rules = RulesConfig::mythic();
        let validator = PickValidator::new(&catalog, &rules);
        let state = state(&catalog, &[]);
        // Hydra plus the cheapest remaining god costs 10.
        assert!(validator.validate(&state, &draft(10), &pick("a", "hydra")).is_allowed());
        assert_eq!(
            validator.validate(&state, &draft(9), &pick("a", "hydra")),
            PickDecision::Denied(DenyReason::ReserveRequired)
        );
        assert!(validator.validate(&state, &draft(9), &pick("a", "zeus")).is_allowed());
    }

    #[test]
    fn test_legal_picks_respect_budget() {
        let catalog = catalog();
        let rules = RulesConfig::default();
        let validator = PickValidator::new(&catalog, &rules);
        let state = state(&catalog, &[("a", "zeus"), ("b", "odin")]);
        let legal = validator.legal_picks(&state, &draft(8));
        assert_eq!(legal, vec![CardId::from("archer"), CardId::from("hoplite")]);
    }

    #[test]
    fn test_complete_when_mover_has_no_legal_pick() {
        let catalog = catalog();
        let rules = RulesConfig::default();
        let validator = PickValidator::new(&catalog, &rules);
        let state = state(&catalog, &[("a", "zeus"), ("b", "odin")]);
        assert!(!validator.is_complete(&state, &draft(7)));
        assert!(validator.is_complete(&state, &draft(6)));
    }

    #[test]
    fn test_readiness_reports_missing_god_then_points() {
        let catalog = catalog();
        let rules = RulesConfig::mythic();
        let validator = PickValidator::new(&catalog, &rules);
        let state = state(&catalog, &[("a", "hoplite"), ("b", "odin")]);
        assert_eq!(
            validator.readiness(&state, &draft(10), &"a".into()).unwrap(),
            Readiness::MissingClass(UnitClass::God)
        );
        assert_eq!(
            validator.readiness(&state, &draft(10), &"b".into()).unwrap(),
            Readiness::PointsUnspent(5)
        );
        assert_eq!(
            validator.readiness(&state, &draft(5), &"b".into()).unwrap(),
            Readiness::Ready
        );
        assert!(validator.readiness(&state, &draft(10), &"c".into()).is_err());
    }

    #[test]
    fn test_cost_past_u32_is_over_budget() {
        let catalog = Catalog::from_cards([
            Card::new("one", "One", 1),
            Card::new("two", "Two", 1),
            Card::new("huge", "Huge", u32::MAX),
        ])
        .unwrap();
        let rules = RulesConfig::default();
        let validator = PickValidator::new(&catalog, &rules);
        let state = state(&catalog, &[("a", "one"), ("b", "two")]);
        assert_eq!(
            validator.validate(&state, &draft(10), &pick("a", "huge")),
            PickDecision::Denied(DenyReason::BudgetExceeded)
        );
        assert!(validator.legal_picks(&state, &draft(10)).is_empty());
    }

    #[test]
    fn test_reserve_for_unaffordable_god_denies() {
        let catalog = Catalog::from_cards([
            Card::new("titan-god", "Titan God", u32::MAX).with_class(UnitClass::God),
            Card::new("archer", "Archer", 1).with_class(UnitClass::Troop),
        ])
        .unwrap();
        let rules = RulesConfig::default().with_reserve_for(Some(UnitClass::God));
        let validator = PickValidator::new(&catalog, &rules);
        assert_eq!(
            validator.validate(&state(&catalog, &[]), &draft(u32::MAX), &pick("a", "archer")),
            PickDecision::Denied(DenyReason::ReserveRequired)
        );
    }
}
