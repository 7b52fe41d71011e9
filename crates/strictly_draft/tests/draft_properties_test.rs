//! Properties that must hold for every legal draft.
//!
//! Drafts are played out by seeded random players that only ever choose
//! among the validator's legal picks.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use strictly_draft::{
    reconstruct, resolve_first_player, Card, Catalog, ClassCap, DraftHistory, DraftInvariants,
    DraftLog, Draft, DraftStatus, InvariantSet, Origin, OriginCap, PickDecision, PickEvent,
    PickValidator, PlayerId, ProposedPick, ReplayView, RulesConfig, UnitClass,
};

fn catalog() -> Catalog {
    let classes = [UnitClass::God, UnitClass::Monster, UnitClass::Hero, UnitClass::Troop];
    let origins = [Origin::Pantheon, Origin::Ragnarok, Origin::Isfet];
    Catalog::from_cards((0..36).map(|i| {
        Card::new(format!("c{i:02}"), format!("Card {i}"), i % 7)
            .with_class(classes[i as usize % classes.len()])
            .with_origin(origins[i as usize % origins.len()])
    }))
    .expect("Catalog should build")
}

fn rules() -> RulesConfig {
    RulesConfig::default()
        .with_points_budget(15)
        .with_class_cap(ClassCap::new(UnitClass::God, 1))
        .with_origin_cap(OriginCap { origin: Origin::Isfet, max: 2 })
}

/// Plays a full draft and returns it together with its log.
fn play(seed: u64) -> (Draft, DraftLog) {
    let mut rng = StdRng::seed_from_u64(seed);
    let catalog = catalog();
    let rules = rules();
    let (p1, p2) = (PlayerId::from("p1"), PlayerId::from("p2"));
    let mut draft = Draft::invite("d".into(), "s".into(), p1.clone(), p2.clone(), 15).unwrap();
    draft.transition(DraftStatus::Draft).unwrap();
    draft.record_roll(resolve_first_player(&p1, &p2, 6, &mut rng).unwrap());
    let (first, second) = draft.seating().map(|(a, b)| (a.clone(), b.clone())).unwrap();
    let validator = PickValidator::new(&catalog, &rules);
    let mut log = DraftLog::new();

    loop {
        let state = reconstruct(log.events(), &catalog, &first, &second).unwrap();
        if validator.is_complete(&state, &draft) {
            draft.transition(DraftStatus::Available).unwrap();
            break;
        }
        let legal = validator.legal_picks(&state, &draft);
        let card = legal.choose(&mut rng).unwrap().clone();
        let pick = ProposedPick::new(state.next_turn().clone(), card);
        assert_eq!(validator.validate(&state, &draft, &pick), PickDecision::Allowed);
        log.append(PickEvent::new(
            draft.id().clone(),
            pick.player,
            pick.card_id,
            log.next_seq(),
            Utc::now(),
        ))
        .unwrap();
    }
    (draft, log)
}

#[test]
fn test_invariants_hold_after_every_pick() {
    let catalog = catalog();
    for seed in 0..25 {
        let (draft, log) = play(seed);
        let (first, second) = draft.seating().unwrap();
        for len in 0..=log.len() {
            let events = &log.events()[..len];
            let state = reconstruct(events, &catalog, first, second).unwrap();
            let view = ReplayView::new(events, &state, *draft.points_budget());
            assert!(
                DraftInvariants::check_all(&view).is_ok(),
                "seed {seed}, after {len} picks"
            );
        }
    }
}

#[test]
fn test_replay_is_deterministic() {
    let catalog = catalog();
    for seed in 0..10 {
        let (draft, log) = play(seed);
        let (first, second) = draft.seating().unwrap();
        let once = reconstruct(log.events(), &catalog, first, second).unwrap();
        let twice = reconstruct(log.events(), &catalog, first, second).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_caps_respected_by_every_completed_draft() {
    let catalog = catalog();
    for seed in 0..25 {
        let (draft, log) = play(seed);
        let (first, second) = draft.seating().unwrap();
        let state = reconstruct(log.events(), &catalog, first, second).unwrap();
        for ledger in [state.first(), state.second()] {
            assert!(*ledger.spent() <= 15);
            assert!(ledger.class_count(UnitClass::God) <= 1);
            assert!(ledger.origin_count(Origin::Isfet) <= 2);
        }
    }
}

#[test]
fn test_history_blob_replays_to_same_state() {
    let catalog = catalog();
    let (draft, log) = play(11);
    let blob = DraftHistory::new(draft.initial_roll().clone(), log.clone())
        .to_json()
        .unwrap();
    let parsed = DraftHistory::parse(&blob).unwrap();
    let (first, second) = draft.seating().unwrap();
    assert_eq!(
        reconstruct(parsed.log().events(), &catalog, first, second).unwrap(),
        reconstruct(log.events(), &catalog, first, second).unwrap()
    );
    assert_eq!(parsed.initial_roll(), draft.initial_roll());
}

#[test]
fn test_tampered_log_fails_replay() {
    let catalog = catalog();
    let (draft, log) = play(4);
    let (first, second) = draft.seating().unwrap();
    let mut events = log.events().to_vec();
    events.swap(0, 1);
    assert!(reconstruct(&events, &catalog, first, second).is_err());
}
