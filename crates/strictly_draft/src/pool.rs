//! Draft pool generation.
//!
//! Builds the random subset of the catalog a draft picks from. Titans, gods
//! and troop attachments are drawn in fixed amounts and do not count toward
//! the pool size; monsters, heroes and troops are then drawn in rotation
//! until their combined cost reaches the size.

use crate::{Card, CardId, Catalog, Origin, UnitClass};
use derive_getters::Getters;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Upper bound on fill rounds.
pub const MAX_POOL_ITERATIONS: u32 = 10_000;

/// Monsters that share a name with a titan; drawing the titan removes them.
const TITAN_MONSTER_PAIRS: &[&str] = &["Fenrir", "Ammit", "Kraken"];

/// Heroes printed in several variants; drawing one removes the others.
const HERO_VARIANTS: &[&str] = &["Achilles", "Heracles", "Lagertha"];

/// Shape of a generated pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct PoolConfig {
    /// Combined cost of the monsters, heroes and troops to draw.
    draft_size: u32,
    /// Gods to draw.
    gods_amount: u32,
    /// Titans to draw.
    titans_amount: u32,
    /// Troop attachments to draw.
    troop_attachment_amount: u32,
    /// Origins to draw from; empty means every origin.
    origins: Vec<Origin>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            draft_size: 30,
            gods_amount: 2,
            titans_amount: 1,
            troop_attachment_amount: 0,
            origins: Vec::new(),
        }
    }
}

impl PoolConfig {
    /// Creates a config with no fixed-amount draws and every origin.
    pub fn new(draft_size: u32) -> Self {
        Self {
            draft_size,
            gods_amount: 0,
            titans_amount: 0,
            troop_attachment_amount: 0,
            origins: Vec::new(),
        }
    }

    /// Sets the number of gods.
    pub fn with_gods(mut self, amount: u32) -> Self {
        self.gods_amount = amount;
        self
    }

    /// Sets the number of titans.
    pub fn with_titans(mut self, amount: u32) -> Self {
        self.titans_amount = amount;
        self
    }

    /// Sets the number of troop attachments.
    pub fn with_troop_attachments(mut self, amount: u32) -> Self {
        self.troop_attachment_amount = amount;
        self
    }

    /// Restricts the pool to the given origins.
    pub fn with_origins(mut self, origins: Vec<Origin>) -> Self {
        self.origins = origins;
        self
    }

    fn admits(&self, card: &Card) -> bool {
        self.origins.is_empty() || card.origin().is_some_and(|o| self.origins.contains(&o))
    }
}

/// A generated pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct DraftPool {
    /// Cards in draw order.
    card_ids: Vec<CardId>,
    /// Combined cost of the size-counted cards.
    total_cost: u32,
}

/// Pool generation failures.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PoolError {
    /// Nothing in the catalog passed the cost and origin filters.
    #[display("No cards match the pool filters")]
    NoCandidates,

    /// Every pool ran dry before the size was reached.
    #[display("Not enough units for the draft size: reached {} of {}", reached, wanted)]
    NotEnoughCards {
        /// Cost reached.
        reached: u32,
        /// Size requested.
        wanted: u32,
    },

    /// The fill loop hit [`MAX_POOL_ITERATIONS`].
    #[display("Pool generation exceeded {} iterations", _0)]
    IterationLimit(u32),
}

impl std::error::Error for PoolError {}

#[derive(Default)]
struct Buckets<'a> {
    titans: Vec<&'a Card>,
    gods: Vec<&'a Card>,
    monsters: Vec<&'a Card>,
    heroes: Vec<&'a Card>,
    troops: Vec<&'a Card>,
    troop_attachments: Vec<&'a Card>,
}

impl<'a> Buckets<'a> {
    fn sort(cards: impl IntoIterator<Item = &'a Card>) -> Self {
        let mut buckets = Self::default();
        for card in cards {
            let bucket = match card.primary_class() {
                Some(UnitClass::Titan) => &mut buckets.titans,
                Some(UnitClass::God) => &mut buckets.gods,
                Some(UnitClass::Monster) => &mut buckets.monsters,
                Some(UnitClass::Hero) => &mut buckets.heroes,
                Some(UnitClass::Troop) => &mut buckets.troops,
                Some(UnitClass::TroopAttachment) => &mut buckets.troop_attachments,
                Some(UnitClass::Jarl | UnitClass::ArtOfWar) | None => continue,
            };
            bucket.push(card);
        }
        buckets
    }
}

fn take_random<'a, R: Rng + ?Sized>(pool: &mut Vec<&'a Card>, rng: &mut R) -> Option<&'a Card> {
    if pool.is_empty() {
        None
    } else {
        Some(pool.remove(rng.gen_range(0..pool.len())))
    }
}

/// Draws an affordable card if there is one; otherwise discards a random card
/// so the loop keeps shrinking the pool. The flag says whether it was kept.
fn take_affordable<'a, R: Rng + ?Sized>(
    pool: &mut Vec<&'a Card>,
    size: u32,
    draft_size: u32,
    rng: &mut R,
) -> Option<(&'a Card, bool)> {
    let affordable: Vec<usize> = pool
        .iter()
        .enumerate()
        .filter(|(_, card)| size.checked_add(card.cost()).is_some_and(|s| s <= draft_size))
        .map(|(i, _)| i)
        .collect();
    if affordable.is_empty() {
        return take_random(pool, rng).map(|card| (card, false));
    }
    let index = affordable[rng.gen_range(0..affordable.len())];
    Some((pool.remove(index), true))
}

fn exclude_variants(chosen: &Card, pool: &mut Vec<&Card>, names: &[&str]) {
    if let Some(name) = names.iter().find(|n| chosen.name().contains(*n)) {
        pool.retain(|card| !card.name().contains(name));
    }
}

/// Generates a pool from the catalog.
///
/// # Errors
///
/// Returns [`PoolError::NoCandidates`] if the filters leave nothing,
/// [`PoolError::NotEnoughCards`] if every size-counted bucket empties before
/// the size is reached, and [`PoolError::IterationLimit`] if the fill loop
/// does not settle.
#[instrument(skip(catalog, rng), fields(catalog = catalog.len()))]
pub fn generate_pool<R: Rng + ?Sized>(
    catalog: &Catalog,
    config: &PoolConfig,
    rng: &mut R,
) -> Result<DraftPool, PoolError> {
    let candidates: Vec<&Card> = catalog
        .cards()
        .filter(|card| card.cost() > 0 && config.admits(card))
        .collect();
    if candidates.is_empty() {
        return Err(PoolError::NoCandidates);
    }
    let mut buckets = Buckets::sort(candidates);
    let mut card_ids = Vec::new();

    for _ in 0..config.titans_amount {
        let Some(titan) = take_random(&mut buckets.titans, rng) else {
            break;
        };
        exclude_variants(titan, &mut buckets.monsters, TITAN_MONSTER_PAIRS);
        card_ids.push(titan.id().clone());
    }
    for (bucket, amount) in [
        (&mut buckets.gods, config.gods_amount),
        (&mut buckets.troop_attachments, config.troop_attachment_amount),
    ] {
        for _ in 0..amount {
            let Some(card) = take_random(bucket, rng) else {
                break;
            };
            card_ids.push(card.id().clone());
        }
    }
    debug!(fixed = card_ids.len(), "Fixed-amount units drawn");

    let mut rotation = [
        (buckets.monsters, None),
        (buckets.heroes, Some(HERO_VARIANTS)),
        (buckets.troops, None),
    ];
    let mut size = 0;
    let mut iterations = 0;

    while size < config.draft_size {
        if iterations >= MAX_POOL_ITERATIONS {
            warn!(size, "Pool generation did not settle");
            return Err(PoolError::IterationLimit(MAX_POOL_ITERATIONS));
        }
        iterations += 1;
        let mut progressed = false;

        for (pool, variants) in rotation.iter_mut() {
            let Some((card, kept)) = take_affordable(pool, size, config.draft_size, rng) else {
                continue;
            };
            if kept {
                card_ids.push(card.id().clone());
                size += card.cost();
                progressed = true;
            }
            if let Some(names) = *variants {
                exclude_variants(card, pool, names);
            }
        }

        if rotation.iter().all(|(pool, _)| pool.is_empty()) {
            if size < config.draft_size {
                warn!(size, wanted = config.draft_size, "Ran out of units");
                return Err(PoolError::NotEnoughCards {
                    reached: size,
                    wanted: config.draft_size,
                });
            }
            break;
        }
        if !progressed {
            break;
        }
    }

    info!(cards = card_ids.len(), total_cost = size, "Draft pool generated");
    Ok(DraftPool {
        card_ids,
        total_cost: size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog() -> Catalog {
        Catalog::from_cards([
            Card::new("zeus", "Zeus", 6).with_class(UnitClass::God).with_origin(Origin::Pantheon),
            Card::new("odin", "Odin", 6).with_class(UnitClass::God).with_origin(Origin::Ragnarok),
            Card::new("t-fenrir", "Fenrir the Titan", 8).with_class(UnitClass::Titan).with_origin(Origin::Ragnarok),
            Card::new("m-fenrir", "Fenrir", 4).with_class(UnitClass::Monster).with_origin(Origin::Ragnarok),
            Card::new("hydra", "Hydra", 3).with_class(UnitClass::Monster).with_origin(Origin::Pantheon),
            Card::new("achilles-1", "Achilles", 2).with_class(UnitClass::Hero).with_origin(Origin::Pantheon),
            Card::new("achilles-2", "Achilles Reborn", 2).with_class(UnitClass::Hero).with_origin(Origin::Pantheon),
            Card::new("hoplite", "Hoplite", 1).with_class(UnitClass::Troop).with_origin(Origin::Pantheon),
            Card::new("berserker", "Berserker", 1).with_class(UnitClass::Troop).with_origin(Origin::Ragnarok),
            Card::new("token", "Token", 0).with_class(UnitClass::Troop),
        ])
        .unwrap()
    }

    fn ids(pool: &DraftPool) -> Vec<&str> {
        pool.card_ids().iter().map(CardId::as_str).collect()
    }

    #[test]
    fn test_titan_removes_its_monster() {
        let config = PoolConfig::new(4).with_titans(1);
        for seed in 0..20 {
            let pool = generate_pool(&catalog(), &config, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert!(ids(&pool).contains(&"t-fenrir"));
            assert!(!ids(&pool).contains(&"m-fenrir"));
        }
    }

    #[test]
    fn test_hero_variants_are_exclusive() {
        let config = PoolConfig::new(6);
        for seed in 0..20 {
            let pool = generate_pool(&catalog(), &config, &mut StdRng::seed_from_u64(seed)).unwrap();
            let heroes = ids(&pool).iter().filter(|id| id.starts_with("achilles")).count();
            assert!(heroes <= 1, "seed {seed}: {:?}", ids(&pool));
        }
    }

    #[test]
    fn test_fixed_units_do_not_count_toward_size() {
        let config = PoolConfig::new(2).with_gods(2);
        let pool = generate_pool(&catalog(), &config, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(*pool.total_cost(), 2);
        assert!(ids(&pool).contains(&"zeus"));
        assert!(ids(&pool).contains(&"odin"));
    }

    #[test]
    fn test_zero_cost_cards_never_drawn() {
        let config = PoolConfig::new(11);
        let pool = generate_pool(&catalog(), &config, &mut StdRng::seed_from_u64(5)).unwrap();
        assert!(!ids(&pool).contains(&"token"));
    }

    #[test]
    fn test_origin_filter_excludes_untagged_cards() {
        let config = PoolConfig::new(1).with_origins(vec![Origin::Ragnarok]);
        let pool = generate_pool(&catalog(), &config, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(ids(&pool), vec!["berserker"]);
    }

    #[test]
    fn test_not_enough_units() {
        let config = PoolConfig::new(100);
        let err = generate_pool(&catalog(), &config, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, PoolError::NotEnoughCards { wanted: 100, .. }));
    }

    #[test]
    fn test_same_seed_same_pool() {
        let config = PoolConfig::new(6).with_gods(1);
        let a = generate_pool(&catalog(), &config, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = generate_pool(&catalog(), &config, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_filter_result() {
        let catalog = Catalog::from_cards([Card::new("token", "Token", 0)]).unwrap();
        let err = generate_pool(&catalog, &PoolConfig::new(1), &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert_eq!(err, PoolError::NoCandidates);
    }

    #[test]
    fn test_huge_cost_never_fits() {
        let catalog = Catalog::from_cards([
            Card::new("huge", "Huge", u32::MAX).with_class(UnitClass::Troop),
            Card::new("a", "A", 1).with_class(UnitClass::Troop),
            Card::new("b", "B", 1).with_class(UnitClass::Troop),
            Card::new("c", "C", 1).with_class(UnitClass::Troop),
        ])
        .unwrap();
        let pool = generate_pool(&catalog, &PoolConfig::new(3), &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(*pool.total_cost(), 3);
        assert!(!ids(&pool).contains(&"huge"));
    }
}
