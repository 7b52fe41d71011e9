//! Card catalog: the immutable reference set every draft picks from.

use crate::{CardId, CoreError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// Unit type of a card. A card usually carries exactly one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnitClass {
    /// A god; the unit a player must protect.
    God,
    /// A titan.
    Titan,
    /// A monster.
    Monster,
    /// A hero.
    Hero,
    /// A troop.
    Troop,
    /// An attachment for troops.
    TroopAttachment,
    /// A jarl.
    Jarl,
    /// An art-of-war card.
    ArtOfWar,
}

/// Game line a card was published in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Origin {
    /// Greek pantheon line.
    Pantheon,
    /// Norse line.
    Ragnarok,
    /// Egyptian line.
    Isfet,
}

/// A single card. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    name: String,
    cost: u32,
    #[serde(default)]
    origin: Option<Origin>,
    #[serde(default)]
    classes: BTreeSet<UnitClass>,
    #[serde(default)]
    talents: BTreeSet<String>,
}

impl Card {
    /// Creates a card with no origin, classes or talents.
    pub fn new(id: impl Into<CardId>, name: impl Into<String>, cost: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost,
            origin: None,
            classes: BTreeSet::new(),
            talents: BTreeSet::new(),
        }
    }

    /// Sets the origin tag.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Adds a class tag.
    pub fn with_class(mut self, class: UnitClass) -> Self {
        self.classes.insert(class);
        self
    }

    /// Adds a talent tag.
    pub fn with_talent(mut self, talent: impl Into<String>) -> Self {
        self.talents.insert(talent.into());
        self
    }

    /// Card identifier.
    pub fn id(&self) -> &CardId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point cost.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Origin tag, if any.
    pub fn origin(&self) -> Option<Origin> {
        self.origin
    }

    /// Class tags.
    pub fn classes(&self) -> &BTreeSet<UnitClass> {
        &self.classes
    }

    /// Talent tags.
    pub fn talents(&self) -> &BTreeSet<String> {
        &self.talents
    }

    /// Returns true if the card carries the class tag.
    pub fn has_class(&self, class: UnitClass) -> bool {
        self.classes.contains(&class)
    }

    /// The class used to bucket the card during pool generation.
    pub fn primary_class(&self) -> Option<UnitClass> {
        self.classes.iter().next().copied()
    }
}

/// Lookup of all known cards by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    cards: BTreeMap<CardId, Card>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids.
    #[instrument(skip(cards))]
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Result<Self, CoreError> {
        let mut map = BTreeMap::new();
        for card in cards {
            if let Some(existing) = map.insert(card.id.clone(), card) {
                return Err(CoreError::InvalidCatalog(format!(
                    "duplicate card id '{}'",
                    existing.id
                )));
            }
        }
        debug!(count = map.len(), "Catalog built");
        Ok(Self { cards: map })
    }

    /// Parses a JSON array of cards.
    #[instrument(skip(json), fields(bytes = json.len()))]
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let cards: Vec<Card> = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidCatalog(format!("cannot parse cards: {}", e)))?;
        Self::from_cards(cards)
    }

    /// Restricts the catalog to the given ids (a draft's pool).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCatalog`] if an id is unknown.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub fn subset(&self, ids: &[CardId]) -> Result<Self, CoreError> {
        let mut cards = BTreeMap::new();
        for id in ids {
            let card = self
                .get(id)
                .ok_or_else(|| CoreError::InvalidCatalog(format!("pool card '{}' not in catalog", id)))?;
            cards.insert(id.clone(), card.clone());
        }
        Ok(Self { cards })
    }

    /// Looks up a card.
    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Returns true if the id is known.
    pub fn contains(&self, id: &CardId) -> bool {
        self.cards.contains_key(id)
    }

    /// Iterates over cards in id order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// Iterates over ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &CardId> {
        self.cards.keys()
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns true if there are no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
