//! Rule parameters for validating picks.
//!
//! Caps and the reserve rule are loaded from configuration and applied per
//! player.

use crate::roll::DEFAULT_DIE_FACES;
use crate::{Card, CoreError, Origin, UnitClass};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Per-player limit on cards carrying a class, optionally only at one cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCap {
    /// Class being limited.
    pub class: UnitClass,
    /// Maximum number of matching cards a player may hold.
    pub max: u32,
    /// When set, only cards of exactly this cost count toward the cap.
    #[serde(default)]
    pub cost: Option<u32>,
}

impl ClassCap {
    /// Caps every card of the class.
    pub fn new(class: UnitClass, max: u32) -> Self {
        Self {
            class,
            max,
            cost: None,
        }
    }

    /// Narrows the cap to a single cost tier.
    pub fn at_cost(mut self, cost: u32) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Returns true if the card counts toward this cap.
    pub fn matches(&self, card: &Card) -> bool {
        card.has_class(self.class) && self.cost.is_none_or(|c| c == card.cost())
    }
}

/// Per-player limit on cards sharing an origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginCap {
    /// Origin being limited.
    pub origin: Origin,
    /// Maximum number of cards of that origin a player may hold.
    pub max: u32,
}

/// Rules applied to every draft created under this configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct RulesConfig {
    /// Points each player may spend.
    points_budget: u32,
    /// Faces on the first-turn die.
    die_faces: u8,
    /// Class caps, checked per player.
    class_caps: Vec<ClassCap>,
    /// Origin caps, checked per player.
    origin_caps: Vec<OriginCap>,
    /// Class a player must keep enough points for until they hold one.
    reserve_for: Option<UnitClass>,
    /// Whether a player must spend the whole budget before the game starts.
    require_full_spend: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            points_budget: 10,
            die_faces: DEFAULT_DIE_FACES,
            class_caps: Vec::new(),
            origin_caps: Vec::new(),
            reserve_for: None,
            require_full_spend: false,
        }
    }
}

impl RulesConfig {
    /// Table rules: one god, one cost-5 monster, points reserved for a god,
    /// and every point spent before play.
    pub fn mythic() -> Self {
        Self::default()
            .with_class_cap(ClassCap::new(UnitClass::God, 1))
            .with_class_cap(ClassCap::new(UnitClass::Monster, 1).at_cost(5))
            .with_reserve_for(Some(UnitClass::God))
            .with_require_full_spend(true)
    }

    /// Sets the points budget.
    pub fn with_points_budget(mut self, points_budget: u32) -> Self {
        self.points_budget = points_budget;
        self
    }

    /// Sets the number of die faces.
    pub fn with_die_faces(mut self, die_faces: u8) -> Self {
        self.die_faces = die_faces;
        self
    }

    /// Adds a class cap.
    pub fn with_class_cap(mut self, cap: ClassCap) -> Self {
        self.class_caps.push(cap);
        self
    }

    /// Adds an origin cap.
    pub fn with_origin_cap(mut self, cap: OriginCap) -> Self {
        self.origin_caps.push(cap);
        self
    }

    /// Sets the reserved class.
    pub fn with_reserve_for(mut self, class: Option<UnitClass>) -> Self {
        self.reserve_for = class;
        self
    }

    /// Sets whether the full budget must be spent.
    pub fn with_require_full_spend(mut self, required: bool) -> Self {
        self.require_full_spend = required;
        self
    }

    /// Rejects settings that cannot produce a playable draft.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.points_budget == 0 {
            return Err(CoreError::InvalidRules("points budget must be positive".into()));
        }
        if self.die_faces < 2 {
            return Err(CoreError::InvalidRules(format!(
                "die needs at least two faces, got {}",
                self.die_faces
            )));
        }
        Ok(())
    }
}
