//! Resource kinds, the player's resource pool, and cost bundles.
//!
//! Pool quantities are real-valued because accrual is continuous. Costs and
//! raid rewards are whole numbers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A kind of resource the settlement stockpiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Produced by woodcutters.
    Wood,
    /// Produced by quarries.
    Stone,
    /// Produced by farms.
    Food,
}

impl ResourceKind {
    /// Every resource kind, in display order.
    pub const ALL: [Self; 3] = [Self::Wood, Self::Stone, Self::Food];

    /// Lowercase key used in saves and status output.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Wood => "wood",
            Self::Stone => "stone",
            Self::Food => "food",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Whole-number amount of each resource, used for costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Wood required.
    pub wood: u64,
    /// Stone required.
    pub stone: u64,
    /// Food required.
    pub food: u64,
}

impl Cost {
    /// Create a cost bundle.
    #[must_use]
    pub const fn new(wood: u64, stone: u64, food: u64) -> Self {
        Self { wood, stone, food }
    }

    /// Amount of a single resource.
    #[must_use]
    pub const fn amount(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
            ResourceKind::Food => self.food,
        }
    }

    /// Build a cost by computing each resource independently.
    #[must_use]
    pub fn from_fn(mut f: impl FnMut(ResourceKind) -> u64) -> Self {
        Self {
            wood: f(ResourceKind::Wood),
            stone: f(ResourceKind::Stone),
            food: f(ResourceKind::Food),
        }
    }
}

/// Reward paid out when a raid returns. Rolled once at launch.
pub type RaidReward = BTreeMap<ResourceKind, u64>;

/// The player's stockpile.
///
/// Missing entries in an older save deserialize as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePool {
    /// Wood on hand.
    pub wood: f64,
    /// Stone on hand.
    pub stone: f64,
    /// Food on hand.
    pub food: f64,
}

impl ResourcePool {
    /// Create a pool with explicit amounts.
    #[must_use]
    pub const fn new(wood: f64, stone: f64, food: f64) -> Self {
        Self { wood, stone, food }
    }

    /// Create a pool with the same amount of every resource.
    #[must_use]
    pub const fn uniform(amount: f64) -> Self {
        Self::new(amount, amount, amount)
    }

    /// Current quantity of a resource.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
            ResourceKind::Food => self.food,
        }
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> &mut f64 {
        match kind {
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Stone => &mut self.stone,
            ResourceKind::Food => &mut self.food,
        }
    }

    /// Add to a resource. Negative or non-finite amounts are ignored.
    pub fn add(&mut self, kind: ResourceKind, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            *self.slot_mut(kind) += amount;
        }
    }

    /// Add every entry of a raid reward.
    pub fn deposit(&mut self, reward: &RaidReward) {
        for (&kind, &amount) in reward {
            self.add(kind, amount as f64);
        }
    }

    /// Check if every component of `cost` is covered.
    #[must_use]
    pub fn can_afford(&self, cost: &Cost) -> bool {
        ResourceKind::ALL
            .iter()
            .all(|&kind| self.get(kind) >= cost.amount(kind) as f64)
    }

    /// Spend `cost` if affordable.
    ///
    /// Returns true if the transaction succeeded. On failure nothing is
    /// deducted.
    pub fn spend(&mut self, cost: &Cost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for kind in ResourceKind::ALL {
            *self.slot_mut(kind) -= cost.amount(kind) as f64;
        }
        true
    }
}
