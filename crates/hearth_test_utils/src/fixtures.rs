//! Test fixtures and helpers.
//!
//! Pre-built game states for consistent testing.

use hearth_core::buildings::{Building, BuildingKind};
use hearth_core::resources::ResourcePool;
use hearth_core::state::GameState;
use hearth_core::Millis;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A fixed epoch (2024-01-01T00:00:00Z) so tests don't depend on the clock.
pub const EPOCH: Millis = 1_704_067_200_000;

/// One hour in milliseconds.
pub const HOUR_MS: Millis = 60 * 60 * 1000;

/// One day in milliseconds.
pub const DAY_MS: Millis = 24 * HOUR_MS;

/// Deterministic RNG for raid rolls.
#[must_use]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Fluent builder for [`GameState`] fixtures.
///
/// Starts from the default new-game state at [`EPOCH`].
#[derive(Debug, Clone)]
pub struct StateBuilder {
    state: GameState,
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBuilder {
    /// A new game at [`EPOCH`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: GameState::new(EPOCH),
        }
    }

    /// Set the last update time.
    #[must_use]
    pub fn at(mut self, now: Millis) -> Self {
        self.state.last_update = now;
        self
    }

    /// Set every resource to `amount`.
    #[must_use]
    pub fn resources(mut self, amount: f64) -> Self {
        self.state.resources = ResourcePool::uniform(amount);
        self
    }

    /// Set the resource pool.
    #[must_use]
    pub fn pool(mut self, pool: ResourcePool) -> Self {
        self.state.resources = pool;
        self
    }

    /// Add a finished building.
    #[must_use]
    pub fn building(mut self, kind: BuildingKind, level: u32) -> Self {
        self.state.buildings.push(Building::new(kind, level));
        self
    }

    /// Set the troop count.
    #[must_use]
    pub fn troops(mut self, troops: u32) -> Self {
        self.state.troops = troops;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> GameState {
        self.state
    }
}

/// New game at [`EPOCH`] with one level-1 producer of each resource.
#[must_use]
pub fn starter_village() -> GameState {
    StateBuilder::new()
        .building(BuildingKind::Woodcutter, 1)
        .building(BuildingKind::Quarry, 1)
        .building(BuildingKind::Farm, 1)
        .build()
}

/// A developed settlement with plenty of stock, troops and a barracks.
#[must_use]
pub fn established_town() -> GameState {
    StateBuilder::new()
        .resources(5_000.0)
        .building(BuildingKind::Woodcutter, 4)
        .building(BuildingKind::Quarry, 3)
        .building(BuildingKind::Farm, 3)
        .building(BuildingKind::Barracks, 2)
        .troops(12)
        .build()
}

/// `count` producers cycling through woodcutter, quarry and farm.
#[must_use]
pub fn sprawl(count: usize, level: u32) -> GameState {
    const PRODUCERS: [BuildingKind; 3] = [
        BuildingKind::Woodcutter,
        BuildingKind::Quarry,
        BuildingKind::Farm,
    ];
    let mut state = GameState::new(EPOCH);
    state.buildings = (0..count)
        .map(|i| Building::new(PRODUCERS[i % PRODUCERS.len()], level))
        .collect();
    state
}
