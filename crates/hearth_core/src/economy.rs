//! Economy calculator: level scaling for costs and durations.
//!
//! Every level costs 50% more and takes 60% longer than the previous one,
//! while output only grows linearly with level. All functions here are pure.

use crate::buildings::{Building, BuildingKind};
use crate::resources::{Cost, ResourceKind, ResourcePool};
use crate::Millis;

/// Cost growth per level.
pub const COST_MULTIPLIER: f64 = 1.5;

/// Construction time growth per level.
pub const TIME_MULTIPLIER: f64 = 1.6;

/// Cost of training one troop.
pub const TROOP_COST: Cost = Cost::new(15, 15, 10);

/// Training time for one troop with no barracks.
pub const BASE_TRAIN_TIME_MS: Millis = 5_000;

/// Training speed bonus per barracks level.
pub const BARRACKS_SPEED_BONUS: f64 = 0.5;

/// Training never takes less than this.
pub const MIN_TRAIN_TIME_MS: Millis = 1_000;

fn level_factor(multiplier: f64, level: u32) -> f64 {
    multiplier.powi(i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX))
}

/// Cost to construct `kind` at `level` (level 1 is a new building).
///
/// `ceil(base × 1.5^(level − 1))` per resource. Levels below 1 are treated
/// as 1.
#[must_use]
pub fn cost_at_level(kind: BuildingKind, level: u32) -> Cost {
    let base = kind.definition().base_cost;
    let factor = level_factor(COST_MULTIPLIER, level);
    Cost::from_fn(|resource| (base.amount(resource) as f64 * factor).ceil() as u64)
}

/// Construction time for `kind` at `level`, in milliseconds.
///
/// `ceil(base_secs × 1.6^(level − 1) × 1000)`.
#[must_use]
pub fn duration_at_level(kind: BuildingKind, level: u32) -> Millis {
    let base = kind.definition().base_time_secs;
    (base * level_factor(TIME_MULTIPLIER, level) * 1000.0).ceil() as Millis
}

/// Sum of levels across all barracks.
#[must_use]
pub fn total_barracks_level(buildings: &[Building]) -> u32 {
    buildings
        .iter()
        .filter(|b| b.kind == BuildingKind::Barracks)
        .map(|b| b.level)
        .sum()
}

/// Time to train one troop given the current buildings, in milliseconds.
///
/// Each barracks level adds a flat 50% to the speed divisor; the result is
/// floored at one second.
#[must_use]
pub fn training_duration(buildings: &[Building]) -> Millis {
    let multiplier = 1.0 + BARRACKS_SPEED_BONUS * f64::from(total_barracks_level(buildings));
    let duration = (BASE_TRAIN_TIME_MS as f64 / multiplier).ceil() as Millis;
    duration.max(MIN_TRAIN_TIME_MS)
}

/// Per-second income of every resource from the given buildings.
#[must_use]
pub fn production_rates(buildings: &[Building]) -> ResourcePool {
    let mut rates = ResourcePool::default();
    for (kind, rate) in buildings.iter().filter_map(Building::output) {
        rates.add(kind, rate);
    }
    rates
}

/// Per-second income of a single resource.
#[must_use]
pub fn production_rate(buildings: &[Building], resource: ResourceKind) -> f64 {
    production_rates(buildings).get(resource)
}
