//! Player actions: build, upgrade, train, raid.
//!
//! Each action validates its preconditions, pays its cost and occupies its
//! job slot as one step. If any precondition fails the state is left
//! exactly as it was and an [`ActionError`] explains why. Preconditions are
//! always re-checked here, even if the UI already greyed the action out.

use rand::Rng;
use serde::Serialize;

use crate::buildings::BuildingKind;
use crate::economy::{cost_at_level, duration_at_level, training_duration, TROOP_COST};
use crate::error::ActionError;
use crate::jobs::{ConstructionOrder, JobPayload, RaidOrder, TrainingOrder};
use crate::resources::{Cost, RaidReward, ResourceKind};
use crate::state::GameState;
use crate::Millis;

/// Troops spent to launch a raid.
pub const RAID_TROOP_COST: u32 = 5;

/// How long a raid is away.
pub const RAID_DURATION_MS: Millis = 30_000;

/// Inclusive reward range for each resource kind.
pub const RAID_REWARD_RANGES: [(ResourceKind, u64, u64); 3] = [
    (ResourceKind::Wood, 20, 60),
    (ResourceKind::Stone, 20, 60),
    (ResourceKind::Food, 10, 40),
];

/// Cost and duration of a construction job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConstructionQuote {
    /// Level the building will reach.
    pub level: u32,
    /// Resources paid up front.
    pub cost: Cost,
    /// Job duration in milliseconds.
    pub duration_ms: Millis,
}

/// Price of a new building of `kind`.
#[must_use]
pub fn quote_new(kind: BuildingKind) -> ConstructionQuote {
    ConstructionQuote {
        level: 1,
        cost: cost_at_level(kind, 1),
        duration_ms: duration_at_level(kind, 1),
    }
}

/// Price of upgrading the building at `index` by one level.
///
/// `None` if no building exists at `index`.
#[must_use]
pub fn quote_upgrade(state: &GameState, index: usize) -> Option<ConstructionQuote> {
    let building = state.buildings.get(index)?;
    let level = building.level.saturating_add(1);
    Some(ConstructionQuote {
        level,
        cost: cost_at_level(building.kind, level),
        duration_ms: duration_at_level(building.kind, level),
    })
}

/// Cost and duration of training one troop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrainingQuote {
    /// Resources paid up front.
    pub cost: Cost,
    /// Job duration in milliseconds, after the barracks bonus.
    pub duration_ms: Millis,
}

/// Price of training one troop with the current barracks.
#[must_use]
pub fn quote_training(state: &GameState) -> TrainingQuote {
    TrainingQuote {
        cost: TROOP_COST,
        duration_ms: training_duration(&state.buildings),
    }
}

/// Pay `cost` and start `payload` in its slot, or change nothing.
fn pay_and_start<P: JobPayload>(
    state: &mut GameState,
    payload: P,
    cost: &Cost,
    duration_ms: Millis,
    now: Millis,
) -> Result<(), ActionError> {
    if P::slot(state).is_busy() {
        return Err(ActionError::QueueBusy(P::KIND));
    }
    if !state.resources.spend(cost) {
        return Err(ActionError::InsufficientResources);
    }
    P::slot_mut(state).start(payload, duration_ms, now)?;
    Ok(())
}

fn log_refusal(action: &'static str, result: &Result<(), ActionError>) {
    if let Err(reason) = result {
        tracing::debug!(action, %reason, "Action refused");
    }
}

/// Start constructing a new building of `kind`.
pub fn build_new(state: &mut GameState, kind: BuildingKind, now: Millis) -> Result<(), ActionError> {
    let quote = quote_new(kind);
    let order = ConstructionOrder {
        kind,
        target_index: None,
        level: quote.level,
    };
    let result = pay_and_start(state, order, &quote.cost, quote.duration_ms, now);
    log_refusal("build_new", &result);
    if result.is_ok() {
        tracing::info!(%kind, duration_ms = quote.duration_ms, "Construction started");
    }
    result
}

/// Start upgrading the building at `index` to the next level.
pub fn upgrade_building(
    state: &mut GameState,
    index: usize,
    now: Millis,
) -> Result<(), ActionError> {
    let target = state.buildings.get(index).copied();
    let result = match (target, quote_upgrade(state, index)) {
        (Some(building), Some(quote)) => {
            let order = ConstructionOrder {
                kind: building.kind,
                target_index: Some(index),
                level: quote.level,
            };
            pay_and_start(state, order, &quote.cost, quote.duration_ms, now)
        }
        _ => Err(ActionError::BuildingNotFound(index)),
    };
    log_refusal("upgrade_building", &result);
    if let (Ok(()), Some(building)) = (&result, target) {
        tracing::info!(
            kind = %building.kind,
            index,
            level = building.level.saturating_add(1),
            "Upgrade started"
        );
    }
    result
}

/// Start training one troop.
pub fn train_troop(state: &mut GameState, now: Millis) -> Result<(), ActionError> {
    let quote = quote_training(state);
    let result = pay_and_start(state, TrainingOrder {}, &quote.cost, quote.duration_ms, now);
    log_refusal("train_troop", &result);
    if result.is_ok() {
        tracing::info!(duration_ms = quote.duration_ms, "Training started");
    }
    result
}

/// Roll a raid reward: each resource independently and uniformly over its
/// inclusive range, as `floor(min + u × (max − min + 1))` with `u ∈ [0, 1)`.
pub fn roll_raid_reward<R: Rng>(rng: &mut R) -> RaidReward {
    RAID_REWARD_RANGES
        .iter()
        .map(|&(kind, min, max)| {
            let u: f64 = rng.gen();
            let span = (max - min + 1) as f64;
            let amount = (min as f64 + u * span).floor() as u64;
            (kind, amount.min(max))
        })
        .collect()
}

/// Launch a raid, spending troops and fixing the reward now.
pub fn send_raid<R: Rng>(state: &mut GameState, rng: &mut R, now: Millis) -> Result<(), ActionError> {
    let result = if state.raid.is_busy() {
        Err(ActionError::QueueBusy(RaidOrder::KIND))
    } else if state.troops < RAID_TROOP_COST {
        Err(ActionError::InsufficientTroops {
            required: RAID_TROOP_COST,
            available: state.troops,
        })
    } else {
        let reward = roll_raid_reward(rng);
        tracing::info!(?reward, "Raid launched");
        state.troops -= RAID_TROOP_COST;
        state
            .raid
            .start(RaidOrder { reward }, RAID_DURATION_MS, now)
            .map(|_| ())
    };
    log_refusal("send_raid", &result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::Building;
    use crate::jobs::JobKind;
    use crate::resources::ResourcePool;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_build_new_deducts_and_queues() {
        let mut state = GameState::new(1_000);
        build_new(&mut state, BuildingKind::Woodcutter, 1_000).unwrap();

        assert_eq!(state.resources, ResourcePool::new(50.0, 30.0, 40.0));
        let job = state.construction.current().unwrap();
        assert_eq!(job.start_time, 1_000);
        assert_eq!(job.end_time, 6_000);
        assert_eq!(job.payload.target_index, None);
        assert_eq!(job.payload.level, 1);
    }

    #[test]
    fn test_build_new_busy_slot_refused() {
        let mut state = GameState::new(0);
        state.resources = ResourcePool::uniform(1_000.0);
        build_new(&mut state, BuildingKind::Farm, 0).unwrap();
        let before = state.clone();

        let result = build_new(&mut state, BuildingKind::Quarry, 10);
        assert_eq!(result, Err(ActionError::QueueBusy(JobKind::Construction)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_build_new_unaffordable_refused() {
        let mut state = GameState::new(0);
        state.resources = ResourcePool::uniform(10.0);
        let before = state.clone();
        let result = build_new(&mut state, BuildingKind::Barracks, 0);
        assert_eq!(result, Err(ActionError::InsufficientResources));
        assert_eq!(state, before);
    }

    #[test]
    fn test_upgrade_uses_next_level_price() {
        let mut state = GameState::new(0);
        state.resources = ResourcePool::uniform(100.0);
        state.buildings.push(Building::new(BuildingKind::Woodcutter, 1));

        upgrade_building(&mut state, 0, 0).unwrap();
        // level 2 woodcutter: 0 wood, 30 stone, 15 food
        assert_eq!(state.resources, ResourcePool::new(100.0, 70.0, 85.0));
        let job = state.construction.current().unwrap();
        assert_eq!(job.payload.target_index, Some(0));
        assert_eq!(job.payload.level, 2);
        assert_eq!(job.end_time, duration_at_level(BuildingKind::Woodcutter, 2));
    }

    #[test]
    fn test_upgrade_missing_building_refused() {
        let mut state = GameState::new(0);
        assert_eq!(
            upgrade_building(&mut state, 0, 0),
            Err(ActionError::BuildingNotFound(0))
        );
        assert!(!state.construction.is_busy());
    }

    #[test]
    fn test_quote_upgrade() {
        let mut state = GameState::new(0);
        state.buildings.push(Building::new(BuildingKind::Farm, 2));
        let quote = quote_upgrade(&state, 0).unwrap();
        assert_eq!(quote.level, 3);
        assert_eq!(quote.cost, cost_at_level(BuildingKind::Farm, 3));
        assert!(quote_upgrade(&state, 1).is_none());
    }

    #[test]
    fn test_train_troop() {
        let mut state = GameState::new(0);
        train_troop(&mut state, 0).unwrap();
        assert_eq!(state.resources, ResourcePool::new(35.0, 35.0, 40.0));
        assert_eq!(state.training.current().unwrap().end_time, 5_000);

        assert_eq!(
            train_troop(&mut state, 1),
            Err(ActionError::QueueBusy(JobKind::Training))
        );
    }

    #[test]
    fn test_quote_training() {
        let mut state = GameState::new(0);
        assert_eq!(
            quote_training(&state),
            TrainingQuote {
                cost: TROOP_COST,
                duration_ms: 5_000
            }
        );
        state.buildings.push(Building::new(BuildingKind::Barracks, 1));
        assert_eq!(quote_training(&state).duration_ms, 3_334);
    }

    #[test]
    fn test_train_troop_uses_barracks_bonus() {
        let mut state = GameState::new(0);
        state.buildings.push(Building::new(BuildingKind::Barracks, 2));
        train_troop(&mut state, 100).unwrap();
        assert_eq!(state.training.current().unwrap().end_time, 2_600);
    }

    #[test]
    fn test_send_raid_requires_troops() {
        let mut state = GameState::new(0);
        state.troops = 4;
        let mut rng = StdRng::seed_from_u64(7);
        let before = state.clone();

        let result = send_raid(&mut state, &mut rng, 0);
        assert_eq!(
            result,
            Err(ActionError::InsufficientTroops {
                required: 5,
                available: 4
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_send_raid_spends_troops_and_fixes_reward() {
        let mut state = GameState::new(0);
        state.troops = 7;
        let mut rng = StdRng::seed_from_u64(7);

        send_raid(&mut state, &mut rng, 1_000).unwrap();
        assert_eq!(state.troops, 2);
        let job = state.raid.current().unwrap();
        assert_eq!(job.end_time, 1_000 + RAID_DURATION_MS);
        assert_eq!(job.payload.reward.len(), 3);

        let busy = send_raid(&mut state, &mut rng, 2_000);
        assert_eq!(busy, Err(ActionError::QueueBusy(JobKind::Raid)));
        assert_eq!(state.troops, 2);
    }

    #[test]
    fn test_raid_reward_within_inclusive_ranges() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..5_000 {
            let reward = roll_raid_reward(&mut rng);
            for (kind, min, max) in RAID_REWARD_RANGES {
                let amount = reward[&kind];
                assert!((min..=max).contains(&amount), "{kind}: {amount}");
                if kind == ResourceKind::Food {
                    seen_min |= amount == min;
                    seen_max |= amount == max;
                }
            }
        }
        assert!(seen_min && seen_max, "both ends of the range are reachable");
    }

    #[test]
    fn test_concurrent_slots_allowed() {
        let mut state = GameState::new(0);
        state.resources = ResourcePool::uniform(500.0);
        state.troops = 5;
        let mut rng = StdRng::seed_from_u64(1);

        build_new(&mut state, BuildingKind::Farm, 0).unwrap();
        train_troop(&mut state, 0).unwrap();
        send_raid(&mut state, &mut rng, 0).unwrap();
        assert!(state.construction.is_busy());
        assert!(state.training.is_busy());
        assert!(state.raid.is_busy());
    }
}
