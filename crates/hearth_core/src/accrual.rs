//! Resource accrual from elapsed wall-clock time.
//!
//! Production is continuous: a building at level `L` with base rate `r`
//! yields `r × L` per second, for every second since the last update. There
//! is no cap on the elapsed time, so coming back after a week pays out a
//! week of production in one step.

use crate::state::GameState;
use crate::Millis;

/// Accrue resources for the time between `state.last_update` and `now`.
///
/// Returns `false` without touching the state when no time has passed (or
/// the clock went backwards). Otherwise adds production for every producing
/// building, sets `last_update = now` and returns `true`.
pub fn advance(state: &mut GameState, now: Millis) -> bool {
    if now <= state.last_update {
        if now < state.last_update {
            tracing::debug!(
                now,
                last_update = state.last_update,
                "Clock behind last update, skipping accrual"
            );
        }
        return false;
    }

    let delta_secs = (now - state.last_update) as f64 / 1000.0;
    for (resource, rate) in state.buildings.iter().filter_map(|b| b.output()) {
        state.resources.add(resource, rate * delta_secs);
    }
    state.last_update = now;

    tracing::trace!(delta_secs, "Accrued resources");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::{Building, BuildingKind};
    use crate::resources::ResourcePool;

    fn state_with(buildings: &[Building]) -> GameState {
        let mut state = GameState::new(0);
        state.resources = ResourcePool::default();
        state.buildings = buildings.to_vec();
        state
    }

    #[test]
    fn test_accrual_rate_times_level_times_seconds() {
        let mut state = state_with(&[Building::new(BuildingKind::Woodcutter, 3)]);
        assert!(advance(&mut state, 2_500));
        assert_eq!(state.resources.wood, 7.5);
        assert_eq!(state.last_update, 2_500);
    }

    #[test]
    fn test_accrual_sums_buildings_per_resource() {
        let mut state = state_with(&[
            Building::new(BuildingKind::Woodcutter, 1),
            Building::new(BuildingKind::Woodcutter, 2),
            Building::new(BuildingKind::Farm, 1),
        ]);
        advance(&mut state, 10_000);
        assert_eq!(state.resources.wood, 30.0);
        assert_eq!(state.resources.food, 10.0);
        assert_eq!(state.resources.stone, 0.0);
    }

    #[test]
    fn test_zero_delta_is_noop() {
        let mut state = state_with(&[Building::new(BuildingKind::Woodcutter, 1)]);
        state.last_update = 5_000;
        assert!(!advance(&mut state, 5_000));
        assert_eq!(state.resources.wood, 0.0);
    }

    #[test]
    fn test_clock_skew_is_noop() {
        let mut state = state_with(&[Building::new(BuildingKind::Woodcutter, 1)]);
        state.last_update = 5_000;
        assert!(!advance(&mut state, 1_000));
        assert_eq!(state.resources.wood, 0.0);
        assert_eq!(state.last_update, 5_000);
    }

    #[test]
    fn test_barracks_skipped() {
        let mut state = state_with(&[Building::new(BuildingKind::Barracks, 4)]);
        assert!(advance(&mut state, 60_000));
        assert_eq!(state.resources, ResourcePool::default());
        assert_eq!(state.last_update, 60_000);
    }

    #[test]
    fn test_offline_days() {
        let mut state = state_with(&[Building::new(BuildingKind::Farm, 2)]);
        let three_days_ms = 3 * 24 * 60 * 60 * 1000;
        advance(&mut state, three_days_ms);
        assert_eq!(state.resources.food, 2.0 * 3.0 * 24.0 * 60.0 * 60.0);
    }
}
