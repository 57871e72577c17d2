//! Replay and tick-cadence testing utilities.
//!
//! The simulation is a pure function of (state, now, RNG draws), so the same
//! scripted session replayed with the same seed must end in the same state,
//! and the number of ticks used to cover an interval must not change how
//! much was produced.
//!
//! # Testing Strategy
//!
//! - **Replay**: drive a [`Session`] through a timed script of commands and
//!   compare the saves two replays leave behind.
//! - **Cadence**: cover one interval with many small ticks and with a single
//!   jump, then compare. Resource totals may differ by float rounding only.
//!
//! Cadence comparison assumes no construction completes inside the
//! interval: a finished building starts producing from the tick after it
//! completes, so a coarser cadence legitimately produces less.

use hearth_core::buildings::BuildingKind;
use hearth_core::error::GameError;
use hearth_core::persistence::{self, MemoryStore};
use hearth_core::resources::{ResourceKind, ResourcePool};
use hearth_core::session::{Session, Settlement};
use hearth_core::state::GameState;
use hearth_core::Millis;

use crate::fixtures::seeded_rng;

/// One scripted player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Construct a new building.
    Build(BuildingKind),
    /// Upgrade the building at this index.
    Upgrade(usize),
    /// Train one troop.
    Train,
    /// Launch a raid.
    Raid,
    /// Only tick.
    Wait,
}

/// A command issued at a point in time.
pub type Step = (Millis, Command);

/// Outcome of replaying a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    /// State after the last step.
    pub state: GameState,
    /// What the store held after the last step.
    pub saved: Vec<u8>,
    /// Commands the settlement accepted.
    pub accepted: usize,
    /// Commands the settlement refused.
    pub refused: usize,
}

/// Replay `script` against `state`, drawing raid rolls from `seed`.
///
/// Each step ticks the session to its time and then issues its command.
/// Steps are expected in time order.
///
/// # Panics
///
/// Panics if the in-memory store fails, which it cannot.
#[must_use]
pub fn replay(state: GameState, seed: u64, script: &[Step]) -> Replay {
    let mut session = Session::from_state(state, MemoryStore::new(), seeded_rng(seed));
    let (mut accepted, mut refused) = (0, 0);

    for &(now, command) in script {
        session.tick(now).expect("memory store never fails");
        let outcome = match command {
            Command::Build(kind) => session.build_new(kind, now),
            Command::Upgrade(index) => session.upgrade_building(index, now),
            Command::Train => session.train_troop(now),
            Command::Raid => session.send_raid(now),
            Command::Wait => continue,
        };
        match outcome {
            Ok(()) => accepted += 1,
            Err(GameError::Action(_)) => refused += 1,
            Err(e) => panic!("replay failed at {now}: {e}"),
        }
    }

    session.save().expect("memory store never fails");
    let (state, store, _) = session.into_parts();
    let saved = store.bytes().map(<[u8]>::to_vec).unwrap_or_default();
    Replay {
        state,
        saved,
        accepted,
        refused,
    }
}

/// Replay `script` `runs` times from the same start and seed and assert
/// every run ends with identical state and identical save bytes.
///
/// # Panics
///
/// Panics if two runs diverged or the save doesn't decode back to the
/// final state.
pub fn assert_replays_identically(state: &GameState, seed: u64, script: &[Step], runs: usize) -> Replay {
    let first = replay(state.clone(), seed, script);
    for run in 1..runs {
        let again = replay(state.clone(), seed, script);
        assert!(
            again == first,
            "Replay diverged on run {run} of {runs}!\n\
             Steps: {}\n\
             First:  {:?}\n\
             Run {run}: {:?}",
            script.len(),
            first.state,
            again.state,
        );
    }

    let now = script.last().map_or(state.last_update, |&(now, _)| now);
    let reloaded = persistence::decode(&first.saved, now).state;
    assert_eq!(reloaded, first.state, "Save does not reload to the replayed state");
    first
}

/// Tick from `state.last_update` to `end` every `step_ms`, finishing with a
/// tick at exactly `end`.
///
/// # Panics
///
/// Panics if `step_ms` is zero.
#[must_use]
pub fn run_at_cadence(mut state: GameState, end: Millis, step_ms: Millis) -> GameState {
    assert!(step_ms > 0, "cadence must be positive");
    let mut now = state.last_update;
    while now + step_ms < end {
        now += step_ms;
        state.tick(now);
    }
    state.tick(end);
    state
}

/// The same interval covered two ways.
#[derive(Debug, Clone)]
pub struct CadenceResult {
    /// Many small ticks.
    pub stepped: GameState,
    /// One tick at the end.
    pub jumped: GameState,
}

impl CadenceResult {
    /// Largest relative difference between the two resource pools.
    #[must_use]
    pub fn max_relative_error(&self) -> f64 {
        relative_error(&self.stepped.resources, &self.jumped.resources)
    }

    /// Assert both runs agree: resources within `tolerance` (relative),
    /// everything else exactly.
    ///
    /// # Panics
    ///
    /// Panics if the runs diverged.
    pub fn assert_equivalent(&self, tolerance: f64) {
        let error = self.max_relative_error();
        assert!(
            error <= tolerance,
            "Resource totals depend on tick cadence!\n\
             Stepped: {:?}\n\
             Jumped:  {:?}\n\
             Relative error: {error:e} (tolerance {tolerance:e})",
            self.stepped.resources,
            self.jumped.resources,
        );

        let mut stepped = self.stepped.clone();
        stepped.resources = self.jumped.resources;
        assert_eq!(stepped, self.jumped, "Non-resource state depends on tick cadence");
    }
}

/// Cover `state.last_update..end` at `step_ms` cadence and in one jump.
#[must_use]
pub fn compare_cadences(state: &GameState, end: Millis, step_ms: Millis) -> CadenceResult {
    let stepped = run_at_cadence(state.clone(), end, step_ms);
    let mut jumped = state.clone();
    jumped.tick(end);
    tracing::trace!(step_ms, end, "Compared tick cadences");
    CadenceResult { stepped, jumped }
}

fn relative_error(a: &ResourcePool, b: &ResourcePool) -> f64 {
    ResourceKind::ALL
        .iter()
        .map(|&kind| {
            let (x, y) = (a.get(kind), b.get(kind));
            let scale = x.abs().max(y.abs()).max(1.0);
            (x - y).abs() / scale
        })
        .fold(0.0, f64::max)
}

/// Proptest strategies for simulation inputs.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use hearth_core::buildings::{Building, BuildingKind};
    use hearth_core::resources::ResourcePool;
    use hearth_core::state::GameState;
    use hearth_core::Millis;
    use proptest::prelude::*;

    use super::{Command, Step};
    use crate::fixtures::{DAY_MS, EPOCH};

    /// Any building kind.
    pub fn arb_building_kind() -> impl Strategy<Value = BuildingKind> {
        prop::sample::select(BuildingKind::ALL.to_vec())
    }

    /// A building kind that produces a resource.
    pub fn arb_producer_kind() -> impl Strategy<Value = BuildingKind> {
        prop::sample::select(vec![
            BuildingKind::Woodcutter,
            BuildingKind::Quarry,
            BuildingKind::Farm,
        ])
    }

    /// Building levels (1-20).
    pub fn arb_level() -> impl Strategy<Value = u32> {
        1u32..=20
    }

    /// A finished building.
    pub fn arb_building() -> impl Strategy<Value = Building> {
        (arb_building_kind(), arb_level()).prop_map(|(kind, level)| Building::new(kind, level))
    }

    /// Up to `max_len` finished buildings.
    pub fn arb_buildings(max_len: usize) -> impl Strategy<Value = Vec<Building>> {
        proptest::collection::vec(arb_building(), 0..=max_len)
    }

    /// A resource pool with each amount in `0..max`.
    pub fn arb_pool(max: f64) -> impl Strategy<Value = ResourcePool> {
        (0.0..max, 0.0..max, 0.0..max).prop_map(|(w, s, f)| ResourcePool::new(w, s, f))
    }

    /// A state at [`EPOCH`] with idle job slots.
    pub fn arb_idle_state(max_buildings: usize) -> impl Strategy<Value = GameState> {
        (arb_pool(10_000.0), arb_buildings(max_buildings), 0u32..50).prop_map(
            |(resources, buildings, troops)| {
                let mut state = GameState::new(EPOCH);
                state.resources = resources;
                state.buildings = buildings;
                state.troops = troops;
                state
            },
        )
    }

    /// Time away, up to a week.
    pub fn arb_elapsed_ms() -> impl Strategy<Value = Millis> {
        0..=7 * DAY_MS
    }

    /// Any scripted command, upgrades aimed at the first `max_index` slots.
    pub fn arb_command(max_index: usize) -> impl Strategy<Value = Command> {
        prop_oneof![
            arb_building_kind().prop_map(Command::Build),
            (0..max_index.max(1)).prop_map(Command::Upgrade),
            Just(Command::Train),
            Just(Command::Raid),
            Just(Command::Wait),
        ]
    }

    /// Up to `max_len` commands starting at [`EPOCH`], each up to a minute
    /// after the previous one.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<Step>> {
        proptest::collection::vec((0..=60_000u64, arb_command(8)), 0..=max_len).prop_map(|steps| {
            let mut now = EPOCH;
            steps
                .into_iter()
                .map(|(gap, command)| {
                    now += gap;
                    (now, command)
                })
                .collect()
        })
    }

    /// Tick interval, from one second to one minute.
    pub fn arb_cadence_ms() -> impl Strategy<Value = Millis> {
        1_000..=60_000u64
    }
}
