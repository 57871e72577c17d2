//! The game state container and the per-tick reconciliation pass.
//!
//! [`GameState`] is a plain owned value. Nothing in the crate keeps a global
//! copy: callers construct it at session start (usually via
//! [`crate::persistence::load`]), pass it to every operation, and save it
//! after each mutation.
//!
//! # Tick Order
//!
//! Each [`GameState::tick`] runs, in this order:
//! 1. **Accrual** - add resources for the time elapsed since the last update
//! 2. **Construction** - apply a due construction or upgrade
//! 3. **Training** - apply a due troop
//! 4. **Raid** - apply a due raid reward
//!
//! Everything is computed from timestamps, so a tick that arrives hours late
//! produces the same state as thousands of punctual ones.

use serde::{Deserialize, Serialize};

use crate::accrual;
use crate::buildings::Building;
use crate::jobs::{
    reconcile, CompletedJob, ConstructionOrder, JobKind, JobSlot, RaidOrder, TrainingOrder,
};
use crate::resources::ResourcePool;
use crate::Millis;

/// Resources every new settlement starts with.
pub const STARTING_RESOURCES: f64 = 50.0;

/// Everything that is persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Resource stockpile.
    pub resources: ResourcePool,
    /// Buildings in creation order. Indices are stable.
    pub buildings: Vec<Building>,
    /// Construction slot.
    #[serde(rename = "queue")]
    pub construction: JobSlot<ConstructionOrder>,
    /// Trained troops available for raids.
    pub troops: u32,
    /// Training slot.
    #[serde(rename = "trainingQueue")]
    pub training: JobSlot<TrainingOrder>,
    /// Raid slot.
    #[serde(rename = "raidQueue")]
    pub raid: JobSlot<RaidOrder>,
    /// Last time accrual ran (epoch milliseconds).
    pub last_update: Millis,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Milliseconds of accrual applied.
    pub elapsed_ms: Millis,
    /// Resources added by accrual.
    pub accrued: ResourcePool,
    /// Jobs that came due, in reconciliation order.
    pub completed: Vec<CompletedJob>,
}

impl TickReport {
    /// Check if the tick changed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elapsed_ms == 0 && self.completed.is_empty()
    }
}

/// Busy/idle status of one job slot, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Which slot.
    pub kind: JobKind,
    /// Whether a job occupies it.
    pub busy: bool,
    /// Job progress, `0.0` when idle.
    pub progress: f64,
    /// Milliseconds until due, `None` when idle.
    pub remaining_ms: Option<Millis>,
}

impl GameState {
    /// Create the default starting state: 50 of each resource, nothing
    /// built, no jobs, no troops.
    #[must_use]
    pub fn new(now: Millis) -> Self {
        Self {
            resources: ResourcePool::uniform(STARTING_RESOURCES),
            buildings: Vec::new(),
            construction: JobSlot::new(),
            troops: 0,
            training: JobSlot::new(),
            raid: JobSlot::new(),
            last_update: now,
        }
    }

    /// Bring the state up to `now`: accrue resources, then complete any due
    /// jobs.
    ///
    /// Safe to call repeatedly with the same `now`; later calls find nothing
    /// left to do.
    pub fn tick(&mut self, now: Millis) -> TickReport {
        let mut report = TickReport::default();

        // 1. Accrual
        let before = self.resources;
        let last = self.last_update;
        if accrual::advance(self, now) {
            report.elapsed_ms = now - last;
            report.accrued = ResourcePool::new(
                self.resources.wood - before.wood,
                self.resources.stone - before.stone,
                self.resources.food - before.food,
            );
        }

        // 2-4. Job slots, fixed order
        report.completed.extend(reconcile::<ConstructionOrder>(self, now));
        report.completed.extend(reconcile::<TrainingOrder>(self, now));
        report.completed.extend(reconcile::<RaidOrder>(self, now));

        if !report.completed.is_empty() {
            tracing::debug!(
                completed = report.completed.len(),
                elapsed_ms = report.elapsed_ms,
                "Tick reconciled jobs"
            );
        }

        report
    }

    /// Status of all three job slots, in reconciliation order.
    #[must_use]
    pub fn queue_statuses(&self, now: Millis) -> [QueueStatus; 3] {
        [
            QueueStatus {
                kind: JobKind::Construction,
                busy: self.construction.is_busy(),
                progress: self.construction.progress_ratio(now),
                remaining_ms: self.construction.remaining_ms(now),
            },
            QueueStatus {
                kind: JobKind::Training,
                busy: self.training.is_busy(),
                progress: self.training.progress_ratio(now),
                remaining_ms: self.training.remaining_ms(now),
            },
            QueueStatus {
                kind: JobKind::Raid,
                busy: self.raid.is_busy(),
                progress: self.raid.progress_ratio(now),
                remaining_ms: self.raid.remaining_ms(now),
            },
        ]
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(0)
    }
}
