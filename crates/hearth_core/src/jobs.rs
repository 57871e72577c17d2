//! Single-slot timed jobs.
//!
//! Construction, training and raiding each own one [`JobSlot`]. A slot holds
//! at most one [`TimedJob`]; the payload type decides what happens when the
//! job comes due (see [`JobPayload::complete`]). The three slots are
//! independent, so a raid can run while something is being built.
//!
//! Jobs never advance on their own. A job is due once `now >= end_time`, and
//! [`reconcile`] applies it the next time the state is evaluated, however
//! late that is.

use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BuildingKind};
use crate::error::ActionError;
use crate::resources::RaidReward;
use crate::state::GameState;
use crate::Millis;

/// Which slot a job occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Building a new building or upgrading an existing one.
    Construction,
    /// Training a troop.
    Training,
    /// A raid in progress.
    Raid,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Construction => "construction",
            Self::Training => "training",
            Self::Raid => "raid",
        })
    }
}

/// A job with a fixed start and end time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedJob<P> {
    /// When the job was started (epoch milliseconds).
    pub start_time: Millis,
    /// When the job comes due (epoch milliseconds).
    pub end_time: Millis,
    /// Kind-specific data.
    #[serde(flatten)]
    pub payload: P,
}

impl<P> TimedJob<P> {
    /// Check if the job is due at `now`.
    #[must_use]
    pub const fn is_due(&self, now: Millis) -> bool {
        now >= self.end_time
    }

    /// Fraction of the job elapsed at `now`, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn progress_ratio(&self, now: Millis) -> f64 {
        let total = self.end_time.saturating_sub(self.start_time);
        if total == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start_time);
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Milliseconds left until the job is due.
    #[must_use]
    pub const fn remaining_ms(&self, now: Millis) -> Millis {
        self.end_time.saturating_sub(now)
    }
}

/// A queue that holds at most one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobSlot<P> {
    job: Option<TimedJob<P>>,
}

impl<P> Default for JobSlot<P> {
    fn default() -> Self {
        Self { job: None }
    }
}

impl<P: JobPayload> JobSlot<P> {
    /// Create an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { job: None }
    }

    /// Check if a job occupies the slot.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    /// The job in the slot, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&TimedJob<P>> {
        self.job.as_ref()
    }

    /// Occupy the slot with a job running from `now` for `duration_ms`.
    ///
    /// Returns `Err` if the slot is already busy; the slot is unchanged.
    pub fn start(
        &mut self,
        payload: P,
        duration_ms: Millis,
        now: Millis,
    ) -> Result<&TimedJob<P>, ActionError> {
        if self.is_busy() {
            return Err(ActionError::QueueBusy(P::KIND));
        }
        Ok(&*self.job.insert(TimedJob {
            start_time: now,
            end_time: now.saturating_add(duration_ms),
            payload,
        }))
    }

    /// Remove and return the job if it is due at `now`.
    pub fn take_due(&mut self, now: Millis) -> Option<TimedJob<P>> {
        if self.job.as_ref().is_some_and(|job| job.is_due(now)) {
            self.job.take()
        } else {
            None
        }
    }

    /// Progress of the current job; `0.0` when idle.
    #[must_use]
    pub fn progress_ratio(&self, now: Millis) -> f64 {
        self.job.as_ref().map_or(0.0, |job| job.progress_ratio(now))
    }

    /// Milliseconds until the current job is due; `None` when idle.
    #[must_use]
    pub fn remaining_ms(&self, now: Millis) -> Option<Millis> {
        self.job.as_ref().map(|job| job.remaining_ms(now))
    }
}

/// Payload of a job, which decides the job's slot and completion effect.
pub trait JobPayload: Sized {
    /// The slot this payload lives in.
    const KIND: JobKind;

    /// This payload's slot within the game state.
    fn slot(state: &GameState) -> &JobSlot<Self>;

    /// Mutable access to this payload's slot.
    fn slot_mut(state: &mut GameState) -> &mut JobSlot<Self>;

    /// Apply the completion effect to `state`.
    ///
    /// Called after the job has been removed from its slot.
    fn complete(self, state: &mut GameState) -> CompletedJob;
}

/// Construct a new building or upgrade an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionOrder {
    /// Building type being built.
    #[serde(rename = "type")]
    pub kind: BuildingKind,
    /// Index of the building being upgraded; `None` for a new building.
    pub target_index: Option<usize>,
    /// Level the building will have when the job completes.
    pub level: u32,
}

impl JobPayload for ConstructionOrder {
    const KIND: JobKind = JobKind::Construction;

    fn slot(state: &GameState) -> &JobSlot<Self> {
        &state.construction
    }

    fn slot_mut(state: &mut GameState) -> &mut JobSlot<Self> {
        &mut state.construction
    }

    fn complete(self, state: &mut GameState) -> CompletedJob {
        let index = match self.target_index {
            None => {
                state.buildings.push(Building::new(self.kind, self.level.max(1)));
                Some(state.buildings.len() - 1)
            }
            Some(index) => match state.buildings.get_mut(index) {
                Some(building) => {
                    building.level = self.level.max(1);
                    Some(index)
                }
                None => {
                    tracing::warn!(index, kind = %self.kind, "Upgrade target missing, dropping job");
                    None
                }
            },
        };
        CompletedJob::Construction {
            kind: self.kind,
            index,
            level: self.level,
        }
    }
}

/// Train one troop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrainingOrder {}

impl JobPayload for TrainingOrder {
    const KIND: JobKind = JobKind::Training;

    fn slot(state: &GameState) -> &JobSlot<Self> {
        &state.training
    }

    fn slot_mut(state: &mut GameState) -> &mut JobSlot<Self> {
        &mut state.training
    }

    fn complete(self, state: &mut GameState) -> CompletedJob {
        state.troops = state.troops.saturating_add(1);
        CompletedJob::Training {
            troops: state.troops,
        }
    }
}

/// A raid carrying the reward rolled when it was launched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RaidOrder {
    /// Resources paid out on return.
    #[serde(default)]
    pub reward: RaidReward,
}

impl JobPayload for RaidOrder {
    const KIND: JobKind = JobKind::Raid;

    fn slot(state: &GameState) -> &JobSlot<Self> {
        &state.raid
    }

    fn slot_mut(state: &mut GameState) -> &mut JobSlot<Self> {
        &mut state.raid
    }

    fn complete(self, state: &mut GameState) -> CompletedJob {
        state.resources.deposit(&self.reward);
        CompletedJob::Raid {
            reward: self.reward,
        }
    }
}

/// Effect applied by a job that came due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum CompletedJob {
    /// A building was added or upgraded.
    Construction {
        /// Building type.
        kind: BuildingKind,
        /// Index in the building list; `None` if the upgrade target was gone.
        index: Option<usize>,
        /// Level reached.
        level: u32,
    },
    /// A troop finished training.
    Training {
        /// Troop count after completion.
        troops: u32,
    },
    /// A raid returned.
    Raid {
        /// Resources deposited.
        reward: RaidReward,
    },
}

/// Apply the job in `P`'s slot if it is due, clearing the slot.
///
/// Idempotent: once the slot is cleared further calls do nothing.
pub fn reconcile<P: JobPayload>(state: &mut GameState, now: Millis) -> Option<CompletedJob> {
    let job = P::slot_mut(state).take_due(now)?;
    let completed = job.payload.complete(state);
    tracing::info!(
        kind = %P::KIND,
        started = job.start_time,
        due = job.end_time,
        now,
        "Job completed"
    );
    Some(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{ResourceKind, ResourcePool};

    fn new_woodcutter() -> ConstructionOrder {
        ConstructionOrder {
            kind: BuildingKind::Woodcutter,
            target_index: None,
            level: 1,
        }
    }

    #[test]
    fn test_slot_start_sets_times() {
        let mut slot = JobSlot::new();
        let job = slot.start(new_woodcutter(), 5_000, 1_000).unwrap();
        assert_eq!(job.start_time, 1_000);
        assert_eq!(job.end_time, 6_000);
        assert!(slot.is_busy());
    }

    #[test]
    fn test_slot_refuses_second_job() {
        let mut slot = JobSlot::new();
        slot.start(TrainingOrder {}, 5_000, 0).unwrap();
        let result = slot.start(TrainingOrder {}, 1_000, 10);
        assert_eq!(result.unwrap_err(), ActionError::QueueBusy(JobKind::Training));
        assert_eq!(slot.current().unwrap().end_time, 5_000);
    }

    #[test]
    fn test_take_due_only_when_due() {
        let mut slot = JobSlot::new();
        slot.start(TrainingOrder {}, 5_000, 0).unwrap();
        assert!(slot.take_due(4_999).is_none());
        assert!(slot.is_busy());
        assert!(slot.take_due(5_000).is_some());
        assert!(!slot.is_busy());
        assert!(slot.take_due(5_000).is_none());
    }

    #[test]
    fn test_progress_ratio_clamped() {
        let mut slot = JobSlot::new();
        assert_eq!(slot.progress_ratio(0), 0.0);
        slot.start(TrainingOrder {}, 1_000, 1_000).unwrap();
        assert_eq!(slot.progress_ratio(500), 0.0);
        assert_eq!(slot.progress_ratio(1_250), 0.25);
        assert_eq!(slot.progress_ratio(9_999), 1.0);
        assert_eq!(slot.remaining_ms(1_250), Some(750));
        assert_eq!(slot.remaining_ms(5_000), Some(0));
    }

    #[test]
    fn test_zero_length_job_is_complete() {
        let job = TimedJob {
            start_time: 10,
            end_time: 10,
            payload: TrainingOrder {},
        };
        assert_eq!(job.progress_ratio(10), 1.0);
        assert!(job.is_due(10));
    }

    #[test]
    fn test_reconcile_construction_appends_building() {
        let mut state = GameState::new(0);
        state.construction.start(new_woodcutter(), 5_000, 0).unwrap();

        let completed = reconcile::<ConstructionOrder>(&mut state, 5_000);
        assert_eq!(
            completed,
            Some(CompletedJob::Construction {
                kind: BuildingKind::Woodcutter,
                index: Some(0),
                level: 1
            })
        );
        assert_eq!(state.buildings, vec![Building::new(BuildingKind::Woodcutter, 1)]);
        assert!(!state.construction.is_busy());
    }

    #[test]
    fn test_reconcile_upgrade_sets_level() {
        let mut state = GameState::new(0);
        state.buildings.push(Building::new(BuildingKind::Farm, 1));
        state.buildings.push(Building::new(BuildingKind::Quarry, 2));
        let order = ConstructionOrder {
            kind: BuildingKind::Quarry,
            target_index: Some(1),
            level: 3,
        };
        state.construction.start(order, 100, 0).unwrap();

        reconcile::<ConstructionOrder>(&mut state, 100);
        assert_eq!(state.buildings[1], Building::new(BuildingKind::Quarry, 3));
        assert_eq!(state.buildings.len(), 2);
    }

    #[test]
    fn test_reconcile_upgrade_missing_target_clears_slot() {
        let mut state = GameState::new(0);
        let order = ConstructionOrder {
            kind: BuildingKind::Farm,
            target_index: Some(4),
            level: 2,
        };
        state.construction.start(order, 100, 0).unwrap();

        let completed = reconcile::<ConstructionOrder>(&mut state, 100);
        assert!(matches!(
            completed,
            Some(CompletedJob::Construction { index: None, .. })
        ));
        assert!(state.buildings.is_empty());
        assert!(!state.construction.is_busy());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut state = GameState::new(0);
        state.training.start(TrainingOrder {}, 5_000, 0).unwrap();

        assert!(reconcile::<TrainingOrder>(&mut state, 6_000).is_some());
        let after_first = state.clone();
        assert!(reconcile::<TrainingOrder>(&mut state, 6_000).is_none());
        assert_eq!(state, after_first);
        assert_eq!(state.troops, 1);
    }

    #[test]
    fn test_reconcile_raid_deposits_reward() {
        let mut state = GameState::new(0);
        state.resources = ResourcePool::default();
        let reward = RaidReward::from([(ResourceKind::Wood, 40), (ResourceKind::Stone, 21)]);
        state
            .raid
            .start(RaidOrder { reward: reward.clone() }, 30_000, 0)
            .unwrap();

        assert!(reconcile::<RaidOrder>(&mut state, 29_999).is_none());
        let completed = reconcile::<RaidOrder>(&mut state, 30_000);
        assert_eq!(completed, Some(CompletedJob::Raid { reward }));
        assert_eq!(state.resources, ResourcePool::new(40.0, 21.0, 0.0));
    }

    #[test]
    fn test_job_serialization_shape() {
        let mut slot = JobSlot::new();
        slot.start(new_woodcutter(), 5_000, 1_000).unwrap();
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "woodcutter",
                "targetIndex": null,
                "level": 1,
                "startTime": 1000,
                "endTime": 6000
            })
        );

        let idle: JobSlot<TrainingOrder> = JobSlot::new();
        assert_eq!(serde_json::to_value(&idle).unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_training_job_roundtrip() {
        let json = r#"{"startTime":5,"endTime":10}"#;
        let slot: JobSlot<TrainingOrder> = serde_json::from_str(json).unwrap();
        assert_eq!(slot.current().map(|job| job.end_time), Some(10));
    }
}
