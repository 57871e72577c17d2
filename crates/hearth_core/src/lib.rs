//! # Hearth Core
//!
//! Simulation core for Hearthhold, an idle settlement game.
//!
//! This crate contains **only** game rules:
//! - No rendering
//! - No wall clock (every operation takes `now` explicitly)
//! - No system randomness (raid rewards draw from a caller-supplied RNG)
//!
//! Resources accrue continuously from buildings, and three single-slot job
//! queues (construction, training, raid) complete when their end time has
//! passed. Because everything is derived from timestamps, a game that was
//! closed for a week catches up in one [`state::GameState::tick`].
//!
//! ## Crate Structure
//!
//! - [`resources`] - Resource kinds, stockpile and cost bundles
//! - [`buildings`] - Building catalog and instances
//! - [`economy`] - Level scaling for costs, durations and training
//! - [`jobs`] - Timed job slots and their completion effects
//! - [`accrual`] - Offline/online resource production
//! - [`actions`] - Player commands (build, upgrade, train, raid)
//! - [`state`] - The persisted state and the tick pass
//! - [`persistence`] - Save/load with field-default migration
//! - [`session`] - State, storage and RNG behind one player interface

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod accrual;
pub mod actions;
pub mod buildings;
pub mod economy;
pub mod error;
pub mod jobs;
pub mod persistence;
pub mod resources;
pub mod session;
pub mod state;

/// Wall-clock time as milliseconds since the Unix epoch.
pub type Millis = u64;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{ConstructionQuote, TrainingQuote, RAID_DURATION_MS, RAID_TROOP_COST};
    pub use crate::buildings::{Building, BuildingKind};
    pub use crate::error::{ActionError, GameError, Result};
    pub use crate::jobs::{CompletedJob, JobKind};
    pub use crate::persistence::{FileStore, LoadOrigin, MemoryStore, StateStore};
    pub use crate::resources::{Cost, RaidReward, ResourceKind, ResourcePool};
    pub use crate::session::{Session, Settlement};
    pub use crate::state::{GameState, QueueStatus, TickReport};
    pub use crate::Millis;
}
