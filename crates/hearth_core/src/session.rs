//! A running game: state, storage and randomness behind one interface.
//!
//! The [`Settlement`] trait is everything a player (human or autoplay) can
//! see and do. [`Session`] implements it over a [`StateStore`] and writes the
//! whole state back after every successful command or tick, so the save is
//! never more than one mutation behind.

use rand::Rng;

use crate::actions::{self, ConstructionQuote, TrainingQuote};
use crate::buildings::{Building, BuildingKind};
use crate::economy;
use crate::error::{ActionError, Result};
use crate::persistence::{self, LoadOrigin, StateStore};
use crate::resources::{Cost, ResourcePool};
use crate::state::{GameState, QueueStatus, TickReport};
use crate::Millis;

/// Queries and commands available to a player.
///
/// Every method takes the current time explicitly; nothing here reads a
/// clock.
///
/// A refused command ([`GameError::Action`](crate::error::GameError::Action))
/// changes nothing. Any other error from a command means the command took
/// effect but the state could not be saved.
pub trait Settlement {
    /// Current resource stockpile.
    fn resources(&self) -> ResourcePool;

    /// Buildings in creation order.
    fn buildings(&self) -> &[Building];

    /// Trained troops available for raids.
    fn troops(&self) -> u32;

    /// Status of the construction, training and raid slots.
    fn queue_statuses(&self, now: Millis) -> [QueueStatus; 3];

    /// Resources gained per second from current buildings.
    fn production_rates(&self) -> ResourcePool;

    /// Check if the stockpile covers `cost`.
    fn can_afford(&self, cost: &Cost) -> bool {
        self.resources().can_afford(cost)
    }

    /// Price of a new building.
    fn quote_new(&self, kind: BuildingKind) -> ConstructionQuote {
        actions::quote_new(kind)
    }

    /// Price of upgrading the building at `index`.
    fn quote_upgrade(&self, index: usize) -> Option<ConstructionQuote>;

    /// Price of training one troop.
    fn quote_training(&self) -> TrainingQuote;

    /// Start constructing a new building.
    ///
    /// # Errors
    /// Returns [`crate::error::GameError::Action`] if the construction slot
    /// is busy or the cost can't be paid.
    fn build_new(&mut self, kind: BuildingKind, now: Millis) -> Result<()>;

    /// Start upgrading the building at `index`.
    ///
    /// # Errors
    /// Returns [`crate::error::GameError::Action`] if the building doesn't
    /// exist, the slot is busy or the cost can't be paid.
    fn upgrade_building(&mut self, index: usize, now: Millis) -> Result<()>;

    /// Start training one troop.
    ///
    /// # Errors
    /// Returns [`crate::error::GameError::Action`] if the training slot is
    /// busy or the cost can't be paid.
    fn train_troop(&mut self, now: Millis) -> Result<()>;

    /// Launch a raid.
    ///
    /// # Errors
    /// Returns [`crate::error::GameError::Action`] if a raid is already out
    /// or there are too few troops.
    fn send_raid(&mut self, now: Millis) -> Result<()>;

    /// Accrue resources and complete due jobs.
    ///
    /// # Errors
    /// Returns an error only if the state could not be saved afterwards.
    fn tick(&mut self, now: Millis) -> Result<TickReport>;
}

/// A game session backed by `S`, drawing raid rewards from `R`.
#[derive(Debug)]
pub struct Session<S, R> {
    state: GameState,
    store: S,
    rng: R,
}

impl<S: StateStore, R: Rng> Session<S, R> {
    /// Load the saved game from `store` (or start fresh) and catch it up to
    /// `now`.
    ///
    /// The caught-up state is saved immediately, including when the save was
    /// unreadable and replaced by a new game.
    ///
    /// # Errors
    /// Returns an error if the caught-up state could not be saved.
    pub fn open(store: S, rng: R, now: Millis) -> Result<(Self, LoadOrigin)> {
        let loaded = persistence::load(&store, now);
        let mut session = Self {
            state: loaded.state,
            store,
            rng,
        };
        let report = session.state.tick(now);
        if !report.is_empty() {
            tracing::info!(
                elapsed_ms = report.elapsed_ms,
                completed = report.completed.len(),
                "Caught up offline progress"
            );
        }
        session.save()?;
        Ok((session, loaded.origin))
    }

    /// Wrap an existing state without touching the store.
    pub fn from_state(state: GameState, store: S, rng: R) -> Self {
        Self { state, store, rng }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the state to the store.
    ///
    /// # Errors
    /// Returns an error if encoding or the store write fails.
    pub fn save(&mut self) -> Result<()> {
        persistence::save(&mut self.store, &self.state)
    }

    /// Give up the session, returning its parts.
    pub fn into_parts(self) -> (GameState, S, R) {
        (self.state, self.store, self.rng)
    }

    /// Save after an accepted command. A failed save leaves the command
    /// applied in memory.
    fn commit(&mut self, outcome: std::result::Result<(), ActionError>) -> Result<()> {
        outcome?;
        self.save().map_err(|error| {
            tracing::warn!(%error, "Command applied but not saved");
            error
        })
    }
}

impl<S: StateStore, R: Rng> Settlement for Session<S, R> {
    fn resources(&self) -> ResourcePool {
        self.state.resources
    }

    fn buildings(&self) -> &[Building] {
        &self.state.buildings
    }

    fn troops(&self) -> u32 {
        self.state.troops
    }

    fn queue_statuses(&self, now: Millis) -> [QueueStatus; 3] {
        self.state.queue_statuses(now)
    }

    fn production_rates(&self) -> ResourcePool {
        economy::production_rates(&self.state.buildings)
    }

    fn quote_upgrade(&self, index: usize) -> Option<ConstructionQuote> {
        actions::quote_upgrade(&self.state, index)
    }

    fn quote_training(&self) -> TrainingQuote {
        actions::quote_training(&self.state)
    }

    fn build_new(&mut self, kind: BuildingKind, now: Millis) -> Result<()> {
        let outcome = actions::build_new(&mut self.state, kind, now);
        self.commit(outcome)
    }

    fn upgrade_building(&mut self, index: usize, now: Millis) -> Result<()> {
        let outcome = actions::upgrade_building(&mut self.state, index, now);
        self.commit(outcome)
    }

    fn train_troop(&mut self, now: Millis) -> Result<()> {
        let outcome = actions::train_troop(&mut self.state, now);
        self.commit(outcome)
    }

    fn send_raid(&mut self, now: Millis) -> Result<()> {
        let outcome = actions::send_raid(&mut self.state, &mut self.rng, now);
        self.commit(outcome)
    }

    fn tick(&mut self, now: Millis) -> Result<TickReport> {
        let report = self.state.tick(now);
        if !report.is_empty() {
            self.save()?;
        }
        Ok(report)
    }
}
