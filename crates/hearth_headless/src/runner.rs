//! Tick loop driving a settlement in real or simulated time.

use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hearth_core::error::GameError;
use hearth_core::session::Settlement;
use hearth_core::Millis;
use thiserror::Error;

use crate::protocol::{Response, RunSummary};
use crate::strategies::Strategy;

/// Error type for the run loop.
#[derive(Error, Debug)]
pub enum RunError {
    /// The session failed to save.
    #[error(transparent)]
    Game(#[from] GameError),
    /// Writing output failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Source of the current time.
pub trait Clock {
    /// Current time in epoch milliseconds.
    fn now(&self) -> Millis;

    /// Let `ms` milliseconds pass.
    fn wait(&mut self, ms: Millis);
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as Millis)
    }

    fn wait(&mut self, ms: Millis) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// A clock that jumps forward instantly.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedClock {
    now: Millis,
}

impl SimulatedClock {
    /// Start at `now`.
    #[must_use]
    pub fn new(now: Millis) -> Self {
        Self { now }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Millis {
        self.now
    }

    fn wait(&mut self, ms: Millis) {
        self.now = self.now.saturating_add(ms);
    }
}

/// Runs ticks against a settlement, letting a strategy act after each.
pub struct Runner<'a, C> {
    settlement: &'a mut dyn Settlement,
    strategy: Box<dyn Strategy>,
    clock: C,
    interval_ms: Millis,
}

impl<'a, C: Clock> Runner<'a, C> {
    /// Create a runner ticking every `interval_ms`.
    pub fn new(
        settlement: &'a mut dyn Settlement,
        strategy: Box<dyn Strategy>,
        clock: C,
        interval_ms: Millis,
    ) -> Self {
        Self {
            settlement,
            strategy,
            clock,
            interval_ms: interval_ms.max(1),
        }
    }

    /// Run `ticks` ticks (forever if `None`), writing a JSON line for every
    /// tick that changed something and a summary at the end.
    pub fn run<W: Write>(&mut self, ticks: Option<u64>, out: &mut W) -> Result<RunSummary, RunError> {
        tracing::info!(
            strategy = self.strategy.name(),
            interval_ms = self.interval_ms,
            ?ticks,
            "Starting run loop"
        );

        let mut summary = RunSummary {
            started_at: self.clock.now(),
            ..RunSummary::default()
        };

        while ticks.map_or(true, |limit| summary.ticks < limit) {
            self.clock.wait(self.interval_ms);
            let now = self.clock.now();
            let report = self.settlement.tick(now)?;
            summary.ticks += 1;
            summary.jobs_completed += report.completed.len();

            let mut taken = Vec::new();
            for action in self.strategy.decide(&*self.settlement, now) {
                match action.apply(&mut *self.settlement, now) {
                    Ok(()) => taken.push(action),
                    Err(GameError::Action(reason)) => {
                        tracing::debug!(?action, %reason, "Autoplay action refused");
                        summary.actions_refused += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            summary.actions_taken += taken.len();

            if !report.completed.is_empty() || !taken.is_empty() {
                Response::Tick {
                    now,
                    report,
                    actions: taken,
                }
                .emit(out)?;
            }
            summary.finished_at = now;
        }

        summary.resources = self.settlement.resources();
        summary.troops = self.settlement.troops();
        summary.buildings = self.settlement.buildings().len();
        tracing::info!(
            ticks = summary.ticks,
            jobs = summary.jobs_completed,
            actions = summary.actions_taken,
            "Run loop finished"
        );
        Response::Summary(summary.clone()).emit(out)?;
        Ok(summary)
    }
}
