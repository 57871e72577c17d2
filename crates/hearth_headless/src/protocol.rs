//! JSON output of the headless runner.
//!
//! Every response is one JSON object on its own line of stdout, tagged by
//! `type`. Logs go to stderr, so stdout can be piped straight into `jq`.
//!
//! # Example Session
//!
//! ```text
//! $ hearth_headless build woodcutter
//! {"type":"ack","action":{"action":"build","kind":"woodcutter"},"now":1704067200000}
//! $ hearth_headless raid
//! {"type":"refused","action":{"action":"raid"},"reason":"Insufficient troops: need 5, have 0"}
//! $ hearth_headless run --simulated --ticks 3600 --strategy greedy
//! {"type":"tick","now":1704067205000,"report":{...},"actions":[...]}
//! ...
//! {"type":"summary","ticks":3600,...}
//! ```

use std::io::Write;

use hearth_core::actions::{ConstructionQuote, TrainingQuote};
use hearth_core::buildings::BuildingKind;
use hearth_core::persistence::LoadOrigin;
use hearth_core::resources::ResourcePool;
use hearth_core::session::Settlement;
use hearth_core::state::{QueueStatus, TickReport};
use hearth_core::Millis;
use serde::Serialize;

use crate::strategies::Action;

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses written to stdout.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Full settlement status.
    Status(StatusReport),

    /// An action was accepted and saved.
    Ack {
        /// The action.
        action: Action,
        /// When it started.
        now: Millis,
    },

    /// An action was refused; nothing changed.
    Refused {
        /// The action.
        action: Action,
        /// Why.
        reason: String,
    },

    /// A run-loop tick that changed something.
    Tick {
        /// Tick time.
        now: Millis,
        /// Accrual and completed jobs.
        report: TickReport,
        /// Autoplay actions accepted this tick.
        actions: Vec<Action>,
    },

    /// End of a run loop.
    Summary(RunSummary),

    /// Result of migrating a save.
    Migrated(MigrationReport),
}

impl Response {
    /// Write as a single JSON line.
    pub fn emit<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        writeln!(out)?;
        out.flush()
    }
}

/// One building with its upgrade price.
#[derive(Debug, Clone, Serialize)]
pub struct BuildingStatus {
    /// Index in the building list.
    pub index: usize,
    /// Building type.
    pub kind: BuildingKind,
    /// Current level.
    pub level: u32,
    /// Price of the next level.
    pub upgrade: Option<ConstructionQuote>,
}

/// Price of a new building of one type.
#[derive(Debug, Clone, Serialize)]
pub struct BuildQuote {
    /// Building type.
    pub kind: BuildingKind,
    /// Price.
    #[serde(flatten)]
    pub quote: ConstructionQuote,
    /// Whether the stockpile covers it now.
    pub affordable: bool,
}

/// Everything a player can see.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Time of the snapshot.
    pub now: Millis,
    /// Stockpile.
    pub resources: ResourcePool,
    /// Income per second.
    pub rates: ResourcePool,
    /// Troops at home.
    pub troops: u32,
    /// Buildings in creation order.
    pub buildings: Vec<BuildingStatus>,
    /// Construction, training and raid slots.
    pub queues: [QueueStatus; 3],
    /// Prices of new buildings.
    pub build_quotes: Vec<BuildQuote>,
    /// Price of training a troop.
    pub training_quote: TrainingQuote,
}

impl StatusReport {
    /// Snapshot `settlement` at `now`.
    #[must_use]
    pub fn capture(settlement: &dyn Settlement, now: Millis) -> Self {
        let buildings = settlement
            .buildings()
            .iter()
            .enumerate()
            .map(|(index, b)| BuildingStatus {
                index,
                kind: b.kind,
                level: b.level,
                upgrade: settlement.quote_upgrade(index),
            })
            .collect();
        let build_quotes = BuildingKind::ALL
            .iter()
            .map(|&kind| {
                let quote = settlement.quote_new(kind);
                BuildQuote {
                    kind,
                    quote,
                    affordable: settlement.can_afford(&quote.cost),
                }
            })
            .collect();

        Self {
            now,
            resources: settlement.resources(),
            rates: settlement.production_rates(),
            troops: settlement.troops(),
            buildings,
            queues: settlement.queue_statuses(now),
            build_quotes,
            training_quote: settlement.quote_training(),
        }
    }
}

/// Totals for a finished run loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Time of the first tick.
    pub started_at: Millis,
    /// Time of the last tick.
    pub finished_at: Millis,
    /// Jobs completed.
    pub jobs_completed: usize,
    /// Autoplay actions accepted.
    pub actions_taken: usize,
    /// Autoplay actions refused.
    pub actions_refused: usize,
    /// Final stockpile.
    pub resources: ResourcePool,
    /// Final troop count.
    pub troops: u32,
    /// Final building count.
    pub buildings: usize,
}

/// What a save migration did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Save file.
    pub path: String,
    /// `saved`, `fresh` or `discarded`.
    pub source: &'static str,
    /// Fields that took their default.
    pub backfilled: Vec<&'static str>,
    /// Why the save was discarded, if it was.
    pub reason: Option<String>,
    /// Whether the result was written back.
    pub written: bool,
}

impl MigrationReport {
    /// Describe a load of `path`.
    #[must_use]
    pub fn new(path: String, origin: &LoadOrigin, written: bool) -> Self {
        let (source, backfilled, reason) = match origin {
            LoadOrigin::Saved { backfilled } => ("saved", backfilled.clone(), None),
            LoadOrigin::Fresh => ("fresh", Vec::new(), None),
            LoadOrigin::Discarded { reason } => ("discarded", Vec::new(), Some(reason.clone())),
        };
        Self {
            path,
            source,
            backfilled,
            reason,
            written,
        }
    }
}
