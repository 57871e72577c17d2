//! Autoplay strategies for the run loop.
//!
//! A strategy looks at a [`Settlement`] and decides which commands to issue
//! this tick. It only sees what a player sees, through the same trait the
//! terminal commands use.

use clap::ValueEnum;
use hearth_core::actions::RAID_TROOP_COST;
use hearth_core::buildings::BuildingKind;
use hearth_core::resources::Cost;
use hearth_core::session::Settlement;
use hearth_core::Millis;
use serde::{Deserialize, Serialize};

/// A command a strategy (or the terminal) can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Construct a new building.
    Build {
        /// Building type.
        kind: BuildingKind,
    },
    /// Upgrade an existing building.
    Upgrade {
        /// Index in the building list.
        index: usize,
    },
    /// Train one troop.
    Train,
    /// Launch a raid.
    Raid,
}

impl Action {
    /// Issue this action against `settlement`.
    pub fn apply(self, settlement: &mut dyn Settlement, now: Millis) -> hearth_core::error::Result<()> {
        match self {
            Self::Build { kind } => settlement.build_new(kind, now),
            Self::Upgrade { index } => settlement.upgrade_building(index, now),
            Self::Train => settlement.train_troop(now),
            Self::Raid => settlement.send_raid(now),
        }
    }
}

/// Decides what to do each tick.
pub trait Strategy {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Actions to issue at `now`, in order.
    fn decide(&self, settlement: &dyn Settlement, now: Millis) -> Vec<Action>;
}

/// Built-in strategies, selectable from config or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum StrategyKind {
    /// Never act; just let resources pile up.
    #[default]
    Idle,
    /// Spend as soon as anything is affordable.
    Greedy,
}

impl StrategyKind {
    /// Instantiate the strategy.
    #[must_use]
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            Self::Idle => Box::new(Idle),
            Self::Greedy => Box::new(Greedy),
        }
    }
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl Strategy for Idle {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn decide(&self, _settlement: &dyn Settlement, _now: Millis) -> Vec<Action> {
        Vec::new()
    }
}

/// Builds the cheapest affordable producer or upgrade, trains whenever it
/// can and raids whenever it has the troops.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

const PRODUCERS: [BuildingKind; 3] = [
    BuildingKind::Woodcutter,
    BuildingKind::Quarry,
    BuildingKind::Farm,
];

fn total(cost: &Cost) -> u64 {
    cost.wood.saturating_add(cost.stone).saturating_add(cost.food)
}

impl Greedy {
    /// Cheapest affordable construction: a new producer or an upgrade of an
    /// existing producer. Ties go to the earlier candidate.
    fn pick_construction(settlement: &dyn Settlement) -> Option<(Action, Cost)> {
        let new = PRODUCERS
            .iter()
            .map(|&kind| (Action::Build { kind }, settlement.quote_new(kind).cost));
        let upgrades = settlement
            .buildings()
            .iter()
            .enumerate()
            .filter(|(_, b)| PRODUCERS.contains(&b.kind))
            .filter_map(|(index, _)| {
                settlement
                    .quote_upgrade(index)
                    .map(|quote| (Action::Upgrade { index }, quote.cost))
            });
        new.chain(upgrades)
            .filter(|(_, cost)| settlement.can_afford(cost))
            .min_by_key(|(_, cost)| total(cost))
    }
}

impl Strategy for Greedy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn decide(&self, settlement: &dyn Settlement, now: Millis) -> Vec<Action> {
        let [construction, training, raid] = settlement.queue_statuses(now);
        let mut budget = settlement.resources();
        let mut actions = Vec::new();

        if !construction.busy {
            if let Some((action, cost)) = Self::pick_construction(settlement) {
                budget.spend(&cost);
                actions.push(action);
            }
        }
        if !training.busy && budget.can_afford(&settlement.quote_training().cost) {
            actions.push(Action::Train);
        }
        if !raid.busy && settlement.troops() >= RAID_TROOP_COST {
            actions.push(Action::Raid);
        }
        actions
    }
}
