//! Headless settlement runner.
//!
//! Drives a [`hearth_core`] session from the terminal: one-shot commands
//! (status, build, upgrade, train, raid), a tick loop in real or simulated
//! time with optional autoplay, and save migration.
//!
//! # Output
//!
//! - **stdout**: JSON responses, one per line (see [`protocol`])
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Show the settlement
//! cargo run -p hearth_headless -- status
//!
//! # Simulate a day of greedy play without waiting
//! cargo run -p hearth_headless -- run --simulated --ticks 86400 --strategy greedy
//! ```

pub mod config;
pub mod protocol;
pub mod runner;
pub mod strategies;

pub use config::{ConfigError, SessionConfig};
pub use protocol::{MigrationReport, Response, RunSummary, StatusReport};
pub use runner::{Clock, RunError, Runner, SimulatedClock, SystemClock};
pub use strategies::{Action, Strategy, StrategyKind};
