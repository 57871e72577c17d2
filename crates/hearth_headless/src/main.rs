//! Headless Hearthhold runner.
//!
//! Plays the settlement from the terminal. Every command loads the save,
//! catches it up to the current time, acts, and writes it back.
//!
//! # Usage
//!
//! ```bash
//! # Show resources, buildings, queues and prices
//! cargo run -p hearth_headless -- status
//!
//! # Issue commands
//! cargo run -p hearth_headless -- build farm
//! cargo run -p hearth_headless -- upgrade 0
//! cargo run -p hearth_headless -- train
//! cargo run -p hearth_headless -- raid
//!
//! # Tick in real time, letting the greedy strategy play
//! cargo run -p hearth_headless -- run --strategy greedy
//!
//! # Simulate a day instantly
//! cargo run -p hearth_headless -- run --simulated --ticks 86400 --strategy greedy
//!
//! # Backfill missing fields in an old save
//! cargo run -p hearth_headless -- --save old.json migrate
//! ```
//!
//! # Exit Codes
//!
//! - `0`: success
//! - `1`: fatal error (config, I/O)
//! - `2`: the action was refused

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hearth_core::buildings::BuildingKind;
use hearth_core::error::GameError;
use hearth_core::persistence::{self, FileStore, LoadOrigin};
use hearth_core::session::Session;
use hearth_core::Millis;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearth_headless::{
    Action, Clock, MigrationReport, Response, RunError, Runner, SessionConfig, SimulatedClock,
    StatusReport, StrategyKind, SystemClock,
};

/// Ticks a simulated run covers when `--ticks` is not given.
const DEFAULT_SIMULATED_TICKS: u64 = 3_600;

/// Exit code for a refused action.
const EXIT_REFUSED: u8 = 2;

#[derive(Parser)]
#[command(name = "hearth_headless")]
#[command(about = "Headless Hearthhold settlement runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON session config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Save file (overrides the config)
    #[arg(long, global = true)]
    save: Option<PathBuf>,

    /// Seed for raid rolls (overrides the config)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the settlement (default)
    Status,

    /// Construct a new building
    Build {
        /// Building type: woodcutter, quarry, farm or barracks
        kind: BuildingKind,
    },

    /// Upgrade a building by one level
    Upgrade {
        /// Index in the building list (see `status`)
        index: usize,
    },

    /// Train one troop
    Train,

    /// Send troops on a raid
    Raid,

    /// Run the tick loop
    Run {
        /// Number of ticks (default: forever, or 3600 when simulated)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Jump time forward instead of sleeping
        #[arg(long)]
        simulated: bool,

        /// Milliseconds between ticks (overrides the config)
        #[arg(long)]
        interval_ms: Option<Millis>,

        /// Autoplay strategy (overrides the config)
        #[arg(long, value_enum)]
        strategy: Option<StrategyKind>,
    },

    /// Load a save, backfill missing fields and write it back
    Migrate {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON responses
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            eprintln!("FATAL: {e}");
            return ExitCode::FAILURE;
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => cmd_status(&config, &mut out),
        Commands::Build { kind } => cmd_action(&config, Action::Build { kind }, &mut out),
        Commands::Upgrade { index } => cmd_action(&config, Action::Upgrade { index }, &mut out),
        Commands::Train => cmd_action(&config, Action::Train, &mut out),
        Commands::Raid => cmd_action(&config, Action::Raid, &mut out),
        Commands::Run {
            ticks,
            simulated,
            interval_ms,
            strategy,
        } => {
            let mut config = config;
            if let Some(interval_ms) = interval_ms {
                config.tick_interval_ms = interval_ms;
            }
            if let Some(strategy) = strategy {
                config.strategy = strategy;
            }
            if simulated {
                let ticks = ticks.unwrap_or(DEFAULT_SIMULATED_TICKS);
                cmd_run(&config, SimulatedClock::new(SystemClock.now()), Some(ticks), &mut out)
            } else {
                cmd_run(&config, SystemClock, ticks, &mut out)
            }
        }
        Commands::Migrate { dry_run } => cmd_migrate(&config, dry_run, &mut out),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<SessionConfig, hearth_headless::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(save) = &cli.save {
        config.save_path.clone_from(save);
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

fn open_session(config: &SessionConfig, now: Millis) -> Result<Session<FileStore, StdRng>, GameError> {
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let store = FileStore::new(&config.save_path);
    let (session, origin) = Session::open(store, rng, now)?;
    if origin == LoadOrigin::Fresh {
        tracing::info!(path = %config.save_path.display(), "Founding a new settlement");
    }
    Ok(session)
}

fn cmd_status(config: &SessionConfig, out: &mut impl Write) -> Result<ExitCode, RunError> {
    let now = SystemClock.now();
    let session = open_session(config, now)?;
    Response::Status(StatusReport::capture(&session, now)).emit(out)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_action(config: &SessionConfig, action: Action, out: &mut impl Write) -> Result<ExitCode, RunError> {
    let now = SystemClock.now();
    let mut session = open_session(config, now)?;
    match action.apply(&mut session, now) {
        Ok(()) => {
            Response::Ack { action, now }.emit(out)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(GameError::Action(reason)) => {
            Response::Refused {
                action,
                reason: reason.to_string(),
            }
            .emit(out)?;
            Ok(ExitCode::from(EXIT_REFUSED))
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_run<C: Clock>(
    config: &SessionConfig,
    clock: C,
    ticks: Option<u64>,
    out: &mut impl Write,
) -> Result<ExitCode, RunError> {
    let mut session = open_session(config, clock.now())?;
    let strategy = config.strategy.build();
    Runner::new(&mut session, strategy, clock, config.tick_interval_ms).run(ticks, out)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_migrate(config: &SessionConfig, dry_run: bool, out: &mut impl Write) -> Result<ExitCode, RunError> {
    let now = SystemClock.now();
    let mut store = FileStore::new(&config.save_path);
    let loaded = persistence::load(&store, now);
    if !dry_run {
        persistence::save(&mut store, &loaded.state)?;
    }
    let report = MigrationReport::new(
        config.save_path.display().to_string(),
        &loaded.origin,
        !dry_run,
    );
    tracing::info!(source = report.source, backfilled = ?report.backfilled, "Migrated save");
    Response::Migrated(report).emit(out)?;
    Ok(ExitCode::SUCCESS)
}
