//! Save-file round trips through the headless building blocks.

use hearth_core::buildings::BuildingKind;
use hearth_core::persistence::{self, FileStore, LoadOrigin};
use hearth_core::session::{Session, Settlement};
use hearth_headless::{Action, MigrationReport, Runner, SimulatedClock, StrategyKind};
use hearth_test_utils::fixtures::{seeded_rng, EPOCH, HOUR_MS};

#[test]
fn test_command_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");

    let (mut session, origin) =
        Session::open(FileStore::new(&path), seeded_rng(1), EPOCH).unwrap();
    assert_eq!(origin, LoadOrigin::Fresh);
    Action::Build {
        kind: BuildingKind::Quarry,
    }
    .apply(&mut session, EPOCH)
    .unwrap();
    drop(session);

    let (session, origin) =
        Session::open(FileStore::new(&path), seeded_rng(1), EPOCH + 6_000).unwrap();
    assert!(matches!(origin, LoadOrigin::Saved { .. }));
    assert_eq!(session.buildings().len(), 1);
    assert_eq!(session.buildings()[0].kind, BuildingKind::Quarry);
}

#[test]
fn test_simulated_run_persists_progress() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("save.json");

    let (mut session, _) = Session::open(FileStore::new(&path), seeded_rng(9), EPOCH).unwrap();
    let mut out = Vec::new();
    let summary = Runner::new(
        &mut session,
        StrategyKind::Greedy.build(),
        SimulatedClock::new(EPOCH),
        1_000,
    )
    .run(Some(HOUR_MS / 1_000), &mut out)
    .unwrap();
    drop(session);

    let reloaded = persistence::load(&FileStore::new(&path), summary.finished_at);
    assert_eq!(reloaded.state.buildings.len(), summary.buildings);
    assert_eq!(reloaded.state.troops, summary.troops);
    assert_eq!(reloaded.state.last_update, summary.finished_at);

    let lines = String::from_utf8(out).unwrap();
    let last = lines.lines().last().unwrap();
    let value: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(value["type"], "summary");
    assert_eq!(value["ticks"], HOUR_MS / 1_000);
}

#[test]
fn test_migrate_old_save_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.json");
    std::fs::write(
        &path,
        r#"{"resources":{"wood":5,"stone":6,"food":7},"buildings":[{"type":"farm","level":3}],"queue":null}"#,
    )
    .unwrap();

    let mut store = FileStore::new(&path);
    let loaded = persistence::load(&store, EPOCH);
    persistence::save(&mut store, &loaded.state).unwrap();
    let report = MigrationReport::new(path.display().to_string(), &loaded.origin, true);
    assert_eq!(
        report.backfilled,
        vec!["troops", "trainingQueue", "raidQueue", "lastUpdate"]
    );

    let rewritten: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(rewritten["troops"], 0);
    assert_eq!(rewritten["lastUpdate"], EPOCH);
    assert_eq!(rewritten["buildings"][0]["level"], 3);

    // A second migration has nothing left to fill.
    let again = persistence::load(&FileStore::new(&path), EPOCH + 1);
    assert_eq!(again.origin, LoadOrigin::Saved { backfilled: vec![] });
}
