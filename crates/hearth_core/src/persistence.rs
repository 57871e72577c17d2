//! Loading and saving the game state.
//!
//! The save is a single JSON record (see [`GameState`] for the field names).
//! There is no version tag. Older saves that predate a field are upgraded by
//! [`migrate`], which fills every missing field from [`FIELD_DEFAULTS`]
//! before the record is decoded. A save that cannot be read or decoded at
//! all is replaced by a fresh default state.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::Result;
use crate::resources::ResourcePool;
use crate::state::{GameState, STARTING_RESOURCES};
use crate::Millis;

/// Byte storage for a single save record.
pub trait StateStore {
    /// Read the saved bytes, or `None` if nothing has been saved yet.
    fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the saved bytes in one step.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Save file on disk.
///
/// Writes go to a sibling temp file which is then renamed over the save, so
/// a crash mid-write leaves the previous save intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the save file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for FileStore {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        std::fs::write(&temp, bytes)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `bytes`.
    #[must_use]
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }

    /// The currently stored bytes.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl StateStore for MemoryStore {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.bytes.clone())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }
}

/// A field name and the value it takes when absent from a save.
pub type FieldDefault = (&'static str, fn(Millis) -> Value);

fn default_resources(_now: Millis) -> Value {
    serde_json::to_value(ResourcePool::uniform(STARTING_RESOURCES)).unwrap_or(Value::Null)
}

fn empty_list(_now: Millis) -> Value {
    Value::Array(Vec::new())
}

fn no_job(_now: Millis) -> Value {
    Value::Null
}

fn zero(_now: Millis) -> Value {
    Value::from(0)
}

fn current_time(now: Millis) -> Value {
    Value::from(now)
}

/// Defaults applied to saves that predate a field.
pub const FIELD_DEFAULTS: &[FieldDefault] = &[
    ("resources", default_resources),
    ("buildings", empty_list),
    ("queue", no_job),
    ("troops", zero),
    ("trainingQueue", no_job),
    ("raidQueue", no_job),
    ("lastUpdate", current_time),
];

/// Fill every absent (or null) field of a save record from
/// [`FIELD_DEFAULTS`].
///
/// Returns the names of the fields that were filled.
pub fn migrate(record: &mut Map<String, Value>, now: Millis) -> Vec<&'static str> {
    let mut filled = Vec::new();
    for &(field, default) in FIELD_DEFAULTS {
        let missing = record.get(field).map_or(true, Value::is_null);
        if missing {
            let value = default(now);
            if !value.is_null() || !record.contains_key(field) {
                filled.push(field);
            }
            record.insert(field.to_string(), value);
        }
    }
    filled
}

/// Save fields holding a [`TimedJob`](crate::jobs::TimedJob).
const JOB_FIELDS: [&str; 3] = ["queue", "trainingQueue", "raidQueue"];

/// Round a numeric timestamp up to whole milliseconds, clamping at zero.
fn whole_millis(value: &mut Value) {
    if value.is_u64() {
        return;
    }
    if let Some(ms) = value.as_f64() {
        *value = Value::from(ms.max(0.0).ceil() as Millis);
    }
}

/// Make every timestamp in a save record a whole, non-negative number of
/// milliseconds, so fractional or negative times don't fail decoding.
fn coerce_timestamps(record: &mut Map<String, Value>) {
    if let Some(last_update) = record.get_mut("lastUpdate") {
        whole_millis(last_update);
    }
    for field in JOB_FIELDS {
        if let Some(Value::Object(job)) = record.get_mut(field) {
            for time in ["startTime", "endTime"] {
                if let Some(value) = job.get_mut(time) {
                    whole_millis(value);
                }
            }
        }
    }
}

/// Where a loaded state came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Decoded from the store, after filling the listed fields.
    Saved {
        /// Fields that were absent and took their default.
        backfilled: Vec<&'static str>,
    },
    /// Nothing was saved yet.
    Fresh,
    /// The save could not be read or decoded and was replaced.
    Discarded {
        /// Why the save was rejected.
        reason: String,
    },
}

/// Result of [`load`].
#[derive(Debug, Clone)]
pub struct Loaded {
    /// The state to play with.
    pub state: GameState,
    /// How it was obtained.
    pub origin: LoadOrigin,
}

/// Decode a save record, migrating older shapes.
///
/// Never fails: undecodable input yields the default state.
#[must_use]
pub fn decode(bytes: &[u8], now: Millis) -> Loaded {
    let parsed = serde_json::from_slice::<Value>(bytes).map_err(|e| e.to_string());
    let record = match parsed {
        Ok(Value::Object(record)) => record,
        Ok(other) => return discarded(format!("expected an object, found {}", json_type(&other)), now),
        Err(reason) => return discarded(reason, now),
    };

    let mut record = record;
    let backfilled = migrate(&mut record, now);
    coerce_timestamps(&mut record);
    match serde_json::from_value::<GameState>(Value::Object(record)) {
        Ok(mut state) => {
            normalize(&mut state);
            Loaded {
                state,
                origin: LoadOrigin::Saved { backfilled },
            }
        }
        Err(e) => discarded(e.to_string(), now),
    }
}

fn discarded(reason: String, now: Millis) -> Loaded {
    tracing::warn!(%reason, "Discarding unreadable save, starting fresh");
    Loaded {
        state: GameState::new(now),
        origin: LoadOrigin::Discarded { reason },
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Repair values the schema allows but the game does not.
fn normalize(state: &mut GameState) {
    for building in &mut state.buildings {
        building.level = building.level.max(1);
    }
    for resource in [
        &mut state.resources.wood,
        &mut state.resources.stone,
        &mut state.resources.food,
    ] {
        if !resource.is_finite() || *resource < 0.0 {
            *resource = 0.0;
        }
    }
}

/// Load the state from `store`, falling back to defaults.
#[must_use]
pub fn load<S: StateStore + ?Sized>(store: &S, now: Millis) -> Loaded {
    let loaded = match store.read() {
        Ok(Some(bytes)) => decode(&bytes, now),
        Ok(None) => Loaded {
            state: GameState::new(now),
            origin: LoadOrigin::Fresh,
        },
        Err(e) => discarded(e.to_string(), now),
    };
    if let LoadOrigin::Saved { backfilled } = &loaded.origin {
        tracing::info!(
            buildings = loaded.state.buildings.len(),
            troops = loaded.state.troops,
            ?backfilled,
            "Loaded saved game"
        );
    }
    loaded
}

/// Encode the state as a save record.
pub fn encode(state: &GameState) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(state)?)
}

/// Write the whole state to `store` in one step.
pub fn save<S: StateStore + ?Sized>(store: &mut S, state: &GameState) -> Result<()> {
    store.write(&encode(state)?)
}
