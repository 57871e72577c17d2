//! Building catalog and building instances.
//!
//! The catalog is a fixed, process-wide table: one [`BuildingDefinition`]
//! per [`BuildingKind`]. Instances in the settlement only store their kind
//! and level and look everything else up here.

use serde::{Deserialize, Serialize};

use crate::resources::{Cost, ResourceKind};

/// Identifies a building type. Serialized as its lowercase key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    /// Produces wood.
    Woodcutter,
    /// Produces stone.
    Quarry,
    /// Produces food.
    Farm,
    /// Produces nothing; speeds up troop training.
    Barracks,
}

impl BuildingKind {
    /// Every building kind, in catalog order.
    pub const ALL: [Self; 4] = [Self::Woodcutter, Self::Quarry, Self::Farm, Self::Barracks];

    /// Static definition for this kind.
    #[must_use]
    pub const fn definition(self) -> &'static BuildingDefinition {
        match self {
            Self::Woodcutter => &BUILDING_DEFINITIONS[0],
            Self::Quarry => &BUILDING_DEFINITIONS[1],
            Self::Farm => &BUILDING_DEFINITIONS[2],
            Self::Barracks => &BUILDING_DEFINITIONS[3],
        }
    }

    /// Look up a kind by its key (e.g. `"woodcutter"`).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.definition().key == key)
    }
}

impl std::fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.definition().key)
    }
}

impl std::str::FromStr for BuildingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("unknown building type '{s}'"))
    }
}

/// Immutable constants describing one building type.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingDefinition {
    /// Stable key used in saves.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Resource produced, if any.
    pub produces: Option<ResourceKind>,
    /// Units of `produces` per second at level 1.
    pub base_rate: f64,
    /// Cost to construct at level 1.
    pub base_cost: Cost,
    /// Construction time at level 1, in seconds.
    pub base_time_secs: f64,
}

impl BuildingDefinition {
    /// Resource produced and per-second rate for a building at `level`.
    ///
    /// `None` for buildings that produce nothing.
    #[must_use]
    pub fn output_at(&self, level: u32) -> Option<(ResourceKind, f64)> {
        match self.produces {
            Some(kind) if self.base_rate > 0.0 => Some((kind, self.base_rate * f64::from(level))),
            _ => None,
        }
    }
}

/// The building catalog, indexed in [`BuildingKind::ALL`] order.
pub static BUILDING_DEFINITIONS: [BuildingDefinition; 4] = [
    BuildingDefinition {
        key: "woodcutter",
        name: "Woodcutter",
        produces: Some(ResourceKind::Wood),
        base_rate: 1.0,
        base_cost: Cost::new(0, 20, 10),
        base_time_secs: 5.0,
    },
    BuildingDefinition {
        key: "quarry",
        name: "Quarry",
        produces: Some(ResourceKind::Stone),
        base_rate: 0.8,
        base_cost: Cost::new(20, 0, 10),
        base_time_secs: 6.0,
    },
    BuildingDefinition {
        key: "farm",
        name: "Farm",
        produces: Some(ResourceKind::Food),
        base_rate: 1.0,
        base_cost: Cost::new(20, 10, 0),
        base_time_secs: 5.0,
    },
    BuildingDefinition {
        key: "barracks",
        name: "Barracks",
        produces: None,
        base_rate: 0.0,
        base_cost: Cost::new(40, 40, 20),
        base_time_secs: 10.0,
    },
];

/// A constructed building in the settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Building type.
    #[serde(rename = "type")]
    pub kind: BuildingKind,
    /// Current level, starting at 1.
    pub level: u32,
}

impl Building {
    /// Create a building at the given level.
    #[must_use]
    pub const fn new(kind: BuildingKind, level: u32) -> Self {
        Self { kind, level }
    }

    /// Static definition for this building's kind.
    #[must_use]
    pub const fn definition(&self) -> &'static BuildingDefinition {
        self.kind.definition()
    }

    /// Resource and per-second rate this building currently yields.
    #[must_use]
    pub fn output(&self) -> Option<(ResourceKind, f64)> {
        self.definition().output_at(self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_kinds() {
        for kind in BuildingKind::ALL {
            assert_eq!(kind.definition().key, kind.to_string());
            assert_eq!(BuildingKind::from_key(kind.definition().key), Some(kind));
        }
    }

    #[test]
    fn test_catalog_products() {
        assert_eq!(
            BuildingKind::Woodcutter.definition().produces,
            Some(ResourceKind::Wood)
        );
        assert_eq!(
            BuildingKind::Quarry.definition().produces,
            Some(ResourceKind::Stone)
        );
        assert_eq!(
            BuildingKind::Farm.definition().produces,
            Some(ResourceKind::Food)
        );
        assert_eq!(BuildingKind::Barracks.definition().produces, None);
    }

    #[test]
    fn test_woodcutter_base_values() {
        let def = BuildingKind::Woodcutter.definition();
        assert_eq!(def.base_cost, Cost::new(0, 20, 10));
        assert_eq!(def.base_time_secs, 5.0);
    }

    #[test]
    fn test_output_scales_linearly_with_level() {
        let building = Building::new(BuildingKind::Woodcutter, 3);
        assert_eq!(building.output(), Some((ResourceKind::Wood, 3.0)));
    }

    #[test]
    fn test_barracks_has_no_output() {
        assert_eq!(Building::new(BuildingKind::Barracks, 5).output(), None);
    }

    #[test]
    fn test_parse_unknown_kind() {
        assert!("castle".parse::<BuildingKind>().is_err());
        assert_eq!("farm".parse::<BuildingKind>(), Ok(BuildingKind::Farm));
    }

    #[test]
    fn test_building_serializes_with_type_key() {
        let json = serde_json::to_string(&Building::new(BuildingKind::Quarry, 2)).unwrap();
        assert_eq!(json, r#"{"type":"quarry","level":2}"#);
    }
}
