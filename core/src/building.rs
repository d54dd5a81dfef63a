//! Building catalog: static descriptors for every building kind.
//!
//! The table is fixed for the lifetime of the process. Lookup is total:
//! the remove-building tool and unknown names resolve to a zero-valued
//! descriptor instead of failing.

use crate::types::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every kind a player can select.
/// `RemoveBuilding` is a tool, not a building; never feed it to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    RemoveBuilding,
    SmallHouse,
    MediumHouse,
    LargeHouse,
    SmallPowerPlant,
    LargePowerPlant,
    SmallWaterPlant,
    LargeWaterPlant,
}

impl BuildingKind {
    /// Real buildings in catalog order.
    pub const BUILDINGS: [BuildingKind; 7] = [
        Self::SmallHouse,
        Self::MediumHouse,
        Self::LargeHouse,
        Self::SmallPowerPlant,
        Self::LargePowerPlant,
        Self::SmallWaterPlant,
        Self::LargeWaterPlant,
    ];

    pub fn is_building(self) -> bool {
        self != Self::RemoveBuilding
    }

    pub fn is_house(self) -> bool {
        matches!(self, Self::SmallHouse | Self::MediumHouse | Self::LargeHouse)
    }

    pub fn is_power_plant(self) -> bool {
        matches!(self, Self::SmallPowerPlant | Self::LargePowerPlant)
    }

    pub fn is_water_plant(self) -> bool {
        matches!(self, Self::SmallWaterPlant | Self::LargeWaterPlant)
    }

    /// Stable snake_case name, as used in commands and snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RemoveBuilding  => "remove_building",
            Self::SmallHouse      => "small_house",
            Self::MediumHouse     => "medium_house",
            Self::LargeHouse      => "large_house",
            Self::SmallPowerPlant => "small_power_plant",
            Self::LargePowerPlant => "large_power_plant",
            Self::SmallWaterPlant => "small_water_plant",
            Self::LargeWaterPlant => "large_water_plant",
        }
    }

    /// Accepts either the snake_case key or the display name.
    pub fn from_name(name: &str) -> Option<Self> {
        std::iter::once(Self::RemoveBuilding)
            .chain(Self::BUILDINGS)
            .find(|kind| kind.as_str() == name || describe(*kind).name == name)
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(describe(*self).name)
    }
}

/// Display color of a cell or building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    White,
    Gray,
    Red,
    LightGreen,
    Green,
    DarkGreen,
    Yellow,
    Orange,
    LightBlue,
    Blue,
}

/// Immutable static data describing one building kind's costs and yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildingDescriptor {
    pub name:              &'static str,
    pub kind:              Option<BuildingKind>,
    pub cost:              Amount,
    pub maintenance_cost:  Amount,
    pub water_consumption: Amount,
    pub power_consumption: Amount,
    pub housing_capacity:  Amount,
    pub water_production:  Amount,
    pub power_production:  Amount,
    pub color:             Color,
}

impl BuildingDescriptor {
    const fn zero(name: &'static str, kind: Option<BuildingKind>, color: Color) -> Self {
        Self {
            name,
            kind,
            cost: 0,
            maintenance_cost: 0,
            water_consumption: 0,
            power_consumption: 0,
            housing_capacity: 0,
            water_production: 0,
            power_production: 0,
            color,
        }
    }
}

// kind: cost / maintenance / water use / power use / housing / water prod / power prod
const fn entry(
    name: &'static str,
    kind: BuildingKind,
    [cost, maintenance_cost, water_consumption, power_consumption, housing_capacity, water_production, power_production]: [Amount; 7],
    color: Color,
) -> BuildingDescriptor {
    BuildingDescriptor {
        name,
        kind: Some(kind),
        cost,
        maintenance_cost,
        water_consumption,
        power_consumption,
        housing_capacity,
        water_production,
        power_production,
        color,
    }
}

static SMALL_HOUSE: BuildingDescriptor =
    entry("Small House", BuildingKind::SmallHouse, [1000, 10, 10, 10, 10, 0, 0], Color::LightGreen);
static MEDIUM_HOUSE: BuildingDescriptor =
    entry("Medium House", BuildingKind::MediumHouse, [2000, 25, 25, 25, 30, 0, 0], Color::Green);
static LARGE_HOUSE: BuildingDescriptor =
    entry("Large House", BuildingKind::LargeHouse, [5000, 60, 60, 60, 80, 0, 0], Color::DarkGreen);
static SMALL_POWER_PLANT: BuildingDescriptor =
    entry("Small Power Plant", BuildingKind::SmallPowerPlant, [5000, 100, 50, 0, 0, 0, 200], Color::Yellow);
static LARGE_POWER_PLANT: BuildingDescriptor =
    entry("Large Power Plant", BuildingKind::LargePowerPlant, [10000, 250, 150, 0, 0, 0, 500], Color::Orange);
static SMALL_WATER_PLANT: BuildingDescriptor =
    entry("Small Water Plant", BuildingKind::SmallWaterPlant, [3000, 80, 0, 50, 0, 200, 0], Color::LightBlue);
static LARGE_WATER_PLANT: BuildingDescriptor =
    entry("Large Water Plant", BuildingKind::LargeWaterPlant, [8000, 200, 0, 120, 0, 500, 0], Color::Blue);

static REMOVE_BUILDING: BuildingDescriptor =
    BuildingDescriptor::zero("Remove Building", Some(BuildingKind::RemoveBuilding), Color::Red);
static UNKNOWN: BuildingDescriptor = BuildingDescriptor::zero("", None, Color::Gray);

/// Look up the descriptor for `kind`. Pure and total.
pub fn describe(kind: BuildingKind) -> &'static BuildingDescriptor {
    match kind {
        BuildingKind::SmallHouse      => &SMALL_HOUSE,
        BuildingKind::MediumHouse     => &MEDIUM_HOUSE,
        BuildingKind::LargeHouse      => &LARGE_HOUSE,
        BuildingKind::SmallPowerPlant => &SMALL_POWER_PLANT,
        BuildingKind::LargePowerPlant => &LARGE_POWER_PLANT,
        BuildingKind::SmallWaterPlant => &SMALL_WATER_PLANT,
        BuildingKind::LargeWaterPlant => &LARGE_WATER_PLANT,
        BuildingKind::RemoveBuilding  => &REMOVE_BUILDING,
    }
}

/// Look up a descriptor by its snake_case kind name.
/// Unrecognized names yield the zero-valued descriptor.
pub fn describe_name(name: &str) -> &'static BuildingDescriptor {
    BuildingKind::from_name(name).map(describe).unwrap_or(&UNKNOWN)
}
