//! City ledger: aggregate money and resource state.
//!
//! INVARIANT: every aggregate equals the sum of the descriptors of all
//! placed buildings plus the seed production. Placement goes through
//! `apply_building`, removal through its exact inverse `revert_building`.
//! Nothing else touches the building aggregates.
//!
//! Every mutation records the names of the fields it touched, derived
//! fields included. The engine drains them with `take_changes()`.

use crate::{
    building::BuildingDescriptor,
    config::SimConfig,
    types::Amount,
};
use serde::{Deserialize, Serialize};

/// Named ledger attributes, used as change-notification payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerField {
    Money,
    Income,
    Population,
    HousingCapacity,
    AvailableHousing,
    PowerProduction,
    PowerConsumption,
    AvailablePower,
    WaterProduction,
    WaterConsumption,
    AvailableWater,
    NegativeCycles,
    IsGameOver,
}

impl LedgerField {
    pub const ALL: [LedgerField; 13] = [
        Self::Money,
        Self::Income,
        Self::Population,
        Self::HousingCapacity,
        Self::AvailableHousing,
        Self::PowerProduction,
        Self::PowerConsumption,
        Self::AvailablePower,
        Self::WaterProduction,
        Self::WaterConsumption,
        Self::AvailableWater,
        Self::NegativeCycles,
        Self::IsGameOver,
    ];
}

/// The persisted ledger fields, in the flat snapshot layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub money:             Amount,
    pub income:            Amount,
    pub population:        Amount,
    pub housing_capacity:  Amount,
    pub power_production:  Amount,
    pub power_consumption: Amount,
    pub water_production:  Amount,
    pub water_consumption: Amount,
    pub negative_cycles:   u32,
}

#[derive(Debug, Clone)]
pub struct CityLedger {
    record:                 LedgerRecord,
    total_maintenance_cost: Amount,
    per_capita_income:      Amount,
    growth_percent:         Amount,
    refund_percent:         Amount,
    debt_cycle_limit:       u32,
    changes:                Vec<LedgerField>,
}

impl PartialEq for CityLedger {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
            && self.total_maintenance_cost == other.total_maintenance_cost
    }
}

impl CityLedger {
    /// A fresh ledger: starting money plus seed power and water.
    pub fn new(config: &SimConfig) -> Self {
        let record = LedgerRecord {
            money:             config.starting_money,
            income:            0,
            population:        0,
            housing_capacity:  0,
            power_production:  config.seed_power,
            power_consumption: 0,
            water_production:  config.seed_water,
            water_consumption: 0,
            negative_cycles:   0,
        };
        Self::restore(record, 0, config)
    }

    /// Rebuild a ledger from persisted values without re-deriving anything.
    pub(crate) fn restore(
        record: LedgerRecord,
        total_maintenance_cost: Amount,
        config: &SimConfig,
    ) -> Self {
        Self {
            record,
            total_maintenance_cost,
            per_capita_income: config.per_capita_income,
            growth_percent:    config.growth_percent,
            refund_percent:    config.refund_percent,
            debt_cycle_limit:  config.debt_cycle_limit,
            changes:           Vec::new(),
        }
    }

    pub fn record(&self) -> &LedgerRecord { &self.record }

    pub fn money(&self)             -> Amount { self.record.money }
    pub fn income(&self)            -> Amount { self.record.income }
    pub fn population(&self)        -> Amount { self.record.population }
    pub fn housing_capacity(&self)  -> Amount { self.record.housing_capacity }
    pub fn power_production(&self)  -> Amount { self.record.power_production }
    pub fn power_consumption(&self) -> Amount { self.record.power_consumption }
    pub fn water_production(&self)  -> Amount { self.record.water_production }
    pub fn water_consumption(&self) -> Amount { self.record.water_consumption }
    pub fn negative_cycles(&self)   -> u32    { self.record.negative_cycles }
    pub fn total_maintenance_cost(&self) -> Amount { self.total_maintenance_cost }

    pub fn available_housing(&self) -> Amount {
        self.record.housing_capacity - self.record.population
    }

    pub fn available_power(&self) -> Amount {
        self.record.power_production - self.record.power_consumption
    }

    pub fn available_water(&self) -> Amount {
        self.record.water_production - self.record.water_consumption
    }

    pub fn is_game_over(&self) -> bool {
        self.record.negative_cycles >= self.debt_cycle_limit
    }

    /// Refund for removing a building that cost `cost`.
    /// Nearest integer, halves away from zero.
    pub fn refund_for(&self, cost: Amount) -> Amount {
        let scaled = cost * self.refund_percent;
        let magnitude = (scaled.abs() + 50) / 100;
        magnitude * scaled.signum()
    }

    // ── Building economics ────────────────────────────────────

    pub fn apply_building(&mut self, building: &BuildingDescriptor) {
        self.record.money -= building.cost;
        self.total_maintenance_cost += building.maintenance_cost;
        self.shift_resources(building, 1);
        self.recalculate_income();
        self.mark(&[LedgerField::Money]);
    }

    /// Exact inverse of `apply_building`, plus the removal refund.
    pub fn revert_building(&mut self, building: &BuildingDescriptor) -> Amount {
        let refund = self.refund_for(building.cost);
        self.total_maintenance_cost -= building.maintenance_cost;
        self.shift_resources(building, -1);
        self.record.money += refund;
        self.recalculate_income();
        self.mark(&[LedgerField::Money]);
        refund
    }

    pub fn can_afford(&self, building: &BuildingDescriptor) -> bool {
        self.record.money >= building.cost
    }

    pub fn can_support(&self, building: &BuildingDescriptor) -> bool {
        let has_power = self.available_power() >= building.power_consumption;
        let has_water = self.available_water() >= building.water_consumption;

        let Some(kind) = building.kind else {
            return has_power && has_water;
        };
        if kind.is_power_plant() {
            // Plants only need their intake.
            return has_water;
        }
        if kind.is_water_plant() {
            return has_power;
        }
        if kind.is_house() && self.record.population == 0 {
            // The very first house is always buildable.
            return true;
        }
        has_power && has_water
    }

    fn shift_resources(&mut self, building: &BuildingDescriptor, sign: Amount) {
        let r = &mut self.record;
        r.housing_capacity  += sign * building.housing_capacity;
        r.power_production  += sign * building.power_production;
        r.power_consumption += sign * building.power_consumption;
        r.water_production  += sign * building.water_production;
        r.water_consumption += sign * building.water_consumption;
        self.mark(&[
            LedgerField::HousingCapacity,
            LedgerField::AvailableHousing,
            LedgerField::PowerProduction,
            LedgerField::PowerConsumption,
            LedgerField::AvailablePower,
            LedgerField::WaterProduction,
            LedgerField::WaterConsumption,
            LedgerField::AvailableWater,
        ]);
    }

    fn recalculate_income(&mut self) {
        self.record.income =
            self.record.population * self.per_capita_income - self.total_maintenance_cost;
        self.mark(&[LedgerField::Income]);
    }

    // ── Ticks ─────────────────────────────────────────────────

    /// Collect income and track consecutive negative cycles.
    /// Returns true once the ledger has reached game over.
    pub fn advance_economic_tick(&mut self) -> bool {
        self.record.money += self.record.income;
        if self.record.money < 0 {
            self.record.negative_cycles += 1;
        } else {
            self.record.negative_cycles = 0;
        }
        self.mark(&[
            LedgerField::Money,
            LedgerField::NegativeCycles,
            LedgerField::IsGameOver,
        ]);
        self.is_game_over()
    }

    /// Admit new citizens into free housing. Returns the count admitted.
    pub fn advance_population_tick(&mut self) -> Amount {
        let free = self.available_housing();
        if free <= 0 {
            return 0;
        }
        let growth = (self.record.population * self.growth_percent / 100).max(1);
        let admitted = growth.min(free);
        self.record.population += admitted;
        self.recalculate_income();
        self.mark(&[LedgerField::Population, LedgerField::AvailableHousing]);
        admitted
    }

    // ── Change tracking ───────────────────────────────────────

    fn mark(&mut self, fields: &[LedgerField]) {
        for field in fields {
            if !self.changes.contains(field) {
                self.changes.push(*field);
            }
        }
    }

    /// Mark every field changed, e.g. after the ledger was replaced wholesale.
    pub fn mark_all(&mut self) {
        self.mark(&LedgerField::ALL);
    }

    /// Drain the fields touched since the last call, in first-touched order.
    pub fn take_changes(&mut self) -> Vec<LedgerField> {
        std::mem::take(&mut self.changes)
    }
}
