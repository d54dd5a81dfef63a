//! Economic constants for one simulation instance.
//!
//! Starting money and per-capita income together set the early-game
//! pace, so they are only ever changed as a pair.

use crate::types::{Amount, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub starting_money:     Amount,
    pub per_capita_income:  Amount,
    /// Power available before any plant exists.
    pub seed_power:         Amount,
    /// Water available before any plant exists.
    pub seed_water:         Amount,
    /// Time units between income collections.
    pub economic_period:    Tick,
    /// Time units between population growth steps.
    pub demographic_period: Tick,
    /// Share of the current population admitted per growth step, in percent.
    pub growth_percent:     Amount,
    /// Share of the build cost returned on removal, in percent.
    pub refund_percent:     Amount,
    /// Consecutive negative income cycles that end the game.
    pub debt_cycle_limit:   u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            starting_money:     10_000,
            per_capita_income:  50,
            seed_power:         100,
            seed_water:         100,
            economic_period:    10,
            demographic_period: 5,
            growth_percent:     25,
            refund_percent:     70,
            debt_cycle_limit:   2,
        }
    }
}

impl SimConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.economic_period == 0 || self.demographic_period == 0 {
            anyhow::bail!("tick periods must be at least one time unit");
        }
        if !(0..=100).contains(&self.refund_percent) {
            anyhow::bail!("refund_percent must be within 0..=100, got {}", self.refund_percent);
        }
        if self.growth_percent < 0 {
            anyhow::bail!("growth_percent must not be negative");
        }
        if self.debt_cycle_limit == 0 {
            anyhow::bail!("debt_cycle_limit must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "starting_money": 100000, "per_capita_income": 5 }"#)
            .expect("parse");
        assert_eq!(config.starting_money, 100_000);
        assert_eq!(config.per_capita_income, 5);
        assert_eq!(config.economic_period, 10);
        assert_eq!(config.refund_percent, 70);
    }

    #[test]
    fn zero_period_is_rejected() {
        let config = SimConfig { economic_period: 0, ..SimConfig::default() };
        assert!(config.validate().is_err());
    }
}
