//! Population subsystem: citizens move into free housing.
//!
//! Execution: every demographic firing. Never changes the game phase.

use crate::{
    clock::ScheduleKind,
    error::SimResult,
    event::SimEvent,
    ledger::CityLedger,
    subsystem::{SimSubsystem, TickContext},
};

#[derive(Debug, Default)]
pub struct PopulationSubsystem;

impl PopulationSubsystem {
    pub fn new() -> Self { Self }
}

impl SimSubsystem for PopulationSubsystem {
    fn name(&self) -> &'static str { "population" }

    fn schedule(&self) -> ScheduleKind { ScheduleKind::Demographic }

    fn update(&mut self, ctx: &TickContext, ledger: &mut CityLedger) -> SimResult<Vec<SimEvent>> {
        let admitted = ledger.advance_population_tick();
        if admitted == 0 {
            return Ok(vec![]);
        }

        log::debug!(
            "cycle={} population: +{admitted} -> {} (free housing {})",
            ctx.cycle,
            ledger.population(),
            ledger.available_housing()
        );

        Ok(vec![SimEvent::CitizensArrived {
            count:      admitted,
            population: ledger.population(),
        }])
    }
}
