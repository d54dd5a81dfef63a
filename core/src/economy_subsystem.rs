//! Economy subsystem: income collection and debt tracking.
//!
//! Execution: every economic firing.
//! Reaching the debt limit is reported through the ledger; the engine
//! owns the resulting phase change.

use crate::{
    clock::ScheduleKind,
    error::SimResult,
    event::SimEvent,
    ledger::CityLedger,
    subsystem::{SimSubsystem, TickContext},
};

#[derive(Debug, Default)]
pub struct EconomySubsystem;

impl EconomySubsystem {
    pub fn new() -> Self { Self }
}

impl SimSubsystem for EconomySubsystem {
    fn name(&self) -> &'static str { "economy" }

    fn schedule(&self) -> ScheduleKind { ScheduleKind::Economic }

    fn update(&mut self, ctx: &TickContext, ledger: &mut CityLedger) -> SimResult<Vec<SimEvent>> {
        let income = ledger.income();
        let game_over = ledger.advance_economic_tick();

        log::debug!(
            "cycle={} economy: income={income} money={} negative_cycles={}",
            ctx.cycle,
            ledger.money(),
            ledger.negative_cycles()
        );

        let mut events = vec![SimEvent::IncomeCollected {
            cycle:           ctx.cycle,
            income,
            money:           ledger.money(),
            negative_cycles: ledger.negative_cycles(),
        }];
        if game_over {
            events.push(SimEvent::GameOver { cycle: ctx.cycle });
        }
        Ok(events)
    }
}
