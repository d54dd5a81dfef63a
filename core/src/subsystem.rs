//! Subsystem trait and registry.
//!
//! RULE: Every tick handler implements SimSubsystem.
//! The engine calls update() on each subsystem bound to the schedule
//! that fired, in registration order, one at a time.

use crate::{
    clock::ScheduleKind,
    error::SimResult,
    event::SimEvent,
    ledger::CityLedger,
    types::Tick,
};

/// What a subsystem knows about the firing it is handling.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    /// Clock time of the firing.
    pub time:  Tick,
    /// 1-based count of firings of this schedule since the last reset.
    pub cycle: u64,
}

/// The contract every tick handler must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// The schedule whose firings drive this subsystem.
    fn schedule(&self) -> ScheduleKind;

    /// Called once per firing of `schedule()`.
    /// Runs to completion; returns the events it produced.
    fn update(&mut self, ctx: &TickContext, ledger: &mut CityLedger) -> SimResult<Vec<SimEvent>>;
}
