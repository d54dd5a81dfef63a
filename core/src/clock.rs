//! Simulation clock: two independent repeating schedules.
//!
//! The economic and demographic schedules share nothing but the time
//! axis. `step()` advances one time unit and reports which schedules
//! fired; the engine runs the handlers serially, economic first.
//! A stopped clock does not advance.

use crate::types::Tick;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Economic,
    Demographic,
}

/// One firing of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockEvent {
    pub schedule: ScheduleKind,
    /// Clock time at which the schedule fired.
    pub at:       Tick,
    /// 1-based count of firings of this schedule since construction.
    pub firing:   u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Schedule {
    kind:      ScheduleKind,
    period:    Tick,
    remaining: Tick,
    firings:   u64,
}

impl Schedule {
    fn new(kind: ScheduleKind, period: Tick) -> Self {
        let period = period.max(1);
        Self { kind, period, remaining: period, firings: 0 }
    }

    fn arm(&mut self) {
        self.remaining = self.period;
    }

    fn step(&mut self, now: Tick) -> Option<ClockEvent> {
        self.remaining -= 1;
        if self.remaining > 0 {
            return None;
        }
        self.remaining = self.period;
        self.firings += 1;
        Some(ClockEvent { schedule: self.kind, at: now, firing: self.firings })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    pub current_time: Tick,
    pub speed:        SimSpeed,
    running:          bool,
    economic:         Schedule,
    demographic:      Schedule,
}

impl SimClock {
    pub fn new(economic_period: Tick, demographic_period: Tick) -> Self {
        Self {
            current_time: 0,
            speed:        SimSpeed::Normal,
            running:      false,
            economic:     Schedule::new(ScheduleKind::Economic, economic_period),
            demographic:  Schedule::new(ScheduleKind::Demographic, demographic_period),
        }
    }

    /// Arm both schedules from the current moment. No-op while running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.economic.arm();
        self.demographic.arm();
        self.running = true;
    }

    /// Disarm both schedules. No-op while stopped.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn period(&self, schedule: ScheduleKind) -> Tick {
        match schedule {
            ScheduleKind::Economic    => self.economic.period,
            ScheduleKind::Demographic => self.demographic.period,
        }
    }

    /// Time units until `schedule` next fires, if running.
    pub fn until_next(&self, schedule: ScheduleKind) -> Option<Tick> {
        if !self.running {
            return None;
        }
        Some(match schedule {
            ScheduleKind::Economic    => self.economic.remaining,
            ScheduleKind::Demographic => self.demographic.remaining,
        })
    }

    /// Advance one time unit. Returns the firings due now, economic first.
    /// Returns nothing and keeps time still while stopped.
    pub fn step(&mut self) -> Vec<ClockEvent> {
        if !self.running {
            return Vec::new();
        }
        self.current_time += 1;
        let now = self.current_time;
        [self.economic.step(now), self.demographic.step(now)]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }

    pub fn units_per_real_second(&self) -> u32 {
        match self.speed {
            SimSpeed::Normal      => 1,
            SimSpeed::Accelerated => 5,
            SimSpeed::FastForward => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Normal,       // 1 unit per real second
    Accelerated,  // 5 units per real second
    FastForward,  // 20 units per real second
}
