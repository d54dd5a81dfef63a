//! The simulation engine: the game controller of the city builder.
//!
//! EXECUTION ORDER within one clock unit (fixed, never reordered):
//!   1. Economy subsystem     (economic firings)
//!   2. Population subsystem  (demographic firings)
//!
//! RULES:
//!   - Every command and every tick runs to completion before the next.
//!   - Placement goes through CityLedger::apply_building, removal through
//!     CityLedger::revert_building. Nothing else edits building aggregates.
//!   - Refused commands return CommandOutcome::Rejected and mutate nothing.
//!   - Out-of-range coordinates are contract violations and return Err.
//!   - GameOver is terminal until reset(): the clock is stopped and
//!     placement, removal and start are refused.
//!   - Every mutation publishes its change notifications on the event bus.

use crate::{
    building::{self, BuildingDescriptor, BuildingKind},
    clock::{ClockEvent, ScheduleKind, SimClock, SimSpeed},
    command::{CommandOutcome, PlayerCommand, RejectReason},
    config::SimConfig,
    economy_subsystem::EconomySubsystem,
    error::{SimError, SimResult},
    event::{EventBus, SimEvent},
    grid::{CellField, Grid},
    ledger::CityLedger,
    population_subsystem::PopulationSubsystem,
    snapshot::{Snapshot, SnapshotFile, SnapshotStore},
    subsystem::{SimSubsystem, TickContext},
    types::{new_run_id, RunId, Tick},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    NotStarted,
    Running,
    Stopped,
    GameOver,
}

/// Largest span one `advance_time` call may cover. Longer runs are chunked
/// by the caller so a shared engine is not held locked indefinitely.
pub const MAX_ADVANCE_UNITS: Tick = 3_600;

const CELL_FIELDS: [CellField; 3] = [CellField::Building, CellField::HasBuilding, CellField::Color];

pub struct SimEngine {
    pub run_id:         RunId,
    config:             SimConfig,
    clock:              SimClock,
    ledger:             CityLedger,
    grid:               Grid,
    phase:              GamePhase,
    status:             String,
    economic_cycles:    u64,
    demographic_cycles: u64,
    selected_tool:      Option<BuildingKind>,
    subsystems:         Vec<Box<dyn SimSubsystem>>,
    bus:                EventBus,
}

impl SimEngine {
    /// Bare engine with no subsystems registered.
    pub fn new(config: SimConfig) -> Self {
        Self {
            run_id:             new_run_id(),
            clock:              SimClock::new(config.economic_period, config.demographic_period),
            ledger:             CityLedger::new(&config),
            grid:               Grid::new(),
            phase:              GamePhase::NotStarted,
            status:             "Ready to start".into(),
            economic_cycles:    0,
            demographic_cycles: 0,
            selected_tool:      None,
            subsystems:         Vec::new(),
            bus:                EventBus::default(),
            config,
        }
    }

    /// Build a fully wired engine with both tick subsystems registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(config: SimConfig) -> Self {
        let mut engine = SimEngine::new(config);
        engine.register(Box::new(EconomySubsystem::new()));
        engine.register(Box::new(PopulationSubsystem::new()));
        engine
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push(subsystem);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&SimEvent) + Send + 'static) {
        self.bus.subscribe(listener);
    }

    // ── State ─────────────────────────────────────────────────

    pub fn config(&self)   -> &SimConfig  { &self.config }
    pub fn clock(&self)    -> &SimClock   { &self.clock }
    pub fn ledger(&self)   -> &CityLedger { &self.ledger }
    pub fn grid(&self)     -> &Grid       { &self.grid }
    pub fn phase(&self)    -> GamePhase   { self.phase }
    pub fn status(&self)   -> &str        { &self.status }

    /// Economic ticks processed since construction, reset or load.
    pub fn cycle(&self) -> u64 {
        self.economic_cycles
    }

    pub fn selected_tool(&self) -> Option<BuildingKind> {
        self.selected_tool
    }

    /// The removal tool first, then every real building.
    pub fn available_tools() -> Vec<BuildingKind> {
        std::iter::once(BuildingKind::RemoveBuilding)
            .chain(BuildingKind::BUILDINGS)
            .collect()
    }

    // ── Validity predicates ───────────────────────────────────

    pub fn can_place(&self, row: usize, column: usize, kind: BuildingKind) -> bool {
        Grid::in_bounds(row, column) && self.check_place(row, column, kind).is_ok()
    }

    pub fn can_remove(&self, row: usize, column: usize) -> bool {
        Grid::in_bounds(row, column) && self.check_remove(row, column).is_ok()
    }

    /// Whether clicking the cell with the selected tool would do anything.
    pub fn can_click(&self, row: usize, column: usize) -> bool {
        match self.selected_tool {
            Some(BuildingKind::RemoveBuilding) => self.can_remove(row, column),
            Some(kind) => self.can_place(row, column, kind),
            None => false,
        }
    }

    fn check_place(
        &self,
        row: usize,
        column: usize,
        kind: BuildingKind,
    ) -> Result<&'static BuildingDescriptor, RejectReason> {
        if self.phase == GamePhase::GameOver {
            return Err(RejectReason::GameOver);
        }
        if !kind.is_building() {
            return Err(RejectReason::NotABuilding);
        }
        if self.grid.at(row, column).map_or(true, |cell| cell.has_building()) {
            return Err(RejectReason::CellOccupied);
        }
        let descriptor = building::describe(kind);
        if !self.ledger.can_afford(descriptor) {
            return Err(RejectReason::InsufficientFunds);
        }
        if !self.ledger.can_support(descriptor) {
            return Err(RejectReason::InsufficientResources);
        }
        Ok(descriptor)
    }

    fn check_remove(&self, row: usize, column: usize) -> Result<BuildingKind, RejectReason> {
        if self.phase == GamePhase::GameOver {
            return Err(RejectReason::GameOver);
        }
        self.grid
            .at(row, column)
            .ok()
            .and_then(|cell| cell.building())
            .ok_or(RejectReason::CellEmpty)
    }

    // ── Building commands ─────────────────────────────────────

    pub fn place_building(
        &mut self,
        row: usize,
        column: usize,
        kind: BuildingKind,
    ) -> SimResult<CommandOutcome> {
        self.grid.at(row, column)?;
        let mut events = Vec::new();

        let descriptor = match self.check_place(row, column, kind) {
            Ok(descriptor) => descriptor,
            Err(reason) => return Ok(self.reject(reason, events)),
        };

        self.grid.place(row, column, kind, descriptor.color)?;
        self.ledger.apply_building(descriptor);

        log::info!(
            "Placed {} at ({row}, {column}); money={}",
            descriptor.name,
            self.ledger.money()
        );
        events.push(SimEvent::BuildingPlaced { row, column, kind, cost: descriptor.cost });
        events.push(SimEvent::CellChanged { row, column, fields: CELL_FIELDS.to_vec() });
        self.flush_ledger(&mut events);
        Ok(self.apply(format!("Placed {}", descriptor.name), events))
    }

    pub fn remove_building(&mut self, row: usize, column: usize) -> SimResult<CommandOutcome> {
        self.grid.at(row, column)?;
        let mut events = Vec::new();

        if let Err(reason) = self.check_remove(row, column) {
            return Ok(self.reject(reason, events));
        }

        let kind = self.grid.clear(row, column)?;
        let descriptor = building::describe(kind);
        let refund = self.ledger.revert_building(descriptor);

        log::info!(
            "Removed {} at ({row}, {column}); refund={refund} money={}",
            descriptor.name,
            self.ledger.money()
        );
        events.push(SimEvent::BuildingRemoved { row, column, kind, refund });
        events.push(SimEvent::CellChanged { row, column, fields: CELL_FIELDS.to_vec() });
        self.flush_ledger(&mut events);
        Ok(self.apply(format!("Removed {} and refunded ${refund}", descriptor.name), events))
    }

    /// Select a building to place, the removal tool, or nothing.
    pub fn select_tool(&mut self, kind: Option<BuildingKind>) -> CommandOutcome {
        self.selected_tool = kind;
        let status = match kind {
            Some(BuildingKind::RemoveBuilding) => "Removal mode active. Click a building to remove it.",
            Some(_) => "Building placement mode active.",
            None => "No tool selected.",
        };
        self.apply(status.to_string(), Vec::new())
    }

    /// Apply the selected tool to a cell.
    pub fn click_cell(&mut self, row: usize, column: usize) -> SimResult<CommandOutcome> {
        let occupied = self.grid.at(row, column)?.has_building();
        match self.selected_tool {
            Some(BuildingKind::RemoveBuilding) => self.remove_building(row, column),
            Some(_) if occupied => Ok(self.reject(RejectReason::CellOccupied, Vec::new())),
            Some(kind) => self.place_building(row, column, kind),
            None => Ok(self.reject(RejectReason::NoToolSelected, Vec::new())),
        }
    }

    // ── Game control ──────────────────────────────────────────

    pub fn start(&mut self) -> CommandOutcome {
        match self.phase {
            GamePhase::GameOver => return self.reject(RejectReason::GameOver, Vec::new()),
            GamePhase::Running => return self.reject(RejectReason::AlreadyRunning, Vec::new()),
            GamePhase::NotStarted | GamePhase::Stopped => {}
        }
        self.clock.start();
        let mut events = Vec::new();
        self.transition(GamePhase::Running, &mut events);
        self.apply("Game in progress".into(), events)
    }

    pub fn stop(&mut self) -> CommandOutcome {
        match self.phase {
            GamePhase::Running => {}
            GamePhase::GameOver => return self.reject(RejectReason::GameOver, Vec::new()),
            GamePhase::NotStarted | GamePhase::Stopped => {
                return self.reject(RejectReason::NotRunning, Vec::new())
            }
        }
        self.clock.stop();
        let mut events = Vec::new();
        self.transition(GamePhase::Stopped, &mut events);
        self.apply("Game paused".into(), events)
    }

    /// Discard the ledger and grid and start over from scratch.
    pub fn reset(&mut self) -> CommandOutcome {
        let occupied: Vec<(usize, usize)> =
            self.grid.occupied().map(|cell| (cell.row(), cell.column())).collect();

        let speed = self.clock.speed;
        self.clock = SimClock::new(self.config.economic_period, self.config.demographic_period);
        self.clock.set_speed(speed);
        self.ledger = CityLedger::new(&self.config);
        self.grid = Grid::new();
        self.economic_cycles = 0;
        self.demographic_cycles = 0;
        self.run_id = new_run_id();

        log::info!("Game reset; new run {}", self.run_id);
        let mut events = vec![SimEvent::GameReset { run_id: self.run_id.clone() }];
        self.transition(GamePhase::NotStarted, &mut events);
        events.extend(occupied.into_iter().map(|(row, column)| SimEvent::CellChanged {
            row,
            column,
            fields: CELL_FIELDS.to_vec(),
        }));
        self.ledger.mark_all();
        self.flush_ledger(&mut events);
        self.apply("Game reset. Ready to start.".into(), events)
    }

    // ── Time ──────────────────────────────────────────────────

    /// Advance the clock `units` time units, handling every firing.
    /// Stops early if the clock is disarmed (game over).
    pub fn advance_time(&mut self, units: Tick) -> SimResult<Vec<SimEvent>> {
        if units > MAX_ADVANCE_UNITS {
            return Err(SimError::AdvanceTooLong { units, max: MAX_ADVANCE_UNITS });
        }
        let mut produced = Vec::new();
        for _ in 0..units {
            if !self.clock.is_running() {
                break;
            }
            for firing in self.clock.step() {
                // An economic firing may have ended the game this unit.
                if !self.clock.is_running() {
                    break;
                }
                produced.extend(self.handle_tick(firing)?);
            }
        }
        Ok(produced)
    }

    /// Handle one clock firing. Ignored unless the game is running.
    pub fn handle_tick(&mut self, firing: ClockEvent) -> SimResult<Vec<SimEvent>> {
        if self.phase != GamePhase::Running {
            return Ok(Vec::new());
        }
        let cycle = match firing.schedule {
            ScheduleKind::Economic => {
                self.economic_cycles += 1;
                self.economic_cycles
            }
            ScheduleKind::Demographic => {
                self.demographic_cycles += 1;
                self.demographic_cycles
            }
        };
        let ctx = TickContext { time: firing.at, cycle };

        let mut events = Vec::new();
        for subsystem in &mut self.subsystems {
            if subsystem.schedule() == firing.schedule {
                log::trace!("t={} running {} (cycle {cycle})", firing.at, subsystem.name());
                events.extend(subsystem.update(&ctx, &mut self.ledger)?);
            }
        }
        self.flush_ledger(&mut events);

        let status = match firing.schedule {
            ScheduleKind::Economic if self.ledger.is_game_over() => {
                self.clock.stop();
                self.transition(GamePhase::GameOver, &mut events);
                log::info!("Game over at cycle {cycle}: money={}", self.ledger.money());
                Some(format!(
                    "Game Over! You've been in debt for {} cycles.",
                    self.ledger.negative_cycles()
                ))
            }
            ScheduleKind::Economic => Some(format!("Game cycle: {cycle}")),
            ScheduleKind::Demographic => events.iter().find_map(|event| match event {
                SimEvent::CitizensArrived { count, .. } => {
                    Some(format!("{count} new citizen(s) moved to your city!"))
                }
                _ => None,
            }),
        };
        if let Some(status) = status {
            self.set_status(status, &mut events);
        }

        self.publish(&events);
        Ok(events)
    }

    // ── Persistence ───────────────────────────────────────────

    pub fn save_snapshot(&self) -> Snapshot {
        SnapshotStore::save(&self.ledger, &self.grid)
    }

    /// Replace the ledger and grid with the snapshot's contents.
    /// On error nothing changes.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> SimResult<CommandOutcome> {
        let (ledger, grid) = SnapshotStore::load(snapshot, &self.config)?;
        Ok(self.restore(ledger, grid))
    }

    pub fn save_to(&mut self, path: &Path) -> SimResult<CommandOutcome> {
        let file = SnapshotFile::new(self.run_id.clone(), self.save_snapshot());
        SnapshotStore::write(path, &file)?;
        Ok(self.apply(format!("Game saved to {}", path.display()), Vec::new()))
    }

    pub fn load_from(&mut self, path: &Path) -> SimResult<CommandOutcome> {
        let file = SnapshotStore::read(path)?;
        let (ledger, grid) = SnapshotStore::load(&file.snapshot, &self.config)?;
        self.run_id = file.run_id;
        Ok(self.restore(ledger, grid))
    }

    fn restore(&mut self, ledger: CityLedger, grid: Grid) -> CommandOutcome {
        self.clock.stop();
        self.ledger = ledger;
        self.grid = grid;
        self.economic_cycles = 0;
        self.demographic_cycles = 0;

        let mut events = vec![SimEvent::SnapshotRestored { run_id: self.run_id.clone() }];
        let phase = if self.ledger.is_game_over() { GamePhase::GameOver } else { GamePhase::Stopped };
        self.transition(phase, &mut events);
        events.extend(self.grid.cells().iter().map(|cell| SimEvent::CellChanged {
            row:    cell.row(),
            column: cell.column(),
            fields: CELL_FIELDS.to_vec(),
        }));
        self.ledger.mark_all();
        self.flush_ledger(&mut events);
        log::info!("Snapshot restored into run {}", self.run_id);
        self.apply("Game loaded.".into(), events)
    }

    // ── Command dispatch ──────────────────────────────────────

    pub fn execute(&mut self, command: PlayerCommand) -> SimResult<CommandOutcome> {
        match command {
            PlayerCommand::Start => Ok(self.start()),
            PlayerCommand::Stop => Ok(self.stop()),
            PlayerCommand::Reset => Ok(self.reset()),
            PlayerCommand::Advance { units } => {
                self.advance_time(units)?;
                Ok(CommandOutcome::Applied { status: self.status.clone() })
            }
            PlayerCommand::SetSpeed { speed } => Ok(self.set_speed(speed)),
            PlayerCommand::PlaceBuilding { row, column, kind } => {
                self.place_building(row, column, kind)
            }
            PlayerCommand::RemoveBuilding { row, column } => self.remove_building(row, column),
            PlayerCommand::SelectTool { kind } => Ok(self.select_tool(kind)),
            PlayerCommand::ClickCell { row, column } => self.click_cell(row, column),
            PlayerCommand::Save { path } => self.save_to(Path::new(&path)),
            PlayerCommand::Load { path } => self.load_from(Path::new(&path)),
        }
    }

    pub fn set_speed(&mut self, speed: SimSpeed) -> CommandOutcome {
        self.clock.set_speed(speed);
        CommandOutcome::Applied { status: self.status.clone() }
    }

    // ── Internals ─────────────────────────────────────────────

    fn transition(&mut self, to: GamePhase, events: &mut Vec<SimEvent>) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        log::info!("Phase {from:?} -> {to:?}");
        events.push(SimEvent::PhaseChanged { from, to });
    }

    fn set_status(&mut self, status: String, events: &mut Vec<SimEvent>) {
        if self.status != status {
            self.status = status.clone();
            events.push(SimEvent::StatusChanged { message: status });
        }
    }

    fn flush_ledger(&mut self, events: &mut Vec<SimEvent>) {
        let fields = self.ledger.take_changes();
        if !fields.is_empty() {
            events.push(SimEvent::LedgerChanged { fields });
        }
    }

    fn publish(&mut self, events: &[SimEvent]) {
        for event in events {
            self.bus.publish(event);
        }
    }

    fn apply(&mut self, status: String, mut events: Vec<SimEvent>) -> CommandOutcome {
        self.set_status(status.clone(), &mut events);
        self.publish(&events);
        CommandOutcome::Applied { status }
    }

    fn reject(&mut self, reason: RejectReason, mut events: Vec<SimEvent>) -> CommandOutcome {
        log::warn!("Command rejected: {reason:?}");
        self.set_status(reason.message().to_string(), &mut events);
        self.publish(&events);
        CommandOutcome::Rejected { reason }
    }
}

