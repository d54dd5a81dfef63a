//! Game controller: phases, placement, removal, ticks and notifications.

use citybuilder_core::{
    building::{describe, BuildingKind},
    clock::{ClockEvent, ScheduleKind, SimSpeed},
    engine::{GamePhase, SimEngine, MAX_ADVANCE_UNITS},
    ledger::LedgerField,
    CommandOutcome, PlayerCommand, RejectReason, SimConfig, SimError, SimEvent,
};
use std::sync::{Arc, Mutex};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine_with(config: SimConfig) -> SimEngine {
    init_logs();
    SimEngine::build(config)
}

fn engine() -> SimEngine {
    engine_with(SimConfig::default())
}

fn record_events(engine: &mut SimEngine) -> Arc<Mutex<Vec<SimEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    seen
}

fn rejected(reason: RejectReason) -> CommandOutcome {
    CommandOutcome::Rejected { reason }
}

/// Every aggregate equals seed production plus the sum over placed buildings.
fn assert_ledger_matches_grid(engine: &SimEngine) {
    let config = engine.config();
    let (mut housing, mut maintenance) = (0, 0);
    let (mut power_prod, mut power_use) = (config.seed_power, 0);
    let (mut water_prod, mut water_use) = (config.seed_water, 0);
    for cell in engine.grid().occupied() {
        let d = describe(cell.building().unwrap());
        housing += d.housing_capacity;
        maintenance += d.maintenance_cost;
        power_prod += d.power_production;
        power_use += d.power_consumption;
        water_prod += d.water_production;
        water_use += d.water_consumption;
    }
    let ledger = engine.ledger();
    assert_eq!(ledger.housing_capacity(), housing);
    assert_eq!(ledger.total_maintenance_cost(), maintenance);
    assert_eq!(ledger.power_production(), power_prod);
    assert_eq!(ledger.power_consumption(), power_use);
    assert_eq!(ledger.water_production(), water_prod);
    assert_eq!(ledger.water_consumption(), water_use);
    assert_eq!(
        ledger.income(),
        ledger.population() * config.per_capita_income - maintenance
    );
}

// ── Phases ───────────────────────────────────────────────────

#[test]
fn phase_machine_walks_start_stop_reset() {
    let mut engine = engine();
    assert_eq!(engine.phase(), GamePhase::NotStarted);
    assert_eq!(engine.status(), "Ready to start");

    assert!(engine.start().is_applied());
    assert_eq!(engine.phase(), GamePhase::Running);
    assert_eq!(engine.status(), "Game in progress");
    assert!(engine.clock().is_running());

    assert!(engine.stop().is_applied());
    assert_eq!(engine.phase(), GamePhase::Stopped);
    assert_eq!(engine.status(), "Game paused");
    assert!(!engine.clock().is_running());

    assert!(engine.start().is_applied());
    assert_eq!(engine.phase(), GamePhase::Running);

    assert!(engine.reset().is_applied());
    assert_eq!(engine.phase(), GamePhase::NotStarted);
    assert!(!engine.clock().is_running());
}

#[test]
fn start_and_stop_refuse_redundant_transitions() {
    let mut engine = engine();
    assert_eq!(engine.stop(), rejected(RejectReason::NotRunning));
    engine.start();
    assert_eq!(engine.start(), rejected(RejectReason::AlreadyRunning));
    assert_eq!(engine.status(), RejectReason::AlreadyRunning.message());
    assert_eq!(engine.phase(), GamePhase::Running);
}

#[test]
fn stopped_game_does_not_tick() {
    let mut engine = engine();
    engine.place_building(0, 0, BuildingKind::SmallHouse).unwrap();
    engine.start();
    engine.advance_time(3).unwrap();
    engine.stop();

    let events = engine.advance_time(100).unwrap();
    assert!(events.is_empty());
    assert_eq!(engine.clock().current_time, 3);
    assert_eq!(engine.ledger().population(), 0);
}

#[test]
fn ticks_outside_running_are_ignored() {
    let mut engine = engine();
    let firing = ClockEvent { schedule: ScheduleKind::Economic, at: 10, firing: 1 };
    assert!(engine.handle_tick(firing).unwrap().is_empty());
    assert_eq!(engine.ledger().money(), 10_000);
    assert_eq!(engine.cycle(), 0);
}

// ── Placement and removal ────────────────────────────────────

#[test]
fn first_small_house_before_start() {
    let mut engine = engine();
    let outcome = engine.place_building(0, 0, BuildingKind::SmallHouse).unwrap();

    assert_eq!(outcome, CommandOutcome::Applied { status: "Placed Small House".into() });
    assert_eq!(engine.ledger().money(), 9_000);
    assert_eq!(engine.ledger().housing_capacity(), 10);
    assert_eq!(engine.grid().at(0, 0).unwrap().building(), Some(BuildingKind::SmallHouse));
    assert_eq!(engine.grid().at(0, 0).unwrap().color(), describe(BuildingKind::SmallHouse).color);
    assert_ledger_matches_grid(&engine);
}

#[test]
fn occupied_cell_is_rejected_without_changes() {
    let mut engine = engine();
    engine.place_building(1, 1, BuildingKind::SmallHouse).unwrap();
    let before = engine.save_snapshot();

    let outcome = engine.place_building(1, 1, BuildingKind::MediumHouse).unwrap();
    assert_eq!(outcome, rejected(RejectReason::CellOccupied));
    assert_eq!(
        engine.status(),
        "Cannot place building here. Select 'Remove Building' option first."
    );
    assert_eq!(engine.save_snapshot(), before);
}

#[test]
fn removing_from_an_empty_cell_is_rejected() {
    let mut engine = engine();
    let before = engine.save_snapshot();
    assert_eq!(engine.remove_building(3, 3).unwrap(), rejected(RejectReason::CellEmpty));
    assert_eq!(engine.status(), "No building to remove at this location.");
    assert_eq!(engine.save_snapshot(), before);
}

#[test]
fn removal_refunds_seventy_percent() {
    let mut engine = engine();
    engine.place_building(2, 2, BuildingKind::SmallHouse).unwrap();
    let outcome = engine.remove_building(2, 2).unwrap();

    assert_eq!(
        outcome,
        CommandOutcome::Applied { status: "Removed Small House and refunded $700".into() }
    );
    assert_eq!(engine.ledger().money(), 9_700);
    assert_eq!(engine.ledger().housing_capacity(), 0);
    assert!(!engine.grid().at(2, 2).unwrap().has_building());
    assert_ledger_matches_grid(&engine);
}

#[test]
fn out_of_range_coordinates_are_errors() {
    let mut engine = engine();
    assert!(matches!(
        engine.place_building(15, 0, BuildingKind::SmallHouse),
        Err(SimError::OutOfBounds { .. })
    ));
    assert!(matches!(engine.remove_building(0, 15), Err(SimError::OutOfBounds { .. })));
    assert!(!engine.can_place(99, 99, BuildingKind::SmallHouse));
    assert_eq!(engine.ledger().money(), 10_000);
}

#[test]
fn removal_tool_is_not_placeable() {
    let mut engine = engine();
    assert_eq!(
        engine.place_building(0, 0, BuildingKind::RemoveBuilding).unwrap(),
        rejected(RejectReason::NotABuilding)
    );
}

#[test]
fn power_plant_needs_water() {
    let mut engine = engine_with(SimConfig { starting_money: 100_000, ..SimConfig::default() });
    // Population is zero, so the house goes up despite eating most of the water.
    engine.place_building(0, 0, BuildingKind::LargeHouse).unwrap();
    assert_eq!(engine.ledger().available_water(), 40);
    let before = engine.save_snapshot();

    assert!(!engine.can_place(0, 1, BuildingKind::SmallPowerPlant));
    let outcome = engine.place_building(0, 1, BuildingKind::SmallPowerPlant).unwrap();
    assert_eq!(outcome, rejected(RejectReason::InsufficientResources));
    assert_eq!(engine.status(), "Cannot place building. Check resources and money.");
    assert_eq!(engine.save_snapshot(), before);
}

#[test]
fn power_plant_ignores_a_power_deficit() {
    let mut engine = engine_with(SimConfig { starting_money: 100_000, ..SimConfig::default() });
    engine.place_building(0, 0, BuildingKind::SmallWaterPlant).unwrap();
    engine.place_building(0, 1, BuildingKind::LargeHouse).unwrap();
    assert!(engine.ledger().available_power() < 0);
    assert!(engine.ledger().available_water() >= 50);

    assert!(engine.place_building(0, 2, BuildingKind::SmallPowerPlant).unwrap().is_applied());
    assert_ledger_matches_grid(&engine);
}

#[test]
fn unaffordable_building_is_rejected() {
    let mut engine = engine_with(SimConfig { starting_money: 4_999, ..SimConfig::default() });
    assert!(!engine.can_place(0, 0, BuildingKind::SmallPowerPlant));
    assert_eq!(
        engine.place_building(0, 0, BuildingKind::SmallPowerPlant).unwrap(),
        rejected(RejectReason::InsufficientFunds)
    );
    assert_eq!(engine.ledger().money(), 4_999);
}

#[test]
fn exact_money_is_enough() {
    let mut engine = engine_with(SimConfig { starting_money: 5_000, ..SimConfig::default() });
    assert!(engine.can_place(0, 0, BuildingKind::SmallPowerPlant));
    assert!(engine.place_building(0, 0, BuildingKind::SmallPowerPlant).unwrap().is_applied());
    assert_eq!(engine.ledger().money(), 0);
}

#[test]
fn can_remove_tracks_occupancy_and_phase() {
    let mut engine = engine_with(SimConfig { starting_money: 5_000, ..SimConfig::default() });
    engine.place_building(0, 0, BuildingKind::SmallPowerPlant).unwrap();

    assert!(engine.can_remove(0, 0));
    assert!(!engine.can_remove(0, 1));
    assert!(!engine.can_remove(15, 0));
    assert!(!engine.can_remove(0, 99));

    engine.select_tool(Some(BuildingKind::RemoveBuilding));
    assert!(engine.can_click(0, 0));
    assert!(!engine.can_click(0, 1));

    // Income is -100 with no money left: two cycles end the game.
    engine.start();
    engine.advance_time(20).unwrap();
    assert_eq!(engine.phase(), GamePhase::GameOver);
    assert!(engine.grid().at(0, 0).unwrap().has_building());
    assert!(!engine.can_remove(0, 0));
    assert!(!engine.can_click(0, 0));
}

#[test]
fn oversized_advance_is_refused() {
    let mut engine = engine();
    engine.place_building(0, 0, BuildingKind::SmallHouse).unwrap();
    engine.start();

    let err = engine.advance_time(MAX_ADVANCE_UNITS + 1).unwrap_err();
    assert!(matches!(err, SimError::AdvanceTooLong { .. }));
    assert!(engine.execute(PlayerCommand::Advance { units: u64::MAX }).is_err());
    assert_eq!(engine.clock().current_time, 0);

    engine.advance_time(MAX_ADVANCE_UNITS).unwrap();
    assert_eq!(engine.clock().current_time, MAX_ADVANCE_UNITS);
}

#[test]
fn placement_and_removal_keep_aggregates_consistent() {
    let mut engine = engine_with(SimConfig { starting_money: 1_000_000, ..SimConfig::default() });
    engine.start();
    let tools = SimEngine::available_tools();

    for i in 0..300usize {
        let (row, column) = ((i * 7) % 15, (i * 11 + i / 15) % 15);
        let kind = tools[1 + (i * 5) % 7];
        if engine.grid().at(row, column).unwrap().has_building() {
            assert!(engine.remove_building(row, column).unwrap().is_applied());
        } else {
            engine.place_building(row, column, kind).unwrap();
        }
        engine.advance_time(1).unwrap();
        assert_ledger_matches_grid(&engine);
    }
    assert_eq!(engine.phase(), GamePhase::Running);
}

// ── Tool selection ───────────────────────────────────────────

#[test]
fn tools_start_with_removal() {
    let tools = SimEngine::available_tools();
    assert_eq!(tools.len(), 8);
    assert_eq!(tools[0], BuildingKind::RemoveBuilding);
    assert_eq!(&tools[1..], &BuildingKind::BUILDINGS);
}

#[test]
fn clicking_applies_the_selected_tool() {
    let mut engine = engine();
    assert_eq!(engine.click_cell(5, 5).unwrap(), rejected(RejectReason::NoToolSelected));
    assert!(!engine.can_click(5, 5));

    engine.select_tool(Some(BuildingKind::SmallHouse));
    assert_eq!(engine.selected_tool(), Some(BuildingKind::SmallHouse));
    assert!(engine.can_click(5, 5));
    assert!(engine.click_cell(5, 5).unwrap().is_applied());
    assert_eq!(engine.click_cell(5, 5).unwrap(), rejected(RejectReason::CellOccupied));

    engine.select_tool(Some(BuildingKind::RemoveBuilding));
    assert_eq!(engine.status(), "Removal mode active. Click a building to remove it.");
    assert_eq!(engine.click_cell(6, 6).unwrap(), rejected(RejectReason::CellEmpty));
    assert!(engine.click_cell(5, 5).unwrap().is_applied());
    assert_eq!(engine.grid().building_count(), 0);
}

// ── Ticks ────────────────────────────────────────────────────

#[test]
fn citizens_arrive_then_pay_income() {
    let mut engine = engine();
    engine.place_building(0, 0, BuildingKind::SmallHouse).unwrap();
    engine.start();

    let events = engine.advance_time(5).unwrap();
    assert!(events.contains(&SimEvent::CitizensArrived { count: 1, population: 1 }));
    assert_eq!(engine.ledger().population(), 1);
    assert_eq!(engine.status(), "1 new citizen(s) moved to your city!");

    // At t=10 income is collected before the next arrival.
    engine.advance_time(5).unwrap();
    assert_eq!(engine.ledger().money(), 9_000 + 50 - 10);
    assert_eq!(engine.ledger().population(), 2);
    assert_eq!(engine.ledger().income(), 2 * 50 - 10);
    assert_eq!(engine.cycle(), 1);
}

#[test]
fn two_cycles_in_debt_end_the_game() {
    let mut engine = engine_with(SimConfig { starting_money: 5_000, ..SimConfig::default() });
    let seen = record_events(&mut engine);
    engine.place_building(0, 0, BuildingKind::SmallPowerPlant).unwrap();
    assert_eq!(engine.ledger().income(), -100);
    engine.start();

    engine.advance_time(10).unwrap();
    assert_eq!(engine.ledger().money(), -100);
    assert_eq!(engine.ledger().negative_cycles(), 1);
    assert_eq!(engine.phase(), GamePhase::Running);
    assert_eq!(engine.status(), "Game cycle: 1");

    let events = engine.advance_time(10).unwrap();
    assert!(events.contains(&SimEvent::GameOver { cycle: 2 }));
    assert!(events.contains(&SimEvent::PhaseChanged {
        from: GamePhase::Running,
        to:   GamePhase::GameOver,
    }));
    assert_eq!(engine.phase(), GamePhase::GameOver);
    assert!(engine.ledger().is_game_over());
    assert!(!engine.clock().is_running());
    assert_eq!(engine.status(), "Game Over! You've been in debt for 2 cycles.");
    assert!(seen.lock().unwrap().contains(&SimEvent::GameOver { cycle: 2 }));

    // Terminal until reset.
    assert!(engine.advance_time(100).unwrap().is_empty());
    assert_eq!(engine.ledger().money(), -200);
    assert_eq!(engine.start(), rejected(RejectReason::GameOver));
    assert_eq!(
        engine.place_building(5, 5, BuildingKind::SmallHouse).unwrap(),
        rejected(RejectReason::GameOver)
    );
    assert_eq!(engine.remove_building(0, 0).unwrap(), rejected(RejectReason::GameOver));

    engine.reset();
    assert_eq!(engine.phase(), GamePhase::NotStarted);
    assert_eq!(engine.ledger().money(), 5_000);
    assert!(engine.start().is_applied());
}

#[test]
fn one_debt_cycle_then_recovery_resets_the_counter() {
    let mut engine = engine_with(SimConfig { starting_money: 5_050, ..SimConfig::default() });
    engine.place_building(4, 4, BuildingKind::SmallPowerPlant).unwrap();
    engine.start();

    engine.advance_time(10).unwrap();
    assert_eq!(engine.ledger().money(), -50);
    assert_eq!(engine.ledger().negative_cycles(), 1);

    engine.remove_building(4, 4).unwrap();
    assert_eq!(engine.ledger().money(), 3_450);
    assert_eq!(engine.ledger().income(), 0);

    engine.advance_time(10).unwrap();
    assert_eq!(engine.ledger().negative_cycles(), 0);
    assert_eq!(engine.phase(), GamePhase::Running);
}

#[test]
fn reset_discards_the_city() {
    let mut engine = engine();
    let old_run = engine.run_id.clone();
    engine.set_speed(SimSpeed::FastForward);
    engine.place_building(0, 0, BuildingKind::SmallHouse).unwrap();
    engine.start();
    engine.advance_time(20).unwrap();

    let outcome = engine.reset();
    assert_eq!(outcome.status(), "Game reset. Ready to start.");
    assert_ne!(engine.run_id, old_run);
    assert_eq!(engine.ledger().money(), 10_000);
    assert_eq!(engine.ledger().population(), 0);
    assert_eq!(engine.grid().building_count(), 0);
    assert_eq!(engine.cycle(), 0);
    assert_eq!(engine.clock().current_time, 0);
    assert_eq!(engine.clock().speed, SimSpeed::FastForward);
}

// ── Notifications and dispatch ───────────────────────────────

#[test]
fn placement_publishes_cell_and_ledger_changes() {
    let mut engine = engine();
    let seen = record_events(&mut engine);
    engine.place_building(2, 3, BuildingKind::SmallHouse).unwrap();

    let events = seen.lock().unwrap();
    assert!(events.contains(&SimEvent::BuildingPlaced {
        row: 2,
        column: 3,
        kind: BuildingKind::SmallHouse,
        cost: 1000,
    }));
    assert!(events.iter().any(|e| matches!(e, SimEvent::CellChanged { row: 2, column: 3, .. })));
    let ledger_fields = events
        .iter()
        .find_map(|e| match e {
            SimEvent::LedgerChanged { fields } => Some(fields.clone()),
            _ => None,
        })
        .expect("ledger change published");
    assert!(ledger_fields.contains(&LedgerField::Money));
    assert!(ledger_fields.contains(&LedgerField::HousingCapacity));
    assert!(events.contains(&SimEvent::StatusChanged { message: "Placed Small House".into() }));
}

#[test]
fn rejection_publishes_only_a_status() {
    let mut engine = engine();
    let seen = record_events(&mut engine);
    engine.remove_building(0, 0).unwrap();

    let events = seen.lock().unwrap();
    assert_eq!(
        *events,
        vec![SimEvent::StatusChanged { message: RejectReason::CellEmpty.message().into() }]
    );
}

#[test]
fn commands_dispatch_from_json() {
    let mut engine = engine();
    let place: PlayerCommand = serde_json::from_str(
        r#"{"cmd":"place_building","row":1,"column":2,"kind":"small_house"}"#,
    )
    .unwrap();
    assert!(engine.execute(place).unwrap().is_applied());
    assert!(engine.grid().at(1, 2).unwrap().has_building());

    engine.execute(PlayerCommand::Start).unwrap();
    engine.execute(PlayerCommand::Advance { units: 10 }).unwrap();
    assert_eq!(engine.cycle(), 1);

    let outcome = engine.execute(PlayerCommand::RemoveBuilding { row: 9, column: 9 }).unwrap();
    assert_eq!(outcome, rejected(RejectReason::CellEmpty));
}
