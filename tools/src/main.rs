//! city-runner: headless command source for the city simulation.
//!
//! Usage:
//!   city-runner --ticks 120 --load city.json
//!   city-runner --ipc-mode [--realtime] [--config data/city_config.json]

use anyhow::Result;
use citybuilder_core::{
    engine::{GamePhase, SimEngine, MAX_ADVANCE_UNITS},
    realtime::{self, RealtimeDriver},
    types::{Amount, Tick},
    CommandOutcome, PlayerCommand, SimConfig,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Command { command: PlayerCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    run_id: String,
    phase: GamePhase,
    status: String,
    cycle: u64,
    time: Tick,
    money: Amount,
    income: Amount,
    population: Amount,
    available_housing: Amount,
    available_power: Amount,
    available_water: Amount,
    negative_cycles: u32,
    buildings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<CommandOutcome>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ticks = parse_arg(&args, "--ticks", 0u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let realtime_mode = args.iter().any(|a| a == "--realtime");
    let config_path = find_arg(&args, "--config");
    let load_path = find_arg(&args, "--load");

    let config = match config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let mut engine = SimEngine::build(config);
    if let Some(path) = load_path {
        engine.load_from(Path::new(path))?;
    }

    if ipc_mode {
        run_ipc_loop(engine, realtime_mode)?;
    } else {
        println!("City Builder: city-runner");
        println!("  run_id:  {}", engine.run_id);
        println!("  ticks:   {ticks}");
        println!();
        engine.start();
        let mut remaining = ticks;
        while remaining > 0 && engine.clock().is_running() {
            let chunk = remaining.min(MAX_ADVANCE_UNITS);
            engine.advance_time(chunk)?;
            remaining -= chunk;
        }
        print_summary(&engine);
    }

    Ok(())
}

fn run_ipc_loop(engine: SimEngine, realtime_mode: bool) -> Result<()> {
    let shared = realtime::share(engine);
    let mut driver = realtime_mode.then(|| RealtimeDriver::spawn(shared.clone(), Duration::from_secs(1)));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = {
            let mut engine = realtime::lock(&shared);
            match cmd {
                IpcCommand::Quit => break,
                IpcCommand::GetState => serde_json::to_string(&build_ui_state(&engine, None))?,
                IpcCommand::Command { command } => match engine.execute(command) {
                    Ok(outcome) => serde_json::to_string(&build_ui_state(&engine, Some(outcome)))?,
                    Err(e) => {
                        log::warn!("Command failed: {e}");
                        serde_json::json!({ "error": e.to_string() }).to_string()
                    }
                },
            }
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }

    if let Some(driver) = driver.as_mut() {
        driver.shutdown();
    }
    Ok(())
}

fn build_ui_state(engine: &SimEngine, outcome: Option<CommandOutcome>) -> UiState {
    let ledger = engine.ledger();
    UiState {
        run_id: engine.run_id.clone(),
        phase: engine.phase(),
        status: engine.status().to_string(),
        cycle: engine.cycle(),
        time: engine.clock().current_time,
        money: ledger.money(),
        income: ledger.income(),
        population: ledger.population(),
        available_housing: ledger.available_housing(),
        available_power: ledger.available_power(),
        available_water: ledger.available_water(),
        negative_cycles: ledger.negative_cycles(),
        buildings: engine.grid().building_count(),
        outcome,
    }
}

fn print_summary(engine: &SimEngine) {
    let ledger = engine.ledger();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {}", engine.run_id);
    println!("  phase:           {:?}", engine.phase());
    println!("  final time:      {}", engine.clock().current_time);
    println!("  cycles:          {}", engine.cycle());
    println!("  buildings:       {}", engine.grid().building_count());
    println!("  money:           ${}", ledger.money());
    println!("  income:          ${}", ledger.income());
    println!("  population:      {} / {}", ledger.population(), ledger.housing_capacity());
    println!("  power:           {} free", ledger.available_power());
    println!("  water:           {} free", ledger.available_water());
    println!("  negative cycles: {}", ledger.negative_cycles());
    println!("  status:          {}", engine.status());
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    find_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
