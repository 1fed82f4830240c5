use std::env;
use std::net::SocketAddr;

use cascade_api::{InMemoryScenarioRepository, ScenarioManager};
use cascade_core::scope_provider::InMemoryScopeProvider;
use cascade_core::sweep::{run_sweep, SweepConfig};
use cascade_core::technology::TechnologyCatalog;
use cascade_core::demo_scope;
use contracts::{
    InterventionSchedule, ScenarioConfig, ScenarioConstraints, SimulationType, StimulusParams,
    SCHEMA_VERSION_V1,
};

const DEMO_SCOPE_SEED: u64 = 1337;

fn print_usage() {
    println!("cascade-cli <command>");
    println!("commands:");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
    println!("  simulate <scope_type> <scope_name> [factor] [months]");
    println!("    runs a role-redesign scenario against the demo scope");
    println!("  sweep <scope_type> <scope_name> [draws]");
    println!("    Monte Carlo spread of NPV and adoption for the demo scope");
    println!("  scopes");
    println!("  technologies");
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn parse_factor(value: Option<&String>) -> Result<f64, String> {
    let raw = value.map(String::as_str).unwrap_or("0.6");
    raw.parse::<f64>()
        .map_err(|_| format!("invalid factor: {raw}"))
}

fn parse_months(value: Option<&String>) -> Result<u32, String> {
    let raw = value.map(String::as_str).unwrap_or("36");
    raw.parse::<u32>()
        .map_err(|_| format!("invalid months: {raw}"))
}

fn demo_config(
    scope_type: &str,
    scope_name: &str,
    factor: f64,
    months: u32,
) -> ScenarioConfig {
    ScenarioConfig {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        scenario_name: format!("{scope_name} redesign"),
        scope_type: scope_type.to_string(),
        scope_name: scope_name.to_string(),
        simulation_type: SimulationType::TimeStepped,
        stimulus: StimulusParams::RoleRedesign {
            automation_factor: factor,
            target_classifications: None,
        },
        timeline_months: months,
        constraints: ScenarioConstraints::default(),
        organization: Default::default(),
        schedule: InterventionSchedule::default(),
        discount_rate_annual: 0.10,
        severance_months: 3.0,
        seed: DEMO_SCOPE_SEED,
    }
}

fn demo_manager() -> ScenarioManager {
    ScenarioManager::new(
        Box::new(InMemoryScenarioRepository::new()),
        Box::new(InMemoryScopeProvider::with_demo_fallback(DEMO_SCOPE_SEED)),
        TechnologyCatalog::builtin(),
    )
}

fn run_simulate(args: &[String]) -> Result<(), String> {
    let scope_type = args
        .get(2)
        .cloned()
        .ok_or_else(|| "missing scope_type".to_string())?;
    let scope_name = args
        .get(3)
        .cloned()
        .ok_or_else(|| "missing scope_name".to_string())?;
    let factor = parse_factor(args.get(4))?;
    let months = parse_months(args.get(5))?;

    let manager = demo_manager();
    let config = demo_config(&scope_type, &scope_name, factor, months);
    let (result, warnings) = manager
        .simulate(&config)
        .map_err(|err| format!("simulation failed: {err}"))?;

    let payload =
        serde_json::to_string_pretty(&result).map_err(|err| format!("encode failed: {err}"))?;
    println!("{payload}");
    for warning in warnings {
        println!("warning: {warning}");
    }
    Ok(())
}

fn run_sweep_command(args: &[String]) -> Result<(), String> {
    let scope_type = args
        .get(2)
        .cloned()
        .ok_or_else(|| "missing scope_type".to_string())?;
    let scope_name = args
        .get(3)
        .cloned()
        .ok_or_else(|| "missing scope_name".to_string())?;
    let draws = args
        .get(4)
        .map(|value| {
            value
                .parse::<u32>()
                .map_err(|_| format!("invalid draws: {value}"))
        })
        .transpose()?
        .unwrap_or(200);

    let scope = demo_scope(&scope_type, &scope_name, DEMO_SCOPE_SEED);
    let config = demo_config(&scope_type, &scope_name, 0.6, 36);
    let sweep = SweepConfig {
        draws,
        ..SweepConfig::default()
    };
    let summary = run_sweep(&scope, &config, &TechnologyCatalog::builtin(), sweep)
        .map_err(|err| format!("sweep failed: {err}"))?;
    let payload =
        serde_json::to_string_pretty(&summary).map_err(|err| format!("encode failed: {err}"))?;
    println!("{payload}");
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                println!("serving cascade api on {addr}");
                if let Err(err) = cascade_api::serve(addr).await {
                    eprintln!("server terminated: {err}");
                    std::process::exit(1);
                }
            }
            Err(message) => {
                eprintln!("{message}");
                print_usage();
                std::process::exit(2);
            }
        },
        Some("simulate") => {
            if let Err(message) = run_simulate(&args) {
                eprintln!("{message}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("sweep") => {
            if let Err(message) = run_sweep_command(&args) {
                eprintln!("{message}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("scopes") => {
            let manager = demo_manager();
            if manager.available_scopes().is_empty() {
                println!("no registered scopes; any scope_type/scope_name resolves to a generated demo scope");
            }
            for (scope_type, scope_name) in manager.available_scopes() {
                println!("{scope_type}/{scope_name}");
            }
        }
        Some("technologies") => {
            let catalog = TechnologyCatalog::builtin();
            for name in catalog.names() {
                println!("{name}");
            }
        }
        _ => print_usage(),
    }
}
