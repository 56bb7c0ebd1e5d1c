//! AbilityCore - authoritative combat ability engine
//!
//! Runs a scripted scenario headlessly and prints per-actor results.

use std::process::ExitCode;

use abilitycore::cli::{parse_args, Args};
use abilitycore::combat::error::ConfigError;
use abilitycore::combat::{load_ability_library, load_engine_config, EngineConfig};
use abilitycore::headless::{ScenarioConfig, ScenarioResult, ScenarioRunner};

fn main() -> ExitCode {
    let args = parse_args();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), ConfigError> {
    let library = load_ability_library(&args.abilities)?;
    let engine_config = if args.engine_config.exists() {
        load_engine_config(&args.engine_config)?
    } else {
        EngineConfig::default()
    };

    let mut scenario = ScenarioConfig::load_from_file(&args.scenario)?;
    if let Some(output) = &args.output {
        scenario.output_path = Some(output.display().to_string());
    }
    if let Some(max_duration) = args.max_duration {
        scenario.max_duration_secs = max_duration;
    }
    if let Some(step) = args.step {
        scenario.time_step = step;
    }
    if args.seed.is_some() {
        scenario.random_seed = args.seed;
    }

    let result = ScenarioRunner::new(scenario, library, engine_config)
        .with_logging(!args.json)
        .run()?;

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| ConfigError::Invalid(format!("could not encode result: {}", e)))?;
        println!("{}", json);
    } else {
        print_summary(&result);
    }
    Ok(())
}

fn print_summary(result: &ScenarioResult) {
    println!(
        "Scenario {} after {:.2}s",
        if result.timed_out { "timed out" } else { "finished" },
        result.duration
    );
    for actor in &result.actors {
        println!(
            "  {} (team {}): {:.0}/{:.0} HP, {} executions, {} interrupts, {:.0} dealt, {:.0} taken",
            actor.name,
            actor.team,
            actor.final_health,
            actor.max_health,
            actor.executions,
            actor.interrupts,
            actor.damage_dealt,
            actor.damage_taken
        );
    }
    if let Some(path) = &result.log_path {
        println!("Combat log saved to {}", path.display());
    }
}
