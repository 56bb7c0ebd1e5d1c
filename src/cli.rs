//! Command-line interface for AbilityCore
//!
//! Runs a scripted scenario headlessly and prints a summary.

use clap::Parser;
use std::path::PathBuf;

use crate::combat::ability_config::DEFAULT_ABILITIES_PATH;
use crate::combat::config::DEFAULT_ENGINE_CONFIG_PATH;

/// Authoritative combat ability engine
#[derive(Parser, Debug)]
#[command(name = "abilitycore")]
#[command(about = "Run scripted ability scenarios headlessly")]
#[command(version)]
pub struct Args {
    /// Scenario JSON file to run
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub scenario: PathBuf,

    /// Ability definitions (RON)
    #[arg(long, value_name = "ABILITIES_FILE", default_value = DEFAULT_ABILITIES_PATH)]
    pub abilities: PathBuf,

    /// Engine tuning (RON); defaults are used when the file is missing
    #[arg(long, value_name = "ENGINE_CONFIG", default_value = DEFAULT_ENGINE_CONFIG_PATH)]
    pub engine_config: PathBuf,

    /// Output path for the combat log (overrides the scenario)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum simulated duration in seconds (overrides the scenario)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Fixed simulation step in seconds (overrides the scenario)
    #[arg(long)]
    pub step: Option<f32>,

    /// Random seed (overrides the scenario)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the result as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_shipped_config() {
        let args = Args::try_parse_from(["abilitycore", "--scenario", "duel.json"])
            .expect("minimal args parse");
        assert_eq!(args.abilities, PathBuf::from(DEFAULT_ABILITIES_PATH));
        assert_eq!(args.engine_config, PathBuf::from(DEFAULT_ENGINE_CONFIG_PATH));
        assert!(args.max_duration.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_scenario_is_required() {
        assert!(Args::try_parse_from(["abilitycore"]).is_err());
    }
}
