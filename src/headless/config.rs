//! JSON configuration parsing for headless scenarios
//!
//! A scenario lists actors (team, position, loadout, resource pools) and a
//! script of timed commands to issue against them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::combat::ability::ResourceKind;
use crate::combat::ability_config::AbilityLibrary;
use crate::combat::error::ConfigError;

/// One resource pool to register for an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub max: f32,
    /// Starting value (default: full for Mana/Energy, empty for Focus)
    #[serde(default)]
    pub starting: Option<f32>,
}

/// An actor taking part in the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    pub id: u64,
    pub name: String,
    pub team: u8,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_max_health")]
    pub max_health: f32,
    /// Initially selected target (actor id)
    #[serde(default)]
    pub target: Option<u64>,
    /// Ability ids by slot; `null` leaves a slot empty
    #[serde(default)]
    pub loadout: Vec<Option<String>>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    /// Start the scenario in stealth
    #[serde(default)]
    pub stealthed: bool,
    /// Start with in-combat regeneration
    #[serde(default)]
    pub in_combat: bool,
}

fn default_max_health() -> f32 {
    1000.0
}

/// A command issued by the script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScenarioCommand {
    /// Use the ability in `slot`; `queue` allows spell-queue buffering
    Use {
        slot: usize,
        #[serde(default)]
        target: Option<u64>,
        #[serde(default)]
        queue: bool,
    },
    /// Teleport the actor (used to trigger movement interrupts)
    MoveTo { position: [f32; 3] },
    SetTarget {
        #[serde(default)]
        target: Option<u64>,
    },
    Lock { duration: f32 },
    Unlock,
    Interrupt,
    EnterStealth,
    BreakStealth,
    SetInCombat { in_combat: bool },
}

/// A command scheduled at `at` seconds of simulation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at: f32,
    pub actor: u64,
    pub command: ScenarioCommand,
}

/// Headless scenario configuration loaded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub actors: Vec<ActorSpec>,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
    /// Maximum simulated duration in seconds (default: 60)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Fixed simulation step in seconds (default: 1/60)
    #[serde(default = "default_time_step")]
    pub time_step: f32,
    /// Random seed for deterministic damage rolls
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Where to save the combat log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
}

fn default_max_duration() -> f32 {
    60.0
}

fn default_time_step() -> f32 {
    1.0 / 60.0
}

/// Largest step the Bevy virtual clock advances in one frame.
pub const MAX_TIME_STEP: f32 = 0.25;

impl ScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents, path)
    }

    /// Parse and validate a JSON document. `origin` only labels errors.
    pub fn from_json_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: ScenarioConfig =
            serde_json::from_str(contents).map_err(|source| ConfigError::Json {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actors.is_empty() {
            return Err(invalid("scenario must have at least one actor"));
        }
        let mut ids = HashSet::new();
        for actor in &self.actors {
            if !ids.insert(actor.id) {
                return Err(invalid(format!("duplicate actor id {}", actor.id)));
            }
            if actor.max_health <= 0.0 {
                return Err(invalid(format!("actor {} must have max_health > 0", actor.id)));
            }
            for resource in &actor.resources {
                if resource.max < 0.0 {
                    return Err(invalid(format!(
                        "actor {} has a negative {} maximum",
                        actor.id,
                        resource.kind.name()
                    )));
                }
            }
        }
        for actor in &self.actors {
            if let Some(target) = actor.target {
                if !ids.contains(&target) {
                    return Err(invalid(format!(
                        "actor {} targets unknown actor {}",
                        actor.id, target
                    )));
                }
            }
        }
        for (index, step) in self.script.iter().enumerate() {
            if step.at < 0.0 {
                return Err(invalid(format!("script step {} has negative time", index)));
            }
            if !ids.contains(&step.actor) {
                return Err(invalid(format!(
                    "script step {} references unknown actor {}",
                    index, step.actor
                )));
            }
            let target = match &step.command {
                ScenarioCommand::Use { target, .. } | ScenarioCommand::SetTarget { target } => {
                    *target
                }
                _ => None,
            };
            if let Some(target) = target {
                if !ids.contains(&target) {
                    return Err(invalid(format!(
                        "script step {} targets unknown actor {}",
                        index, target
                    )));
                }
            }
        }
        if self.max_duration_secs <= 0.0 {
            return Err(invalid("max_duration_secs must be positive"));
        }
        if self.time_step <= 0.0 || self.time_step > MAX_TIME_STEP {
            return Err(invalid(format!(
                "time_step must be within (0, {}]",
                MAX_TIME_STEP
            )));
        }
        Ok(())
    }

    /// Check every loadout entry against the ability library
    pub fn validate_loadouts(&self, library: &AbilityLibrary) -> Result<(), ConfigError> {
        for actor in &self.actors {
            for id in actor.loadout.iter().flatten() {
                if !library.contains(id) {
                    return Err(invalid(format!(
                        "actor {} loadout references unknown ability '{}'",
                        actor.id, id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "actors": [
            {"id": 1, "name": "Mage", "team": 1, "target": 2, "loadout": ["fireball"]},
            {"id": 2, "name": "Dummy", "team": 2, "position": [0, 0, 20]}
        ],
        "script": [
            {"at": 0.0, "actor": 1, "command": {"type": "Use", "slot": 0}}
        ]
    }"#;

    #[test]
    fn test_defaults_are_applied() {
        let config = ScenarioConfig::from_json_str(MINIMAL, Path::new("minimal.json"))
            .expect("minimal scenario parses");
        assert_eq!(config.max_duration_secs, 60.0);
        assert!((config.time_step - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(config.actors[1].max_health, 1000.0);
        assert_eq!(
            config.script[0].command,
            ScenarioCommand::Use {
                slot: 0,
                target: None,
                queue: false
            }
        );
    }

    #[test]
    fn test_unknown_script_actor_is_rejected() {
        let json = MINIMAL.replace(r#""actor": 1"#, r#""actor": 9"#);
        assert!(ScenarioConfig::from_json_str(&json, Path::new("bad.json")).is_err());
    }

    #[test]
    fn test_duplicate_actor_ids_are_rejected() {
        let json = MINIMAL.replace(r#""id": 2"#, r#""id": 1"#);
        assert!(ScenarioConfig::from_json_str(&json, Path::new("dup.json")).is_err());
    }

    #[test]
    fn test_oversized_time_step_is_rejected() {
        let mut config = ScenarioConfig::from_json_str(MINIMAL, Path::new("minimal.json"))
            .expect("minimal scenario parses");
        config.time_step = 1.0;
        assert!(config.validate().is_err());
    }
}
