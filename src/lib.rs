//! AbilityCore - authoritative combat ability engine
//!
//! Validates and executes ability use for actors in a shared world:
//! casts, channels, cooldowns, resources, combo points, stealth, crowd
//! control with diminishing returns, and area targeting.
//!
//! This library exposes the engine for embedding and the headless runner
//! for scripted scenarios.

pub mod cli;
pub mod combat;
pub mod headless;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use combat::{AbilityDefinition, AbilityEngine, AbilityLibrary, ActorId, EngineConfig};
pub use headless::{ScenarioConfig, ScenarioRunner};
