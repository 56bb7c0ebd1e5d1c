//! Combat ability engine
//!
//! Implements the authoritative ability pipeline:
//! - Ability definitions and data loading
//! - Cooldown table and global cooldown
//! - Resource ledgers (Mana, Energy, Focus) and combo points
//! - Stealth and diminishing returns trackers
//! - Cast/channel state machine with movement interruption
//! - Area target resolution with friendly-fire policy
//! - Combat logging and Bevy integration

pub mod ability;
pub mod ability_config;
pub mod area;
pub mod config;
pub mod constants;
pub mod cooldowns;
pub mod diminishing;
pub mod engine;
pub mod error;
pub mod events;
pub mod log;
pub mod plugin;
pub mod resources;
pub mod rng;
pub mod state;
pub mod stealth;
pub mod world;

pub use ability::{
    AbilityDefinition, ActorId, AreaConfig, AreaShapeConfig, ChannelConfig, CrowdControlCategory,
    DamageType, ResourceKind, TargetHandle,
};
pub use ability_config::{load_ability_library, AbilityLibrary};
pub use config::{load_engine_config, EngineConfig};
pub use engine::{AbilityEngine, CombatSystems, QueueOutcome, UseOutcome, UseResult};
pub use error::{ConfigError, UseRejection};
pub use events::CombatEvent;
pub use state::{InterruptReason, MachineState};
pub use stealth::StealthBreakReason;
pub use world::{ActorSnapshot, CombatWorld, WorldSnapshot};
