//! Engine tuning loaded from `assets/config/engine.ron`.
//!
//! Every field is optional in the file; omitted fields fall back to the
//! values in `constants`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ability::{CrowdControlCategory, ResourceKind};
use super::constants::*;
use super::error::ConfigError;

/// Default location of the engine tuning file.
pub const DEFAULT_ENGINE_CONFIG_PATH: &str = "assets/config/engine.ron";

/// How a resource pool refills over time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RegenModel {
    /// Fraction of max per second, depending on combat state.
    Percent { in_combat: f32, out_of_combat: f32 },
    /// Fixed amount per second regardless of combat state.
    Flat(f32),
}

impl RegenModel {
    /// Amount regenerated per second for a pool of size `max`.
    pub fn per_second(&self, max: f32, in_combat: bool) -> f32 {
        match *self {
            RegenModel::Percent {
                in_combat: rate_in,
                out_of_combat: rate_out,
            } => max * if in_combat { rate_in } else { rate_out },
            RegenModel::Flat(amount) => amount,
        }
    }
}

/// Per-kind pool behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolSettings {
    pub regen: RegenModel,
    /// Whether a freshly registered pool starts at max (otherwise at zero).
    pub starts_full: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    pub mana: PoolSettings,
    pub energy: PoolSettings,
    pub focus: PoolSettings,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            mana: PoolSettings {
                regen: RegenModel::Percent {
                    in_combat: MANA_REGEN_IN_COMBAT,
                    out_of_combat: MANA_REGEN_OUT_OF_COMBAT,
                },
                starts_full: true,
            },
            energy: PoolSettings {
                regen: RegenModel::Flat(ENERGY_REGEN_PER_SECOND),
                starts_full: true,
            },
            focus: PoolSettings {
                regen: RegenModel::Flat(FOCUS_REGEN_PER_SECOND),
                starts_full: false,
            },
        }
    }
}

impl ResourceSettings {
    pub fn for_kind(&self, kind: ResourceKind) -> &PoolSettings {
        match kind {
            ResourceKind::Mana => &self.mana,
            ResourceKind::Energy => &self.energy,
            ResourceKind::Focus => &self.focus,
        }
    }
}

/// Base crowd-control durations before diminishing returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrowdControlDurations {
    pub stun: f32,
    pub fear: f32,
    pub root: f32,
    pub slow: f32,
}

impl Default for CrowdControlDurations {
    fn default() -> Self {
        Self {
            stun: STUN_DURATION,
            fear: FEAR_DURATION,
            root: ROOT_DURATION,
            slow: SLOW_DURATION,
        }
    }
}

impl CrowdControlDurations {
    pub fn base_duration(&self, category: CrowdControlCategory) -> f32 {
        match category {
            CrowdControlCategory::Stun => self.stun,
            CrowdControlCategory::Fear => self.fear,
            CrowdControlCategory::Root => self.root,
            CrowdControlCategory::Slow => self.slow,
        }
    }
}

/// Diminishing returns window and ladder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiminishingReturnsSettings {
    /// Window length in seconds, measured from the first application.
    pub window: f32,
    /// Duration multiplier by application index. Indices past the end
    /// reuse the last entry.
    pub ladder: Vec<f32>,
}

impl Default for DiminishingReturnsSettings {
    fn default() -> Self {
        Self {
            window: DR_WINDOW,
            ladder: DR_LADDER.to_vec(),
        }
    }
}

/// Engine-wide tuning.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub global_cooldown: f32,
    pub slot_count: usize,
    pub movement_interrupt_threshold: f32,
    pub max_combo_points: u8,
    pub spell_queue_window: f32,
    /// Server policy: allies may be hit by harmful area effects.
    pub friendly_fire_enabled: bool,
    pub stealth_reentry_cooldown: f32,
    pub diminishing_returns: DiminishingReturnsSettings,
    pub crowd_control: CrowdControlDurations,
    pub resources: ResourceSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_cooldown: GCD,
            slot_count: DEFAULT_SLOT_COUNT,
            movement_interrupt_threshold: MOVEMENT_INTERRUPT_THRESHOLD,
            max_combo_points: MAX_COMBO_POINTS,
            spell_queue_window: SPELL_QUEUE_WINDOW,
            friendly_fire_enabled: true,
            stealth_reentry_cooldown: STEALTH_REENTRY_COOLDOWN,
            diminishing_returns: DiminishingReturnsSettings::default(),
            crowd_control: CrowdControlDurations::default(),
            resources: ResourceSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a RON document. `origin` only labels errors.
    pub fn from_ron_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: EngineConfig = ron::from_str(contents).map_err(|source| ConfigError::Ron {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.global_cooldown < 0.0 {
            return Err(ConfigError::Invalid(
                "global_cooldown must be non-negative".to_string(),
            ));
        }
        if self.slot_count == 0 {
            return Err(ConfigError::Invalid("slot_count must be at least 1".to_string()));
        }
        if self.movement_interrupt_threshold < 0.0 || self.spell_queue_window < 0.0 {
            return Err(ConfigError::Invalid(
                "movement_interrupt_threshold and spell_queue_window must be non-negative"
                    .to_string(),
            ));
        }
        let dr = &self.diminishing_returns;
        if dr.window <= 0.0 {
            return Err(ConfigError::Invalid(
                "diminishing_returns.window must be positive".to_string(),
            ));
        }
        if dr.ladder.is_empty() {
            return Err(ConfigError::Invalid(
                "diminishing_returns.ladder must not be empty".to_string(),
            ));
        }
        if dr.ladder.iter().any(|m| !(0.0..=1.0).contains(m)) {
            return Err(ConfigError::Invalid(
                "diminishing_returns.ladder entries must be within [0, 1]".to_string(),
            ));
        }
        if dr.ladder.windows(2).any(|pair| pair[1] > pair[0]) {
            return Err(ConfigError::Invalid(
                "diminishing_returns.ladder must be non-increasing".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load engine tuning from a RON file
pub fn load_engine_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = EngineConfig::from_ron_str(&contents, path)?;
    info!("Loaded engine config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = EngineConfig::from_ron_str("()", Path::new("empty.ron")).expect("defaults");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = EngineConfig::from_ron_str(
            "(global_cooldown: 1.0, crowd_control: (stun: 2.0))",
            Path::new("partial.ron"),
        )
        .expect("partial config parses");
        assert_eq!(config.global_cooldown, 1.0);
        assert_eq!(config.crowd_control.stun, 2.0);
        assert_eq!(config.crowd_control.fear, FEAR_DURATION);
        assert_eq!(config.slot_count, DEFAULT_SLOT_COUNT);
    }

    #[test]
    fn test_increasing_ladder_is_invalid() {
        let result = EngineConfig::from_ron_str(
            "(diminishing_returns: (ladder: [0.5, 1.0]))",
            Path::new("ladder.ron"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_percent_regen_depends_on_combat_state() {
        let settings = ResourceSettings::default();
        let mana = settings.for_kind(ResourceKind::Mana).regen;
        assert!((mana.per_second(1000.0, true) - 5.0).abs() < 1e-4);
        assert!((mana.per_second(1000.0, false) - 20.0).abs() < 1e-4);
        let energy = settings.for_kind(ResourceKind::Energy).regen;
        assert_eq!(energy.per_second(100.0, true), energy.per_second(100.0, false));
    }
}
