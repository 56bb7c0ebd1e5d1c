//! Ability System - Types and Enums
//!
//! This module contains the immutable, authored description of an ability.
//! Definitions are loaded from `assets/config/abilities.ron` via the
//! `ability_config` module and shared between actors as `Arc`s.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::{DEFAULT_COMBO_POINT_MULTIPLIER, DEFAULT_KNOCKBACK_DISTANCE};

/// Stable identifier of an actor in the simulation registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Targets are actors; the handle is already validated by the caller.
pub type TargetHandle = ActorId;

/// Resource pool an ability draws from.
///
/// Each kind is an independent pool; an ability never draws from two.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Mana - percentage-of-max regeneration, slower in combat.
    #[default]
    Mana,
    /// Energy - flat fast regeneration. Starts full.
    Energy,
    /// Focus - flat slow regeneration. Starts empty.
    Focus,
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Mana => "Mana",
            ResourceKind::Energy => "Energy",
            ResourceKind::Focus => "Focus",
        }
    }
}

/// Crowd-control categories. Diminishing returns are tracked per category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CrowdControlCategory {
    Slow,
    Stun,
    Fear,
    Root,
}

impl CrowdControlCategory {
    pub fn name(&self) -> &'static str {
        match self {
            CrowdControlCategory::Slow => "Slow",
            CrowdControlCategory::Stun => "Stun",
            CrowdControlCategory::Fear => "Fear",
            CrowdControlCategory::Root => "Root",
        }
    }

    /// Stuns and fears stop the victim from using abilities for their duration.
    pub fn locks_abilities(&self) -> bool {
        matches!(self, CrowdControlCategory::Stun | CrowdControlCategory::Fear)
    }
}

/// Types of damage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Physical,
    Fire,
    Frost,
    Nature,
    Shadow,
    Holy,
    Arcane,
}

/// Channel timing. `total_ticks = ceil(duration / tick_interval)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Total channel duration in seconds
    pub duration: f32,
    /// Time between ticks in seconds. The first tick fires on channel start.
    pub tick_interval: f32,
}

impl ChannelConfig {
    /// Number of ticks a full channel produces, including the immediate first tick.
    pub fn total_ticks(&self) -> u32 {
        if self.duration <= 0.0 || self.tick_interval <= 0.0 {
            return 0;
        }
        (self.duration / self.tick_interval).ceil() as u32
    }
}

/// Authored area shape. Sphere centres on the target (or the caster when
/// untargeted); cone and line start at the caster and point at the target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AreaShapeConfig {
    Sphere { radius: f32 },
    Cone { range: f32, half_angle_degrees: f32 },
    Line { range: f32, width: f32 },
}

/// Area block of an ability definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaConfig {
    pub shape: AreaShapeConfig,
    #[serde(default)]
    pub include_allies: bool,
    #[serde(default = "default_true")]
    pub include_enemies: bool,
}

fn default_true() -> bool {
    true
}

fn default_range() -> f32 {
    30.0
}

fn default_combo_point_multiplier() -> f32 {
    DEFAULT_COMBO_POINT_MULTIPLIER
}

fn default_knockback_distance() -> f32 {
    DEFAULT_KNOCKBACK_DISTANCE
}

/// Complete ability definition loaded from RON.
///
/// Immutable once loaded. Fields omitted in the config file take the
/// defaults an instant, targeted, GCD-bound mana ability would have.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Unique identifier (key in the abilities file)
    #[serde(default)]
    pub id: String,
    /// Display name of the ability
    pub name: String,

    // === Timing ===
    /// Cast time in seconds (0.0 = instant unless channeled)
    #[serde(default)]
    pub cast_time: f32,
    /// Channel timing (None = not channeled)
    #[serde(default)]
    pub channel: Option<ChannelConfig>,
    /// Cooldown in seconds, started when the ability is accepted
    #[serde(default)]
    pub cooldown: f32,
    /// Whether acceptance starts (and is blocked by) the global cooldown
    #[serde(default = "default_true")]
    pub affected_by_gcd: bool,

    // === Cost ===
    #[serde(default)]
    pub resource_cost: f32,
    #[serde(default)]
    pub resource_kind: ResourceKind,

    // === Targeting ===
    #[serde(default = "default_true")]
    pub requires_target: bool,
    /// Maximum range in units
    #[serde(default = "default_range")]
    pub range: f32,
    /// Minimum range (dead zone); 0.0 disables the check
    #[serde(default)]
    pub min_range: f32,

    // === Stealth ===
    #[serde(default)]
    pub requires_stealth: bool,
    #[serde(default = "default_true")]
    pub breaks_stealth: bool,
    /// Executing this ability puts the caster into stealth (Stealth, Vanish)
    #[serde(default)]
    pub enters_stealth: bool,

    // === Combo Points ===
    /// Combo points added on execution (0 = not a generator)
    #[serde(default)]
    pub generates_combo_points: u8,
    /// Finisher: consumes every combo point and scales damage
    #[serde(default)]
    pub consumes_combo_points: bool,
    /// Damage multiplier per consumed point (0.2 = +20% per point)
    #[serde(default = "default_combo_point_multiplier")]
    pub combo_point_multiplier: f32,

    // === Damage & Healing ===
    #[serde(default)]
    pub damage_min: f32,
    #[serde(default)]
    pub damage_max: f32,
    #[serde(default)]
    pub damage_type: DamageType,
    #[serde(default)]
    pub healing: f32,
    /// Fraction of damage dealt returned to the caster as healing (Drain Life)
    #[serde(default)]
    pub heal_on_damage_percent: f32,

    // === Crowd Control & Displacement ===
    #[serde(default)]
    pub crowd_control: Option<CrowdControlCategory>,
    /// Overrides the configured base duration for the category
    #[serde(default)]
    pub cc_duration: Option<f32>,
    /// Pulls the target to the caster (Death Grip)
    #[serde(default)]
    pub is_pull_effect: bool,
    /// Pushes the caster away from the target (Disengage)
    #[serde(default)]
    pub is_knockback_self: bool,
    #[serde(default = "default_knockback_distance")]
    pub knockback_distance: f32,

    // === Area ===
    #[serde(default)]
    pub area: Option<AreaConfig>,
}

impl AbilityDefinition {
    /// Minimal instant ability with every flag at its default.
    /// Handy as a base for struct-update syntax.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cast_time: 0.0,
            channel: None,
            cooldown: 0.0,
            affected_by_gcd: true,
            resource_cost: 0.0,
            resource_kind: ResourceKind::Mana,
            requires_target: true,
            range: default_range(),
            min_range: 0.0,
            requires_stealth: false,
            breaks_stealth: true,
            enters_stealth: false,
            generates_combo_points: 0,
            consumes_combo_points: false,
            combo_point_multiplier: DEFAULT_COMBO_POINT_MULTIPLIER,
            damage_min: 0.0,
            damage_max: 0.0,
            damage_type: DamageType::Physical,
            healing: 0.0,
            heal_on_damage_percent: 0.0,
            crowd_control: None,
            cc_duration: None,
            is_pull_effect: false,
            is_knockback_self: false,
            knockback_distance: DEFAULT_KNOCKBACK_DISTANCE,
            area: None,
        }
    }

    /// No cast time and not channeled.
    pub fn is_instant(&self) -> bool {
        self.cast_time <= 0.0 && self.channel.is_none()
    }

    pub fn is_channeled(&self) -> bool {
        self.channel.is_some()
    }

    /// Ticks a full channel produces (0 for non-channeled abilities).
    pub fn total_ticks(&self) -> u32 {
        self.channel.as_ref().map_or(0, ChannelConfig::total_ticks)
    }

    pub fn is_damage(&self) -> bool {
        self.damage_max > 0.0
    }

    pub fn is_heal(&self) -> bool {
        self.healing > 0.0
    }

    pub fn heals_on_damage(&self) -> bool {
        self.heal_on_damage_percent > 0.0
    }

    pub fn generates_combo_point(&self) -> bool {
        self.generates_combo_points > 0
    }

    /// Damage multiplier for a finisher that consumed `points` combo points.
    pub fn combo_multiplier(&self, points: u8) -> f32 {
        1.0 + points as f32 * self.combo_point_multiplier
    }

    /// Check authored invariants. Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name is required".to_string());
        }
        if self.cast_time < 0.0 || self.cooldown < 0.0 || self.resource_cost < 0.0 {
            return Err("cast_time, cooldown and resource_cost must be non-negative".to_string());
        }
        if let Some(channel) = &self.channel {
            if channel.duration <= 0.0 {
                return Err("channeled abilities must have duration > 0".to_string());
            }
            if channel.tick_interval <= 0.0 {
                return Err("channeled abilities must have tick_interval > 0".to_string());
            }
            if self.cast_time > 0.0 {
                return Err("an ability is either cast or channeled, not both".to_string());
            }
        }
        if self.requires_target && self.range <= 0.0 {
            return Err("abilities that require a target must have range > 0".to_string());
        }
        if self.min_range < 0.0 || self.min_range > self.range {
            return Err(format!(
                "min_range {} must be within [0, range {}]",
                self.min_range, self.range
            ));
        }
        if self.damage_max < self.damage_min {
            return Err(format!(
                "damage_max {} must be >= damage_min {}",
                self.damage_max, self.damage_min
            ));
        }
        if !(0.0..=1.0).contains(&self.heal_on_damage_percent) {
            return Err("heal_on_damage_percent must be within [0, 1]".to_string());
        }
        if self.enters_stealth && self.breaks_stealth {
            return Err("an ability that enters stealth cannot also break it".to_string());
        }
        if matches!(self.cc_duration, Some(d) if d < 0.0) {
            return Err("cc_duration must be non-negative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(duration: f32, tick_interval: f32) -> AbilityDefinition {
        AbilityDefinition {
            channel: Some(ChannelConfig { duration, tick_interval }),
            ..AbilityDefinition::new("test_channel", "Test Channel")
        }
    }

    #[test]
    fn test_total_ticks_is_ceiling_of_duration_over_interval() {
        assert_eq!(channel(6.0, 1.0).total_ticks(), 6);
        assert_eq!(channel(5.0, 2.0).total_ticks(), 3);
        assert_eq!(channel(1.0, 1.5).total_ticks(), 1);
    }

    #[test]
    fn test_non_channeled_ability_has_zero_ticks() {
        let def = AbilityDefinition::new("bolt", "Bolt");
        assert_eq!(def.total_ticks(), 0);
        assert!(def.is_instant());
    }

    #[test]
    fn test_channeled_ability_is_not_instant() {
        assert!(!channel(3.0, 1.0).is_instant());
    }

    #[test]
    fn test_combo_multiplier() {
        let def = AbilityDefinition {
            consumes_combo_points: true,
            combo_point_multiplier: 0.25,
            ..AbilityDefinition::new("eviscerate", "Eviscerate")
        };
        assert!((def.combo_multiplier(3) - 1.75).abs() < 1e-6);
        assert_eq!(def.combo_multiplier(0), 1.0);
    }

    #[test]
    fn test_validate_rejects_zero_tick_interval() {
        assert!(channel(5.0, 0.0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_min_range_beyond_range() {
        let def = AbilityDefinition {
            range: 5.0,
            min_range: 8.0,
            ..AbilityDefinition::new("shot", "Shot")
        };
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(AbilityDefinition::new("strike", "Strike").validate().is_ok());
    }
}
