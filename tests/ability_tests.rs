//! Tests for the shipped ability definitions
//!
//! These tests verify that:
//! - `assets/config/abilities.ron` parses and every definition validates
//! - Timing models are consistent (cast vs channel vs instant)
//! - Combo, stealth and crowd-control flags are wired as intended
//! - The shipped engine tuning matches the built-in defaults

use std::path::PathBuf;

use abilitycore::combat::ability::{
    AbilityDefinition, AreaShapeConfig, CrowdControlCategory, DamageType, ResourceKind,
};
use abilitycore::combat::ability_config::{load_ability_library, AbilityLibrary};
use abilitycore::combat::config::{load_engine_config, EngineConfig};

fn asset(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(path)
}

/// Helper to load the shipped ability library
fn load_abilities() -> AbilityLibrary {
    load_ability_library(asset("assets/config/abilities.ron")).expect("shipped abilities load")
}

fn ability(library: &AbilityLibrary, id: &str) -> std::sync::Arc<AbilityDefinition> {
    library
        .get(id)
        .unwrap_or_else(|| panic!("{} should be defined", id))
}

// =============================================================================
// Library Validation Tests
// =============================================================================

#[test]
fn test_all_abilities_validate() {
    let library = load_abilities();
    assert!(library.len() >= 15, "expected a full sample library");
    for id in library.ids() {
        let def = ability(&library, id);
        assert_eq!(def.id, id, "key and id should agree");
        assert!(def.validate().is_ok(), "{} should validate", id);
    }
}

#[test]
fn test_all_abilities_have_names() {
    let library = load_abilities();
    for id in library.ids() {
        assert!(!ability(&library, id).name.is_empty(), "{} should have a name", id);
    }
}

#[test]
fn test_damage_abilities_have_positive_values() {
    let library = load_abilities();
    for id in library.ids() {
        let def = ability(&library, id);
        if def.is_damage() {
            assert!(def.damage_min > 0.0, "{} should have positive damage", id);
            assert!(def.damage_max >= def.damage_min);
        }
    }
}

#[test]
fn test_no_ability_is_both_cast_and_channel() {
    let library = load_abilities();
    for id in library.ids() {
        let def = ability(&library, id);
        assert!(
            !(def.is_channeled() && def.cast_time > 0.0),
            "{} mixes cast and channel",
            id
        );
    }
}

// =============================================================================
// Timing Tests
// =============================================================================

#[test]
fn test_drain_life_channel() {
    let library = load_abilities();
    let drain = ability(&library, "drain_life");
    assert!(drain.is_channeled());
    assert_eq!(drain.total_ticks(), 5);
    assert!(drain.heals_on_damage());
    assert_eq!(drain.damage_type, DamageType::Shadow);
}

#[test]
fn test_fireball_is_cast() {
    let library = load_abilities();
    let fireball = ability(&library, "fireball");
    assert!(!fireball.is_instant());
    assert_eq!(fireball.cast_time, 2.5);
    assert_eq!(fireball.resource_kind, ResourceKind::Mana);
}

#[test]
fn test_off_gcd_abilities() {
    let library = load_abilities();
    for id in ["counterspell", "disengage", "stealth"] {
        assert!(!ability(&library, id).affected_by_gcd, "{} should be off the GCD", id);
    }
}

// =============================================================================
// Combo Point & Stealth Tests
// =============================================================================

#[test]
fn test_rogue_generators_and_finishers() {
    let library = load_abilities();
    assert_eq!(ability(&library, "sinister_strike").generates_combo_points, 1);
    assert_eq!(ability(&library, "ambush").generates_combo_points, 2);

    let eviscerate = ability(&library, "eviscerate");
    assert!(eviscerate.consumes_combo_points);
    assert!((eviscerate.combo_multiplier(3) - 1.75).abs() < 1e-6);
    for id in ["sinister_strike", "ambush", "eviscerate", "cheap_shot"] {
        assert_eq!(ability(&library, id).resource_kind, ResourceKind::Energy);
    }
}

#[test]
fn test_openers_require_stealth() {
    let library = load_abilities();
    for id in ["ambush", "cheap_shot"] {
        let def = ability(&library, id);
        assert!(def.requires_stealth, "{} should require stealth", id);
        assert!(def.breaks_stealth, "{} should break stealth", id);
    }
    let stealth = ability(&library, "stealth");
    assert!(stealth.enters_stealth);
    assert!(!stealth.breaks_stealth);
    assert!(!stealth.requires_target);
}

// =============================================================================
// Crowd Control, Displacement & Area Tests
// =============================================================================

#[test]
fn test_crowd_control_categories() {
    let library = load_abilities();
    assert_eq!(ability(&library, "cheap_shot").crowd_control, Some(CrowdControlCategory::Stun));
    assert_eq!(ability(&library, "fear").crowd_control, Some(CrowdControlCategory::Fear));
    assert_eq!(ability(&library, "frost_nova").crowd_control, Some(CrowdControlCategory::Root));
    assert_eq!(
        ability(&library, "concussive_shot").crowd_control,
        Some(CrowdControlCategory::Slow)
    );
}

#[test]
fn test_displacement_abilities() {
    let library = load_abilities();
    assert!(ability(&library, "death_grip").is_pull_effect);
    let disengage = ability(&library, "disengage");
    assert!(disengage.is_knockback_self);
    assert_eq!(disengage.knockback_distance, 15.0);
}

#[test]
fn test_concussive_shot_has_dead_zone() {
    let library = load_abilities();
    let shot = ability(&library, "concussive_shot");
    assert_eq!(shot.min_range, 8.0);
    assert_eq!(shot.resource_kind, ResourceKind::Focus);
}

#[test]
fn test_area_shapes() {
    let library = load_abilities();
    let nova = ability(&library, "frost_nova");
    let area = nova.area.as_ref().expect("frost nova is an area ability");
    assert!(matches!(area.shape, AreaShapeConfig::Sphere { radius } if radius == 10.0));
    assert!(!nova.requires_target);

    assert!(matches!(
        ability(&library, "multi_shot").area.as_ref().map(|a| &a.shape),
        Some(AreaShapeConfig::Cone { .. })
    ));
    assert!(matches!(
        ability(&library, "shockwave").area.as_ref().map(|a| &a.shape),
        Some(AreaShapeConfig::Line { .. })
    ));

    let holy_nova = ability(&library, "holy_nova");
    let area = holy_nova.area.as_ref().expect("holy nova is an area ability");
    assert!(area.include_allies && !area.include_enemies);
}

// =============================================================================
// Engine Tuning Tests
// =============================================================================

#[test]
fn test_shipped_engine_config_matches_defaults() {
    let config = load_engine_config(asset("assets/config/engine.ron")).expect("engine config loads");
    assert_eq!(config, EngineConfig::default());
}
