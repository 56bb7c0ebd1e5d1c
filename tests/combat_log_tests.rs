//! Tests for combat log formatting and queries
//!
//! These tests verify that the CombatLog correctly:
//! - Renders engine events as readable lines
//! - Skips bookkeeping events
//! - Filters by event type and HP changes
//! - Tracks interrupts and crowd-control seconds

use std::sync::Arc;

use abilitycore::combat::ability::{AbilityDefinition, ActorId, CrowdControlCategory, DamageType};
use abilitycore::combat::error::UseRejection;
use abilitycore::combat::events::CombatEvent;
use abilitycore::combat::log::{CombatLog, CombatLogEventType};
use abilitycore::combat::state::InterruptReason;
use abilitycore::combat::stealth::StealthBreakReason;
use bevy::math::Vec3;
use regex::Regex;

const ROGUE: ActorId = ActorId(1);
const MAGE: ActorId = ActorId(2);

fn create_test_log() -> CombatLog {
    let mut log = CombatLog::default();
    log.register_actor(ROGUE, "Rogue");
    log.register_actor(MAGE, "Mage");
    log
}

fn eviscerate() -> Arc<AbilityDefinition> {
    Arc::new(AbilityDefinition::new("eviscerate", "Eviscerate"))
}

fn fireball() -> Arc<AbilityDefinition> {
    Arc::new(AbilityDefinition {
        cast_time: 2.5,
        ..AbilityDefinition::new("fireball", "Fireball")
    })
}

fn last_message(log: &CombatLog) -> &str {
    &log.entries.last().expect("entry recorded").message
}

// =============================================================================
// Message Format Tests
// =============================================================================

#[test]
fn test_finisher_message_includes_combo_points() {
    let mut log = create_test_log();
    log.record(&CombatEvent::AbilityExecuted {
        actor: ROGUE,
        ability: eviscerate(),
        target: Some(MAGE),
        combo_points_consumed: 3,
        multiplier: 1.75,
    });
    let pattern = Regex::new(r"^Rogue uses Eviscerate on Mage \(3 combo points, x1\.75\)$")
        .expect("valid regex");
    assert!(pattern.is_match(last_message(&log)), "got {:?}", last_message(&log));
}

#[test]
fn test_damage_and_heal_messages() {
    let mut log = create_test_log();
    log.record(&CombatEvent::Damage {
        source: MAGE,
        target: ROGUE,
        ability: fireball(),
        amount: 87.4,
        damage_type: DamageType::Fire,
    });
    assert_eq!(last_message(&log), "Mage's Fireball hits Rogue for 87 Fire damage");

    log.record(&CombatEvent::DrainHeal {
        actor: MAGE,
        ability: fireball(),
        amount: 10.0,
    });
    assert_eq!(last_message(&log), "Mage drains 10 health with Fireball");
    assert_eq!(log.hp_changes_only().len(), 2);
    assert_eq!(log.filter_by_type(CombatLogEventType::Healing).len(), 1);
}

#[test]
fn test_cast_lifecycle_messages() {
    let mut log = create_test_log();
    log.record(&CombatEvent::CastStarted {
        actor: MAGE,
        ability: fireball(),
        target: Some(ROGUE),
        cast_time: 2.5,
    });
    assert_eq!(last_message(&log), "Mage begins casting Fireball (2.5s)");

    log.record(&CombatEvent::CastInterrupted {
        actor: MAGE,
        ability: fireball(),
        reason: InterruptReason::Locked,
    });
    assert_eq!(last_message(&log), "Mage's Fireball was interrupted (locked)");
    assert_eq!(log.interrupts_for(MAGE), 1);
    assert_eq!(log.interrupts_for(ROGUE), 0);
}

#[test]
fn test_channel_interrupt_reports_ticks() {
    let mut log = create_test_log();
    log.record(&CombatEvent::ChannelInterrupted {
        actor: MAGE,
        ability: fireball(),
        reason: InterruptReason::Movement,
        ticks_completed: 2,
    });
    let pattern = Regex::new(r"interrupted \(movement\) after \d+ ticks$").expect("valid regex");
    assert!(pattern.is_match(last_message(&log)));
    assert_eq!(log.filter_by_type(CombatLogEventType::Interrupt).len(), 1);
}

#[test]
fn test_crowd_control_messages_and_totals() {
    let mut log = create_test_log();
    for duration in [4.0, 2.0, 1.0] {
        log.record(&CombatEvent::CrowdControlApplied {
            source: ROGUE,
            target: MAGE,
            category: CrowdControlCategory::Stun,
            duration,
            dr_level: 1,
        });
    }
    log.record(&CombatEvent::CrowdControlImmune {
        source: ROGUE,
        target: MAGE,
        category: CrowdControlCategory::Stun,
    });

    let pattern = Regex::new(r"^Mage is afflicted by \w+ from Rogue for \d+\.\d+s$").expect("valid regex");
    let cc = log.filter_by_type(CombatLogEventType::CrowdControl);
    assert_eq!(cc.len(), 4);
    assert!(cc[..3].iter().all(|e| pattern.is_match(&e.message)));
    assert!(cc[3].message.contains("immune"));
    assert_eq!(log.cc_seconds_applied(MAGE, CrowdControlCategory::Stun), 7.0);
    assert_eq!(log.cc_seconds_applied(MAGE, CrowdControlCategory::Root), 0.0);
}

#[test]
fn test_stealth_and_movement_messages() {
    let mut log = create_test_log();
    log.record(&CombatEvent::StealthEntered { actor: ROGUE });
    log.record(&CombatEvent::StealthBroken {
        actor: ROGUE,
        reason: StealthBreakReason::TookDamage,
    });
    log.record(&CombatEvent::KnockbackSelf {
        actor: ROGUE,
        direction: Vec3::NEG_Z,
        distance: 15.0,
    });
    let messages: Vec<&str> = log.entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages[0], "Rogue enters stealth");
    assert!(messages[1].starts_with("Rogue leaves stealth ("));
    assert_eq!(messages[2], "Rogue leaps back 15 yards");
    assert_eq!(log.filter_by_type(CombatLogEventType::Stealth).len(), 2);
}

#[test]
fn test_queue_rejection_message() {
    let mut log = create_test_log();
    log.record(&CombatEvent::QueuedAbilityRejected {
        actor: ROGUE,
        slot: 3,
        rejection: UseRejection::RequiresComboPoints,
    });
    assert!(last_message(&log).starts_with("Rogue's queued ability in slot 3 failed: "));
}

// =============================================================================
// Bookkeeping & Rendering Tests
// =============================================================================

#[test]
fn test_bookkeeping_events_are_skipped() {
    let mut log = create_test_log();
    log.record(&CombatEvent::GcdStarted {
        actor: ROGUE,
        duration: 1.5,
    });
    log.record(&CombatEvent::CooldownReady {
        actor: ROGUE,
        slot: 0,
    });
    log.record(&CombatEvent::ChannelTick {
        actor: MAGE,
        ability: fireball(),
        tick: 1,
        total_ticks: 5,
        multiplier: 1.0,
    });
    assert!(log.entries.is_empty());
}

#[test]
fn test_unknown_actor_falls_back_to_id() {
    let mut log = create_test_log();
    log.record(&CombatEvent::Unlocked { actor: ActorId(9) });
    assert_eq!(last_message(&log), "Actor 9 can act again");
}

#[test]
fn test_render_uses_timestamp_prefix() {
    let mut log = create_test_log();
    log.match_time = 12.5;
    log.record(&CombatEvent::StealthEntered { actor: ROGUE });
    let line = Regex::new(r"^\[\s*\d+\.\d{2}\] Rogue enters stealth$").expect("valid regex");
    let rendered = log.render();
    assert!(rendered.lines().all(|l| line.is_match(l)), "got {:?}", rendered);
    assert!(rendered.contains("12.50"));
}

#[test]
fn test_clear_keeps_names() {
    let mut log = create_test_log();
    log.record(&CombatEvent::StealthEntered { actor: ROGUE });
    log.clear();
    assert!(log.entries.is_empty());
    assert_eq!(log.actor_name(ROGUE), "Rogue");
}
