//! Combat logging
//!
//! Turns engine events into timestamped, human-readable entries for display
//! and post-run analysis. The engine itself produces no user-facing text.

use bevy::prelude::*;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use super::ability::{ActorId, CrowdControlCategory};
use super::events::CombatEvent;

/// A single entry in the combat log
#[derive(Debug, Clone)]
pub struct CombatLogEntry {
    /// Timestamp in simulation time (seconds since start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatLogEventType {
    /// Cast or channel started, ability executed
    AbilityUsed,
    /// Cast or channel interrupted
    Interrupt,
    /// Damage dealt
    Damage,
    /// Healing done (including drain)
    Healing,
    /// Crowd control applied or resisted through immunity
    CrowdControl,
    /// Pulls and knockbacks
    Movement,
    /// Combo points
    Resource,
    /// Stealth entered or broken
    Stealth,
    /// Lock overlay, queue and rejections
    State,
    /// Scenario event (start, end, script, death)
    ScenarioEvent,
}

/// The combat log resource storing all events
#[derive(Resource, Default, Debug)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulation time
    pub match_time: f32,
    names: HashMap<ActorId, String>,
    interrupts: HashMap<ActorId, usize>,
    cc_seconds: HashMap<(ActorId, CrowdControlCategory), f32>,
}

impl CombatLog {
    /// Clear the log for a new run. Registered names are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
        self.interrupts.clear();
        self.cc_seconds.clear();
    }

    /// Display name used for `actor` in messages
    pub fn register_actor(&mut self, actor: ActorId, name: impl Into<String>) {
        self.names.insert(actor, name.into());
    }

    pub fn actor_name(&self, actor: ActorId) -> String {
        self.names
            .get(&actor)
            .cloned()
            .unwrap_or_else(|| format!("Actor {}", actor.0))
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
        });
    }

    /// Record an engine event. Bookkeeping events (GCD, cooldown
    /// start/ready, individual channel ticks) update counters only.
    pub fn record(&mut self, event: &CombatEvent) {
        let Some((event_type, message)) = self.describe(event) else {
            return;
        };
        match event {
            e if e.is_interrupt() => {
                *self.interrupts.entry(e.actor()).or_insert(0) += 1;
            }
            CombatEvent::CrowdControlApplied {
                target,
                category,
                duration,
                ..
            } => {
                *self.cc_seconds.entry((*target, *category)).or_insert(0.0) += duration;
            }
            _ => {}
        }
        self.log(event_type, message);
    }

    fn describe(&self, event: &CombatEvent) -> Option<(CombatLogEventType, String)> {
        use CombatLogEventType as T;
        let name = |actor: &ActorId| self.actor_name(*actor);
        let described = match event {
            CombatEvent::GcdStarted { .. }
            | CombatEvent::GcdEnded { .. }
            | CombatEvent::CooldownStarted { .. }
            | CombatEvent::CooldownReady { .. }
            | CombatEvent::CastCompleted { .. }
            | CombatEvent::ChannelTick { .. } => return None,
            CombatEvent::CastStarted {
                actor,
                ability,
                cast_time,
                ..
            } => (
                T::AbilityUsed,
                format!("{} begins casting {} ({:.1}s)", name(actor), ability.name, cast_time),
            ),
            CombatEvent::CastInterrupted {
                actor,
                ability,
                reason,
            } => (
                T::Interrupt,
                format!("{}'s {} was interrupted ({})", name(actor), ability.name, reason.name()),
            ),
            CombatEvent::ChannelStarted {
                actor,
                ability,
                duration,
                ..
            } => (
                T::AbilityUsed,
                format!("{} begins channeling {} ({:.1}s)", name(actor), ability.name, duration),
            ),
            CombatEvent::ChannelCompleted {
                actor,
                ability,
                ticks_completed,
            } => (
                T::AbilityUsed,
                format!(
                    "{} finishes channeling {} ({} ticks)",
                    name(actor),
                    ability.name,
                    ticks_completed
                ),
            ),
            CombatEvent::ChannelInterrupted {
                actor,
                ability,
                reason,
                ticks_completed,
            } => (
                T::Interrupt,
                format!(
                    "{}'s {} was interrupted ({}) after {} ticks",
                    name(actor),
                    ability.name,
                    reason.name(),
                    ticks_completed
                ),
            ),
            CombatEvent::AbilityExecuted {
                actor,
                ability,
                target,
                combo_points_consumed,
                multiplier,
            } => {
                let mut message = format!("{} uses {}", name(actor), ability.name);
                if let Some(target) = target {
                    let _ = write!(message, " on {}", name(target));
                }
                if *combo_points_consumed > 0 {
                    let _ = write!(
                        message,
                        " ({} combo points, x{:.2})",
                        combo_points_consumed, multiplier
                    );
                }
                (T::AbilityUsed, message)
            }
            CombatEvent::Damage {
                source,
                target,
                ability,
                amount,
                damage_type,
            } => (
                T::Damage,
                format!(
                    "{}'s {} hits {} for {:.0} {:?} damage",
                    name(source),
                    ability.name,
                    name(target),
                    amount,
                    damage_type
                ),
            ),
            CombatEvent::Heal {
                source,
                target,
                ability,
                amount,
            } => (
                T::Healing,
                format!(
                    "{}'s {} heals {} for {:.0}",
                    name(source),
                    ability.name,
                    name(target),
                    amount
                ),
            ),
            CombatEvent::DrainHeal {
                actor,
                ability,
                amount,
            } => (
                T::Healing,
                format!("{} drains {:.0} health with {}", name(actor), amount, ability.name),
            ),
            CombatEvent::Pull { source, target, .. } => (
                T::Movement,
                format!("{} pulls {}", name(source), name(target)),
            ),
            CombatEvent::KnockbackSelf {
                actor, distance, ..
            } => (
                T::Movement,
                format!("{} leaps back {:.0} yards", name(actor), distance),
            ),
            CombatEvent::CrowdControlApplied {
                source,
                target,
                category,
                duration,
                ..
            } => (
                T::CrowdControl,
                format!(
                    "{} is afflicted by {} from {} for {:.1}s",
                    name(target),
                    category.name(),
                    name(source),
                    duration
                ),
            ),
            CombatEvent::CrowdControlImmune {
                source,
                target,
                category,
            } => (
                T::CrowdControl,
                format!(
                    "{} is immune to {} from {}",
                    name(target),
                    category.name(),
                    name(source)
                ),
            ),
            CombatEvent::ComboPointsChanged { actor, points } => (
                T::Resource,
                format!("{} has {} combo points", name(actor), points),
            ),
            CombatEvent::StealthEntered { actor } => {
                (T::Stealth, format!("{} enters stealth", name(actor)))
            }
            CombatEvent::StealthBroken { actor, reason } => (
                T::Stealth,
                format!("{} leaves stealth ({})", name(actor), reason.name()),
            ),
            CombatEvent::Locked { actor, duration } => (
                T::State,
                format!("{} is locked out for {:.1}s", name(actor), duration),
            ),
            CombatEvent::Unlocked { actor } => {
                (T::State, format!("{} can act again", name(actor)))
            }
            CombatEvent::AbilityQueued { actor, slot } => (
                T::State,
                format!("{} queues the ability in slot {}", name(actor), slot),
            ),
            CombatEvent::QueuedAbilityRejected {
                actor,
                slot,
                rejection,
            } => (
                T::State,
                format!(
                    "{}'s queued ability in slot {} failed: {}",
                    name(actor),
                    slot,
                    rejection
                ),
            ),
        };
        Some(described)
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Casts and channels of `actor` that were interrupted
    pub fn interrupts_for(&self, actor: ActorId) -> usize {
        self.interrupts.get(&actor).copied().unwrap_or(0)
    }

    /// Total seconds of `category` applied to `target` after diminishing returns
    pub fn cc_seconds_applied(&self, target: ActorId, category: CrowdControlCategory) -> f32 {
        self.cc_seconds
            .get(&(target, category))
            .copied()
            .unwrap_or(0.0)
    }

    /// Render the log as text, one `[  time] message` line per entry
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(out, "[{:>7.2}] {}", entry.timestamp, entry.message);
        }
        out
    }

    /// Write `header` followed by the rendered log to `path`
    pub fn save_to_file(&self, path: &Path, header: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut contents = String::from(header);
        if !header.is_empty() && !header.ends_with('\n') {
            contents.push('\n');
        }
        contents.push_str(&self.render());
        std::fs::write(path, contents)?;
        info!("Combat log saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::ability::AbilityDefinition;
    use crate::combat::state::InterruptReason;
    use std::sync::Arc;

    #[test]
    fn test_bookkeeping_events_are_not_logged() {
        let mut log = CombatLog::default();
        log.record(&CombatEvent::GcdStarted {
            actor: ActorId(1),
            duration: 1.5,
        });
        assert!(log.entries.is_empty());
    }

    #[test]
    fn test_interrupts_and_cc_are_counted() {
        let mut log = CombatLog::default();
        log.register_actor(ActorId(1), "Mage");
        log.record(&CombatEvent::CastInterrupted {
            actor: ActorId(1),
            ability: Arc::new(AbilityDefinition::new("fireball", "Fireball")),
            reason: InterruptReason::Movement,
        });
        for duration in [4.0, 2.0] {
            log.record(&CombatEvent::CrowdControlApplied {
                source: ActorId(2),
                target: ActorId(1),
                category: CrowdControlCategory::Stun,
                duration,
                dr_level: 1,
            });
        }
        assert_eq!(log.interrupts_for(ActorId(1)), 1);
        assert_eq!(log.cc_seconds_applied(ActorId(1), CrowdControlCategory::Stun), 6.0);
        assert_eq!(log.entries[0].message, "Mage's Fireball was interrupted (movement)");
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let mut log = CombatLog::default();
        for i in 0..5 {
            log.log(CombatLogEventType::ScenarioEvent, format!("entry {i}"));
        }
        let recent: Vec<&str> = log.recent(2).iter().map(|e| e.message.as_str()).collect();
        assert_eq!(recent, vec!["entry 3", "entry 4"]);
    }
}
