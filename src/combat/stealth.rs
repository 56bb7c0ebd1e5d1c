//! Stealth Tracker
//!
//! Per-actor stealth flag plus the reason for the last transition. After
//! stealth breaks, re-entry is blocked for a short cooldown.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ability::ActorId;

/// Why stealth ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StealthBreakReason {
    /// An ability flagged `breaks_stealth` executed.
    AbilityUsed,
    /// The actor took damage.
    TookDamage,
    /// Cancelled by the actor.
    Manual,
    /// The actor entered combat through other means.
    CombatEntered,
}

impl StealthBreakReason {
    pub fn name(&self) -> &'static str {
        match self {
            StealthBreakReason::AbilityUsed => "ability used",
            StealthBreakReason::TookDamage => "took damage",
            StealthBreakReason::Manual => "cancelled",
            StealthBreakReason::CombatEntered => "entered combat",
        }
    }
}

/// Last stealth transition for an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StealthTransition {
    Entered,
    Broken(StealthBreakReason),
}

pub trait StealthTracker: Send + Sync {
    /// Enter stealth. Returns false (and changes nothing) while already
    /// stealthed or during the re-entry cooldown.
    fn enter(&mut self, actor: ActorId) -> bool;

    fn is_in_stealth(&self, actor: ActorId) -> bool;

    /// Leave stealth. Returns false and changes nothing if not stealthed.
    fn break_stealth(&mut self, actor: ActorId, reason: StealthBreakReason) -> bool;

    fn last_transition(&self, actor: ActorId) -> Option<StealthTransition>;

    /// Seconds until `enter` may succeed again.
    fn reentry_cooldown(&self, actor: ActorId) -> f32;

    fn tick(&mut self, actor: ActorId, dt: f32);

    fn remove(&mut self, actor: ActorId);
}

#[derive(Clone, Debug, Default)]
struct StealthState {
    in_stealth: bool,
    last: Option<StealthTransition>,
    reentry_cooldown: f32,
}

#[derive(Clone, Debug, Default)]
pub struct StealthTable {
    reentry_cooldown: f32,
    actors: HashMap<ActorId, StealthState>,
}

impl StealthTable {
    pub fn new(reentry_cooldown: f32) -> Self {
        Self {
            reentry_cooldown,
            actors: HashMap::new(),
        }
    }
}

impl StealthTracker for StealthTable {
    fn enter(&mut self, actor: ActorId) -> bool {
        let state = self.actors.entry(actor).or_default();
        if state.in_stealth || state.reentry_cooldown > 0.0 {
            return false;
        }
        state.in_stealth = true;
        state.last = Some(StealthTransition::Entered);
        true
    }

    fn is_in_stealth(&self, actor: ActorId) -> bool {
        self.actors.get(&actor).is_some_and(|s| s.in_stealth)
    }

    fn break_stealth(&mut self, actor: ActorId, reason: StealthBreakReason) -> bool {
        match self.actors.get_mut(&actor) {
            Some(state) if state.in_stealth => {
                state.in_stealth = false;
                state.last = Some(StealthTransition::Broken(reason));
                state.reentry_cooldown = self.reentry_cooldown;
                true
            }
            _ => false,
        }
    }

    fn last_transition(&self, actor: ActorId) -> Option<StealthTransition> {
        self.actors.get(&actor).and_then(|s| s.last)
    }

    fn reentry_cooldown(&self, actor: ActorId) -> f32 {
        self.actors.get(&actor).map_or(0.0, |s| s.reentry_cooldown)
    }

    fn tick(&mut self, actor: ActorId, dt: f32) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.reentry_cooldown = (state.reentry_cooldown - dt).max(0.0);
        }
    }

    fn remove(&mut self, actor: ActorId) {
        self.actors.remove(&actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROGUE: ActorId = ActorId(3);

    #[test]
    fn test_enter_and_break() {
        let mut stealth = StealthTable::new(2.0);
        assert!(stealth.enter(ROGUE));
        assert!(stealth.is_in_stealth(ROGUE));
        assert!(stealth.break_stealth(ROGUE, StealthBreakReason::AbilityUsed));
        assert!(!stealth.is_in_stealth(ROGUE));
        assert_eq!(
            stealth.last_transition(ROGUE),
            Some(StealthTransition::Broken(StealthBreakReason::AbilityUsed))
        );
    }

    #[test]
    fn test_break_is_idempotent() {
        let mut stealth = StealthTable::new(2.0);
        assert!(!stealth.break_stealth(ROGUE, StealthBreakReason::Manual));
        stealth.enter(ROGUE);
        assert!(stealth.break_stealth(ROGUE, StealthBreakReason::TookDamage));
        assert!(!stealth.break_stealth(ROGUE, StealthBreakReason::Manual));
        assert_eq!(
            stealth.last_transition(ROGUE),
            Some(StealthTransition::Broken(StealthBreakReason::TookDamage)),
            "second break must not overwrite the reason"
        );
    }

    #[test]
    fn test_reentry_blocked_until_cooldown_expires() {
        let mut stealth = StealthTable::new(2.0);
        stealth.enter(ROGUE);
        stealth.break_stealth(ROGUE, StealthBreakReason::Manual);
        assert!(!stealth.enter(ROGUE));
        stealth.tick(ROGUE, 1.5);
        assert!(!stealth.enter(ROGUE));
        stealth.tick(ROGUE, 0.5);
        assert!(stealth.enter(ROGUE));
    }
}
