//! Cooldown Table
//!
//! Per-actor, per-slot remaining cooldowns plus the shared global cooldown.
//! Every query is total: unknown actors and slots read as ready.

use smallvec::SmallVec;
use std::collections::HashMap;

use super::ability::ActorId;
use super::constants::TIMER_EPSILON;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Timer {
    remaining: f32,
    duration: f32,
}

impl Timer {
    fn start(&mut self, duration: f32) {
        self.remaining = duration.max(0.0);
        self.duration = duration.max(0.0);
    }

    /// Returns true when this call took the timer from running to ready.
    fn advance(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= TIMER_EPSILON {
            self.remaining = 0.0;
            return true;
        }
        false
    }

    fn progress(&self) -> f32 {
        if self.duration <= 0.0 || self.remaining <= 0.0 {
            0.0
        } else {
            (self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ActorCooldowns {
    gcd: Timer,
    slots: Vec<Timer>,
}

/// What finished during one `tick`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CooldownTick {
    pub gcd_ended: bool,
    pub slots_ready: SmallVec<[usize; 4]>,
}

#[derive(Clone, Debug, Default)]
pub struct CooldownTable {
    actors: HashMap<ActorId, ActorCooldowns>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size an actor's slot array. Starting a cooldown on an unknown
    /// actor or slot also creates it.
    pub fn register(&mut self, actor: ActorId, slot_count: usize) {
        let entry = self.actors.entry(actor).or_default();
        if entry.slots.len() < slot_count {
            entry.slots.resize(slot_count, Timer::default());
        }
    }

    pub fn remove(&mut self, actor: ActorId) {
        self.actors.remove(&actor);
    }

    pub fn remaining(&self, actor: ActorId, slot: usize) -> f32 {
        self.actors
            .get(&actor)
            .and_then(|a| a.slots.get(slot))
            .map_or(0.0, |t| t.remaining)
    }

    /// Fraction of the cooldown still to run: 1.0 just started, 0.0 ready.
    pub fn cooldown_progress(&self, actor: ActorId, slot: usize) -> f32 {
        self.actors
            .get(&actor)
            .and_then(|a| a.slots.get(slot))
            .map_or(0.0, Timer::progress)
    }

    pub fn start_cooldown(&mut self, actor: ActorId, slot: usize, duration: f32) {
        let entry = self.actors.entry(actor).or_default();
        if entry.slots.len() <= slot {
            entry.slots.resize(slot + 1, Timer::default());
        }
        entry.slots[slot].start(duration);
    }

    pub fn gcd_remaining(&self, actor: ActorId) -> f32 {
        self.actors.get(&actor).map_or(0.0, |a| a.gcd.remaining)
    }

    pub fn is_on_gcd(&self, actor: ActorId) -> bool {
        self.gcd_remaining(actor) > 0.0
    }

    pub fn start_gcd(&mut self, actor: ActorId, duration: f32) {
        self.actors.entry(actor).or_default().gcd.start(duration);
    }

    /// Clear every cooldown and the GCD (e.g. arena preparation phase).
    pub fn reset(&mut self, actor: ActorId) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.gcd = Timer::default();
            entry.slots.iter_mut().for_each(|t| *t = Timer::default());
        }
    }

    /// Decrement the GCD and every slot by `dt`, floored at zero.
    pub fn tick(&mut self, actor: ActorId, dt: f32) -> CooldownTick {
        let mut result = CooldownTick::default();
        if dt <= 0.0 {
            return result;
        }
        if let Some(entry) = self.actors.get_mut(&actor) {
            result.gcd_ended = entry.gcd.advance(dt);
            for (slot, timer) in entry.slots.iter_mut().enumerate() {
                if timer.advance(dt) {
                    result.slots_ready.push(slot);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTOR: ActorId = ActorId(1);

    #[test]
    fn test_unknown_actor_and_slot_are_ready() {
        let table = CooldownTable::new();
        assert_eq!(table.remaining(ActorId(99), 3), 0.0);
        assert_eq!(table.gcd_remaining(ActorId(99)), 0.0);
        assert_eq!(table.cooldown_progress(ActorId(99), 0), 0.0);
    }

    #[test]
    fn test_cooldown_counts_down_and_floors_at_zero() {
        let mut table = CooldownTable::new();
        table.start_cooldown(ACTOR, 2, 1.0);
        table.tick(ACTOR, 0.4);
        assert!((table.remaining(ACTOR, 2) - 0.6).abs() < 1e-5);
        let tick = table.tick(ACTOR, 5.0);
        assert_eq!(table.remaining(ACTOR, 2), 0.0);
        assert_eq!(tick.slots_ready.as_slice(), &[2]);
    }

    #[test]
    fn test_many_small_ticks_land_on_exact_zero() {
        let mut table = CooldownTable::new();
        table.start_cooldown(ACTOR, 0, 10.0);
        let mut previous = table.remaining(ACTOR, 0);
        for _ in 0..600 {
            table.tick(ACTOR, 1.0 / 60.0);
            let now = table.remaining(ACTOR, 0);
            assert!(now <= previous, "cooldown increased: {previous} -> {now}");
            previous = now;
        }
        assert_eq!(table.remaining(ACTOR, 0), 0.0);
    }

    #[test]
    fn test_gcd_end_is_reported_once() {
        let mut table = CooldownTable::new();
        table.start_gcd(ACTOR, 1.5);
        assert!(table.is_on_gcd(ACTOR));
        assert!(!table.tick(ACTOR, 1.0).gcd_ended);
        assert!(table.tick(ACTOR, 1.0).gcd_ended);
        assert!(!table.tick(ACTOR, 1.0).gcd_ended);
        assert!(!table.is_on_gcd(ACTOR));
    }

    #[test]
    fn test_progress_and_reset() {
        let mut table = CooldownTable::new();
        table.register(ACTOR, 4);
        table.start_cooldown(ACTOR, 1, 8.0);
        table.tick(ACTOR, 2.0);
        assert!((table.cooldown_progress(ACTOR, 1) - 0.75).abs() < 1e-5);
        table.reset(ACTOR);
        assert_eq!(table.remaining(ACTOR, 1), 0.0);
    }
}
