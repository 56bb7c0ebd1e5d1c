//! Resource Ledgers
//!
//! Mana, Energy and Focus pools plus the integer combo-point ledger.
//! The engine only talks to these through the `ResourceLedger` and
//! `ComboPointLedger` traits so tests and hosts can substitute their own.
//!
//! Invariant for every pool after every call: `0 <= current <= max`.

use std::collections::HashMap;

use super::ability::{ActorId, ResourceKind};
use super::config::ResourceSettings;

/// Per-actor numeric pools with spend/restore/regen semantics.
pub trait ResourceLedger: Send + Sync {
    /// Create (or replace) an actor's pool of `kind`. `starting` of `None`
    /// uses the kind's configured start (full or empty).
    fn register(&mut self, actor: ActorId, kind: ResourceKind, max: f32, starting: Option<f32>);

    fn current(&self, actor: ActorId, kind: ResourceKind) -> f32;

    fn maximum(&self, actor: ActorId, kind: ResourceKind) -> f32;

    /// Dry run of `try_spend`. A zero amount always succeeds.
    fn can_spend(&self, actor: ActorId, kind: ResourceKind, amount: f32) -> bool {
        amount <= 0.0 || self.current(actor, kind) >= amount
    }

    /// Check sufficiency and deduct in one step. Leaves state unchanged
    /// and returns false when insufficient.
    fn try_spend(&mut self, actor: ActorId, kind: ResourceKind, amount: f32) -> bool;

    /// Add `amount`, clamped to max.
    fn restore(&mut self, actor: ActorId, kind: ResourceKind, amount: f32);

    /// Change the maximum; current is clamped to the new max.
    fn set_max(&mut self, actor: ActorId, kind: ResourceKind, max: f32);

    /// Switch every pool of `actor` between in-combat and out-of-combat regen.
    fn set_regen_mode(&mut self, actor: ActorId, in_combat: bool);

    fn is_in_combat(&self, actor: ActorId) -> bool;

    /// Apply one step of regeneration to every pool of `actor`.
    fn tick(&mut self, actor: ActorId, dt: f32);

    fn remove(&mut self, actor: ActorId);
}

/// Integer combo-point counter bounded `[0, max]`.
pub trait ComboPointLedger: Send + Sync {
    fn points(&self, actor: ActorId) -> u8;

    /// Add `n`, clamped at the maximum. Returns the new count.
    fn add(&mut self, actor: ActorId, n: u8) -> u8;

    /// Return the count and zero it.
    fn consume_all(&mut self, actor: ActorId) -> u8;

    fn max_points(&self) -> u8;

    fn remove(&mut self, actor: ActorId);
}

// ============================================================================
// Resource Pools
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourcePool {
    pub current: f32,
    pub max: f32,
}

impl ResourcePool {
    pub fn new(max: f32, current: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: current.clamp(0.0, max),
            max,
        }
    }

    fn add(&mut self, amount: f32) {
        self.current = (self.current + amount).clamp(0.0, self.max);
    }
}

#[derive(Clone, Debug, Default)]
struct ActorPools {
    in_combat: bool,
    pools: HashMap<ResourceKind, ResourcePool>,
}

/// Default ledger: one pool per (actor, kind), regen models from config.
#[derive(Clone, Debug, Default)]
pub struct PoolLedger {
    settings: ResourceSettings,
    actors: HashMap<ActorId, ActorPools>,
}

impl PoolLedger {
    pub fn new(settings: ResourceSettings) -> Self {
        Self {
            settings,
            actors: HashMap::new(),
        }
    }

    pub fn pool(&self, actor: ActorId, kind: ResourceKind) -> Option<&ResourcePool> {
        self.actors.get(&actor).and_then(|a| a.pools.get(&kind))
    }

    fn pool_mut(&mut self, actor: ActorId, kind: ResourceKind) -> Option<&mut ResourcePool> {
        self.actors
            .get_mut(&actor)
            .and_then(|a| a.pools.get_mut(&kind))
    }
}

impl ResourceLedger for PoolLedger {
    fn register(&mut self, actor: ActorId, kind: ResourceKind, max: f32, starting: Option<f32>) {
        let starts_full = self.settings.for_kind(kind).starts_full;
        let start = starting.unwrap_or(if starts_full { max } else { 0.0 });
        self.actors
            .entry(actor)
            .or_default()
            .pools
            .insert(kind, ResourcePool::new(max, start));
    }

    fn current(&self, actor: ActorId, kind: ResourceKind) -> f32 {
        self.pool(actor, kind).map_or(0.0, |p| p.current)
    }

    fn maximum(&self, actor: ActorId, kind: ResourceKind) -> f32 {
        self.pool(actor, kind).map_or(0.0, |p| p.max)
    }

    fn try_spend(&mut self, actor: ActorId, kind: ResourceKind, amount: f32) -> bool {
        if amount <= 0.0 {
            return true;
        }
        match self.pool_mut(actor, kind) {
            Some(pool) if pool.current >= amount => {
                pool.current -= amount;
                true
            }
            _ => false,
        }
    }

    fn restore(&mut self, actor: ActorId, kind: ResourceKind, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        if let Some(pool) = self.pool_mut(actor, kind) {
            pool.add(amount);
        }
    }

    fn set_max(&mut self, actor: ActorId, kind: ResourceKind, max: f32) {
        if let Some(pool) = self.pool_mut(actor, kind) {
            pool.max = max.max(0.0);
            pool.current = pool.current.min(pool.max);
        }
    }

    fn set_regen_mode(&mut self, actor: ActorId, in_combat: bool) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.in_combat = in_combat;
        }
    }

    fn is_in_combat(&self, actor: ActorId) -> bool {
        self.actors.get(&actor).is_some_and(|a| a.in_combat)
    }

    fn tick(&mut self, actor: ActorId, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let Some(entry) = self.actors.get_mut(&actor) else {
            return;
        };
        for (kind, pool) in entry.pools.iter_mut() {
            let rate = self
                .settings
                .for_kind(*kind)
                .regen
                .per_second(pool.max, entry.in_combat);
            pool.add(rate * dt);
        }
    }

    fn remove(&mut self, actor: ActorId) {
        self.actors.remove(&actor);
    }
}

// ============================================================================
// Combo Points
// ============================================================================

#[derive(Clone, Debug)]
pub struct ComboPoints {
    max: u8,
    points: HashMap<ActorId, u8>,
}

impl ComboPoints {
    pub fn new(max: u8) -> Self {
        Self {
            max,
            points: HashMap::new(),
        }
    }
}

impl ComboPointLedger for ComboPoints {
    fn points(&self, actor: ActorId) -> u8 {
        self.points.get(&actor).copied().unwrap_or(0)
    }

    fn add(&mut self, actor: ActorId, n: u8) -> u8 {
        let entry = self.points.entry(actor).or_insert(0);
        *entry = entry.saturating_add(n).min(self.max);
        *entry
    }

    fn consume_all(&mut self, actor: ActorId) -> u8 {
        self.points.insert(actor, 0).unwrap_or(0)
    }

    fn max_points(&self) -> u8 {
        self.max
    }

    fn remove(&mut self, actor: ActorId) {
        self.points.remove(&actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTOR: ActorId = ActorId(7);

    fn ledger() -> PoolLedger {
        PoolLedger::new(ResourceSettings::default())
    }

    fn assert_bounded(ledger: &PoolLedger, kind: ResourceKind) {
        let current = ledger.current(ACTOR, kind);
        let max = ledger.maximum(ACTOR, kind);
        assert!(
            (0.0..=max).contains(&current),
            "{kind:?} out of bounds: {current}/{max}"
        );
    }

    #[test]
    fn test_default_starting_values_per_kind() {
        let mut ledger = ledger();
        ledger.register(ACTOR, ResourceKind::Mana, 200.0, None);
        ledger.register(ACTOR, ResourceKind::Energy, 100.0, None);
        ledger.register(ACTOR, ResourceKind::Focus, 100.0, None);
        assert_eq!(ledger.current(ACTOR, ResourceKind::Mana), 200.0);
        assert_eq!(ledger.current(ACTOR, ResourceKind::Energy), 100.0);
        assert_eq!(ledger.current(ACTOR, ResourceKind::Focus), 0.0);
    }

    #[test]
    fn test_failed_spend_leaves_state_unchanged() {
        let mut ledger = ledger();
        ledger.register(ACTOR, ResourceKind::Energy, 100.0, Some(30.0));
        assert!(!ledger.try_spend(ACTOR, ResourceKind::Energy, 40.0));
        assert_eq!(ledger.current(ACTOR, ResourceKind::Energy), 30.0);
        assert!(ledger.try_spend(ACTOR, ResourceKind::Energy, 30.0));
        assert_eq!(ledger.current(ACTOR, ResourceKind::Energy), 0.0);
    }

    #[test]
    fn test_spend_from_unregistered_pool_fails_unless_free() {
        let mut ledger = ledger();
        assert!(!ledger.try_spend(ACTOR, ResourceKind::Mana, 1.0));
        assert!(ledger.try_spend(ACTOR, ResourceKind::Mana, 0.0));
    }

    #[test]
    fn test_mana_regen_uses_combat_rate() {
        let mut ledger = ledger();
        ledger.register(ACTOR, ResourceKind::Mana, 1000.0, Some(0.0));
        ledger.tick(ACTOR, 1.0);
        assert!((ledger.current(ACTOR, ResourceKind::Mana) - 20.0).abs() < 1e-3);
        ledger.set_regen_mode(ACTOR, true);
        ledger.tick(ACTOR, 1.0);
        assert!((ledger.current(ACTOR, ResourceKind::Mana) - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_pools_stay_bounded_under_mixed_operations() {
        let mut ledger = ledger();
        ledger.register(ACTOR, ResourceKind::Mana, 100.0, Some(50.0));
        let kind = ResourceKind::Mana;
        for step in 0..200 {
            match step % 4 {
                0 => {
                    ledger.try_spend(ACTOR, kind, 37.0);
                }
                1 => ledger.restore(ACTOR, kind, 55.0),
                2 => ledger.tick(ACTOR, 3.0),
                _ => ledger.set_max(ACTOR, kind, if step % 8 == 3 { 40.0 } else { 100.0 }),
            }
            assert_bounded(&ledger, kind);
        }
    }

    #[test]
    fn test_set_max_clamps_current() {
        let mut ledger = ledger();
        ledger.register(ACTOR, ResourceKind::Energy, 100.0, None);
        ledger.set_max(ACTOR, ResourceKind::Energy, 60.0);
        assert_eq!(ledger.current(ACTOR, ResourceKind::Energy), 60.0);
    }

    #[test]
    fn test_combo_points_clamp_and_consume() {
        let mut combo = ComboPoints::new(5);
        assert_eq!(combo.add(ACTOR, 2), 2);
        assert_eq!(combo.add(ACTOR, 4), 5);
        assert_eq!(combo.consume_all(ACTOR), 5);
        assert_eq!(combo.points(ACTOR), 0);
        assert_eq!(combo.consume_all(ActorId(100)), 0);
    }
}
