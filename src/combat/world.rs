//! Collaborator interfaces
//!
//! The engine never owns positions, factions, targets or health. It reads
//! them through these traits and applies damage/healing through
//! `EffectApplier`. All reads inside one `tick` are treated as a snapshot.
//!
//! `WorldSnapshot` is an in-memory implementation used by the Bevy layer
//! (rebuilt from ECS components every frame) and by tests.

use bevy::math::Vec3;
use bevy::prelude::Resource;
use smallvec::SmallVec;
use std::collections::BTreeMap;

use super::ability::{ActorId, DamageType, TargetHandle};

/// Candidate buffer for spatial queries.
pub type ActorBuffer = SmallVec<[ActorId; 8]>;

pub trait TargetProvider {
    fn current_target(&self, actor: ActorId) -> Option<TargetHandle>;

    fn has_target(&self, actor: ActorId) -> bool {
        self.current_target(actor).is_some()
    }

    /// Distance from `actor` to `target`, or None when either is unknown.
    fn target_distance(&self, actor: ActorId, target: TargetHandle) -> Option<f32>;
}

pub trait FactionProvider {
    fn is_ally(&self, caster: ActorId, target: TargetHandle) -> bool;
}

pub trait PositionProvider {
    fn position(&self, actor: ActorId) -> Option<Vec3>;

    /// Unit facing vector. Hosts without orientation fall back to +Z.
    fn facing(&self, _actor: ActorId) -> Option<Vec3> {
        None
    }

    /// Every actor whose position lies within `radius` of `center`.
    fn actors_within(&self, center: Vec3, radius: f32) -> ActorBuffer;
}

pub trait EffectApplier {
    /// Apply base damage; returns the amount actually dealt.
    fn apply_damage(
        &mut self,
        target: TargetHandle,
        amount: f32,
        damage_type: DamageType,
        source: ActorId,
    ) -> f32;

    /// Apply healing; returns the amount actually healed.
    fn apply_heal(&mut self, target: TargetHandle, amount: f32) -> f32;
}

/// Everything the engine needs from the host for one call.
pub trait CombatWorld: TargetProvider + FactionProvider + PositionProvider + EffectApplier {}

impl<T> CombatWorld for T where T: TargetProvider + FactionProvider + PositionProvider + EffectApplier {}

// ============================================================================
// In-memory world
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ActorSnapshot {
    pub team: u8,
    pub position: Vec3,
    pub facing: Vec3,
    pub target: Option<ActorId>,
    pub health: f32,
    pub max_health: f32,
}

impl ActorSnapshot {
    pub fn new(team: u8, position: Vec3, max_health: f32) -> Self {
        Self {
            team,
            position,
            facing: Vec3::Z,
            target: None,
            health: max_health,
            max_health,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Damage or healing applied through the snapshot, waiting to be written
/// back to the host.
#[derive(Clone, Debug, PartialEq)]
pub enum AppliedEffect {
    Damage {
        source: ActorId,
        target: ActorId,
        amount: f32,
        damage_type: DamageType,
    },
    Heal {
        target: ActorId,
        amount: f32,
    },
}

#[derive(Resource, Clone, Debug, Default)]
pub struct WorldSnapshot {
    actors: BTreeMap<ActorId, ActorSnapshot>,
    applied: Vec<AppliedEffect>,
}

impl WorldSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an actor's snapshot.
    pub fn upsert(&mut self, id: ActorId, actor: ActorSnapshot) {
        self.actors.insert(id, actor);
    }

    pub fn remove(&mut self, id: ActorId) {
        self.actors.remove(&id);
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorSnapshot> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut ActorSnapshot> {
        self.actors.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    pub fn set_position(&mut self, id: ActorId, position: Vec3) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.position = position;
        }
    }

    pub fn set_target(&mut self, id: ActorId, target: Option<ActorId>) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.target = target;
        }
    }

    pub fn health(&self, id: ActorId) -> f32 {
        self.actors.get(&id).map_or(0.0, |a| a.health)
    }

    /// Effects applied since the last call, in application order.
    pub fn take_applied(&mut self) -> Vec<AppliedEffect> {
        std::mem::take(&mut self.applied)
    }

    pub fn applied(&self) -> &[AppliedEffect] {
        &self.applied
    }
}

impl TargetProvider for WorldSnapshot {
    fn current_target(&self, actor: ActorId) -> Option<TargetHandle> {
        self.actors.get(&actor).and_then(|a| a.target)
    }

    fn target_distance(&self, actor: ActorId, target: TargetHandle) -> Option<f32> {
        let from = self.actors.get(&actor)?.position;
        let to = self.actors.get(&target)?.position;
        Some(from.distance(to))
    }
}

impl FactionProvider for WorldSnapshot {
    fn is_ally(&self, caster: ActorId, target: TargetHandle) -> bool {
        match (self.actors.get(&caster), self.actors.get(&target)) {
            (Some(a), Some(b)) => a.team == b.team,
            _ => false,
        }
    }
}

impl PositionProvider for WorldSnapshot {
    fn position(&self, actor: ActorId) -> Option<Vec3> {
        self.actors.get(&actor).map(|a| a.position)
    }

    fn facing(&self, actor: ActorId) -> Option<Vec3> {
        self.actors
            .get(&actor)
            .map(|a| a.facing)
            .filter(|f| f.length_squared() > f32::EPSILON)
    }

    fn actors_within(&self, center: Vec3, radius: f32) -> ActorBuffer {
        self.actors
            .iter()
            .filter(|(_, a)| a.is_alive() && a.position.distance(center) <= radius)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl EffectApplier for WorldSnapshot {
    fn apply_damage(
        &mut self,
        target: TargetHandle,
        amount: f32,
        damage_type: DamageType,
        source: ActorId,
    ) -> f32 {
        let Some(actor) = self.actors.get_mut(&target) else {
            return 0.0;
        };
        let dealt = amount.max(0.0).min(actor.health);
        actor.health -= dealt;
        if dealt > 0.0 {
            self.applied.push(AppliedEffect::Damage {
                source,
                target,
                amount: dealt,
                damage_type,
            });
        }
        dealt
    }

    fn apply_heal(&mut self, target: TargetHandle, amount: f32) -> f32 {
        let Some(actor) = self.actors.get_mut(&target) else {
            return 0.0;
        };
        if !actor.is_alive() {
            return 0.0;
        }
        let healed = amount.max(0.0).min(actor.max_health - actor.health);
        actor.health += healed;
        if healed > 0.0 {
            self.applied.push(AppliedEffect::Heal {
                target,
                amount: healed,
            });
        }
        healed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldSnapshot {
        let mut world = WorldSnapshot::new();
        world.upsert(ActorId(1), ActorSnapshot::new(1, Vec3::ZERO, 100.0));
        world.upsert(ActorId(2), ActorSnapshot::new(2, Vec3::new(3.0, 0.0, 4.0), 100.0));
        world.upsert(ActorId(3), ActorSnapshot::new(1, Vec3::new(20.0, 0.0, 0.0), 100.0));
        world
    }

    #[test]
    fn test_distance_and_factions() {
        let world = world();
        assert_eq!(world.target_distance(ActorId(1), ActorId(2)), Some(5.0));
        assert_eq!(world.target_distance(ActorId(1), ActorId(42)), None);
        assert!(world.is_ally(ActorId(1), ActorId(3)));
        assert!(!world.is_ally(ActorId(1), ActorId(2)));
    }

    #[test]
    fn test_damage_is_capped_by_health_and_recorded() {
        let mut world = world();
        let dealt = world.apply_damage(ActorId(2), 150.0, DamageType::Fire, ActorId(1));
        assert_eq!(dealt, 100.0);
        assert_eq!(world.health(ActorId(2)), 0.0);
        assert_eq!(world.apply_heal(ActorId(2), 50.0), 0.0, "dead actors are not healed");
        assert_eq!(world.take_applied().len(), 1);
        assert!(world.applied().is_empty());
    }

    #[test]
    fn test_actors_within_radius() {
        let world = world();
        let found = world.actors_within(Vec3::ZERO, 6.0);
        assert_eq!(found.as_slice(), &[ActorId(1), ActorId(2)]);
    }
}
