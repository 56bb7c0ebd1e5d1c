//! Bevy integration
//!
//! `AbilityEnginePlugin` hosts the engine as a resource and drives it once
//! per frame, in phase order:
//! 1. `Snapshot`: rebuild `WorldSnapshot` from actor components
//! 2. `Input`: apply `UseAbilityRequest`s (scripts and AI send these)
//! 3. `EngineTick`: `AbilityEngine::tick`, then publish its events
//! 4. `ApplyEffects`: write health back, execute pull/knockback directives
//! 5. `Log`: record events into the `CombatLog`
//!
//! Actor lifecycle follows the `Actor` component: adding it registers the
//! actor with the engine, removing it (or despawning) unregisters it.

use bevy::prelude::*;
use std::collections::HashMap;

use super::ability::{ActorId, TargetHandle};
use super::ability_config::AbilityLibrary;
use super::config::EngineConfig;
use super::engine::AbilityEngine;
use super::error::UseRejection;
use super::events::CombatEvent;
use super::log::{CombatLog, CombatLogEventType};
use super::rng::GameRng;
use super::state::InterruptReason;
use super::world::{ActorSnapshot, WorldSnapshot};

// ============================================================================
// Components
// ============================================================================

/// Marks an entity as an engine actor.
#[derive(Component, Debug, Clone)]
pub struct Actor {
    pub id: ActorId,
    pub team: u8,
    pub name: String,
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }
}

/// The actor's currently selected target.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatTarget(pub Option<ActorId>);

// ============================================================================
// Events & Resources
// ============================================================================

/// Ask the engine to use the ability in `slot`.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct UseAbilityRequest {
    pub actor: ActorId,
    pub slot: usize,
    pub target: Option<TargetHandle>,
    /// Buffer the request in the spell queue when it is blocked only by
    /// an almost-finished GCD or cast.
    pub queue: bool,
}

/// A `UseAbilityRequest` that was refused.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct UseRejected {
    pub actor: ActorId,
    pub slot: usize,
    pub rejection: UseRejection,
}

/// Entity <-> actor id mapping for lifecycle tracking.
#[derive(Resource, Default, Debug)]
pub struct ActorIndex {
    by_entity: HashMap<Entity, ActorId>,
}

impl ActorIndex {
    pub fn actor(&self, entity: Entity) -> Option<ActorId> {
        self.by_entity.get(&entity).copied()
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

/// System set labels for engine system ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbilitySystemPhase {
    Snapshot,
    Input,
    EngineTick,
    ApplyEffects,
    Log,
}

// ============================================================================
// Plugin
// ============================================================================

pub struct AbilityEnginePlugin {
    pub config: EngineConfig,
    pub library: AbilityLibrary,
    /// Seed for damage rolls; None uses entropy.
    pub random_seed: Option<u64>,
}

impl Plugin for AbilityEnginePlugin {
    fn build(&self, app: &mut App) {
        let rng = match self.random_seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => GameRng::from_entropy(),
        };

        app.insert_resource(AbilityEngine::new(self.config.clone()).with_rng(rng))
            .insert_resource(self.library.clone())
            .insert_resource(self.config.clone())
            .init_resource::<WorldSnapshot>()
            .init_resource::<CombatLog>()
            .init_resource::<ActorIndex>()
            .add_event::<CombatEvent>()
            .add_event::<UseAbilityRequest>()
            .add_event::<UseRejected>();

        app.configure_sets(
            Update,
            (
                AbilitySystemPhase::Snapshot,
                AbilitySystemPhase::Input,
                AbilitySystemPhase::EngineTick,
                AbilitySystemPhase::ApplyEffects,
                AbilitySystemPhase::Log,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            (
                (track_actor_lifecycle, snapshot_world)
                    .chain()
                    .in_set(AbilitySystemPhase::Snapshot),
                process_use_requests.in_set(AbilitySystemPhase::Input),
                tick_engine.in_set(AbilitySystemPhase::EngineTick),
                (apply_health, apply_movement_directives)
                    .chain()
                    .in_set(AbilitySystemPhase::ApplyEffects),
                record_combat_log.in_set(AbilitySystemPhase::Log),
            ),
        );
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Register new actors with the engine and drop removed ones.
pub fn track_actor_lifecycle(
    added: Query<(Entity, &Actor), Added<Actor>>,
    mut removed: RemovedComponents<Actor>,
    mut index: ResMut<ActorIndex>,
    mut engine: ResMut<AbilityEngine>,
    mut combat_log: ResMut<CombatLog>,
) {
    for (entity, actor) in added.iter() {
        engine.register_actor(actor.id);
        combat_log.register_actor(actor.id, actor.name.clone());
        index.by_entity.insert(entity, actor.id);
    }
    for entity in removed.read() {
        if let Some(id) = index.by_entity.remove(&entity) {
            engine.remove_actor(id);
        }
    }
}

/// Rebuild the per-frame snapshot the engine reads from.
pub fn snapshot_world(
    actors: Query<(&Actor, &Transform, &Health, Option<&CombatTarget>)>,
    mut snapshot: ResMut<WorldSnapshot>,
) {
    *snapshot = WorldSnapshot::new();
    for (actor, transform, health, target) in actors.iter() {
        snapshot.upsert(
            actor.id,
            ActorSnapshot {
                team: actor.team,
                position: transform.translation,
                facing: transform.rotation * Vec3::Z,
                target: target.and_then(|t| t.0),
                health: health.current,
                max_health: health.max,
            },
        );
    }
}

pub fn process_use_requests(
    mut requests: EventReader<UseAbilityRequest>,
    mut rejected: EventWriter<UseRejected>,
    mut engine: ResMut<AbilityEngine>,
    mut snapshot: ResMut<WorldSnapshot>,
) {
    for request in requests.read() {
        let result = if request.queue {
            engine
                .try_use_or_queue(request.actor, request.slot, request.target, &mut *snapshot)
                .map(|_| ())
        } else {
            engine
                .try_use(request.actor, request.slot, request.target, &mut *snapshot)
                .map(|_| ())
        };
        if let Err(rejection) = result {
            debug!(
                "Actor {} slot {} rejected: {}",
                request.actor, request.slot, rejection
            );
            rejected.send(UseRejected {
                actor: request.actor,
                slot: request.slot,
                rejection,
            });
        }
    }
}

/// Advance the engine by the frame delta and publish its events.
pub fn tick_engine(
    time: Res<Time>,
    mut engine: ResMut<AbilityEngine>,
    mut snapshot: ResMut<WorldSnapshot>,
    mut events: EventWriter<CombatEvent>,
) {
    engine.tick(time.delta_secs(), &mut *snapshot);
    events.send_batch(engine.drain_events());
}

/// Copy health from the snapshot back onto components and handle deaths.
pub fn apply_health(
    mut actors: Query<(&Actor, &mut Health)>,
    mut snapshot: ResMut<WorldSnapshot>,
    mut engine: ResMut<AbilityEngine>,
    mut combat_log: ResMut<CombatLog>,
) {
    snapshot.take_applied();
    for (actor, mut health) in actors.iter_mut() {
        let Some(state) = snapshot.actor(actor.id) else {
            continue;
        };
        let was_alive = health.is_alive();
        if health.current != state.health {
            health.current = state.health;
        }
        if was_alive && !health.is_alive() {
            engine.interrupt(actor.id, InterruptReason::External);
            engine.clear_queue(actor.id);
            engine.systems_mut().diminishing.clear(actor.id);
            combat_log.log(CombatLogEventType::ScenarioEvent, format!("{} dies", actor.name));
        }
    }
}

/// Execute pull and knockback directives on transforms.
pub fn apply_movement_directives(
    mut events: EventReader<CombatEvent>,
    mut actors: Query<(&Actor, &mut Transform)>,
) {
    for event in events.read() {
        match event {
            CombatEvent::Pull {
                target,
                destination,
                ..
            } => {
                if let Some((_, mut transform)) = actors.iter_mut().find(|(a, _)| a.id == *target) {
                    transform.translation = *destination;
                }
            }
            CombatEvent::KnockbackSelf {
                actor,
                direction,
                distance,
            } => {
                if let Some((_, mut transform)) = actors.iter_mut().find(|(a, _)| a.id == *actor) {
                    transform.translation += *direction * *distance;
                }
            }
            _ => {}
        }
    }
}

/// Record published events into the combat log.
pub fn record_combat_log(
    mut events: EventReader<CombatEvent>,
    mut rejected: EventReader<UseRejected>,
    engine: Res<AbilityEngine>,
    mut combat_log: ResMut<CombatLog>,
) {
    combat_log.match_time = engine.elapsed();
    for event in events.read() {
        combat_log.record(event);
    }
    for UseRejected {
        actor,
        slot,
        rejection,
    } in rejected.read()
    {
        let name = combat_log.actor_name(*actor);
        combat_log.log(
            CombatLogEventType::State,
            format!("{} cannot use slot {}: {}", name, slot, rejection),
        );
    }
}
