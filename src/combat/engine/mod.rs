//! Ability Engine
//!
//! The cast/channel state machine. For each registered actor it decides
//! whether a requested ability may run now, moves the actor through
//! Idle / GlobalCooldown / Casting / Channeling / Locked, and reports every
//! decision as a `CombatEvent`.
//!
//! ## Driving the engine
//! ```ignore
//! let mut engine = AbilityEngine::new(EngineConfig::default());
//! engine.register_actor(rogue);
//! engine.set_slot(rogue, 0, library.get("sinister_strike"));
//! engine.try_use(rogue, 0, Some(target), &mut world)?;
//! engine.tick(1.0 / 60.0, &mut world);
//! for event in engine.drain_events() { /* ... */ }
//! ```
//!
//! Time only moves through `tick(dt)`. Nothing here blocks or sleeps.

mod execute;
mod progress;
mod validation;

use bevy::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::ability::{AbilityDefinition, ActorId, ResourceKind, TargetHandle};
use super::area::AreaResolver;
use super::config::EngineConfig;
use super::cooldowns::CooldownTable;
use super::diminishing::{DiminishingReturns, DiminishingReturnsTracker};
use super::error::UseRejection;
use super::events::CombatEvent;
use super::resources::{ComboPointLedger, ComboPoints, PoolLedger, ResourceLedger};
use super::rng::GameRng;
use super::state::{Activity, ActorCombatState, InterruptReason, MachineState, QueuedUse};
use super::stealth::{StealthBreakReason, StealthTable, StealthTracker};
use super::world::CombatWorld;

/// Capabilities the engine delegates to. Supplied at construction so the
/// engine is fully initialised from the start.
pub struct CombatSystems {
    pub resources: Box<dyn ResourceLedger>,
    pub combo: Box<dyn ComboPointLedger>,
    pub stealth: Box<dyn StealthTracker>,
    pub diminishing: Box<dyn DiminishingReturns>,
}

impl CombatSystems {
    /// The default in-memory implementations, tuned from `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            resources: Box::new(PoolLedger::new(config.resources.clone())),
            combo: Box::new(ComboPoints::new(config.max_combo_points)),
            stealth: Box::new(StealthTable::new(config.stealth_reentry_cooldown)),
            diminishing: Box::new(DiminishingReturnsTracker::new(
                config.diminishing_returns.clone(),
            )),
        }
    }
}

/// How an accepted `try_use` proceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseOutcome {
    Executed,
    CastStarted,
    ChannelStarted,
}

pub type UseResult = Result<UseOutcome, UseRejection>;

/// Result of `try_use_or_queue`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueOutcome {
    Started(UseOutcome),
    Queued,
}

#[derive(Resource)]
pub struct AbilityEngine {
    config: EngineConfig,
    systems: CombatSystems,
    cooldowns: CooldownTable,
    area: AreaResolver,
    actors: BTreeMap<ActorId, ActorCombatState>,
    rng: GameRng,
    events: Vec<CombatEvent>,
    elapsed: f32,
}

impl AbilityEngine {
    /// Engine with the default capability implementations.
    pub fn new(config: EngineConfig) -> Self {
        let systems = CombatSystems::from_config(&config);
        Self::with_systems(config, systems)
    }

    pub fn with_systems(config: EngineConfig, systems: CombatSystems) -> Self {
        let area = AreaResolver::new(config.friendly_fire_enabled);
        Self {
            config,
            systems,
            cooldowns: CooldownTable::new(),
            area,
            actors: BTreeMap::new(),
            rng: GameRng::from_entropy(),
            events: Vec::new(),
            elapsed: 0.0,
        }
    }

    /// Replace the roll generator (seeded runs).
    pub fn with_rng(mut self, rng: GameRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn set_rng(&mut self, rng: GameRng) {
        self.rng = rng;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn systems(&self) -> &CombatSystems {
        &self.systems
    }

    pub fn systems_mut(&mut self) -> &mut CombatSystems {
        &mut self.systems
    }

    /// Seconds of simulation driven through `tick`.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Add an actor with an empty loadout. Re-registering keeps its state.
    pub fn register_actor(&mut self, actor: ActorId) {
        let slot_count = self.config.slot_count;
        self.actors
            .entry(actor)
            .or_insert_with(|| ActorCombatState::new(slot_count));
        self.cooldowns.register(actor, slot_count);
    }

    /// Drop every piece of state held for `actor`.
    pub fn remove_actor(&mut self, actor: ActorId) {
        if self.actors.remove(&actor).is_none() {
            return;
        }
        self.cooldowns.remove(actor);
        self.systems.resources.remove(actor);
        self.systems.combo.remove(actor);
        self.systems.stealth.remove(actor);
        self.systems.diminishing.clear(actor);
        debug!("Removed actor {}", actor);
    }

    pub fn is_registered(&self, actor: ActorId) -> bool {
        self.actors.contains_key(&actor)
    }

    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    /// Bind (or clear with `None`) an ability slot. Returns false for an
    /// unknown actor or a slot past the configured count.
    pub fn set_slot(
        &mut self,
        actor: ActorId,
        slot: usize,
        ability: Option<Arc<AbilityDefinition>>,
    ) -> bool {
        match self
            .actors
            .get_mut(&actor)
            .and_then(|state| state.loadout.get_mut(slot))
        {
            Some(entry) => {
                *entry = ability;
                true
            }
            None => false,
        }
    }

    pub fn ability_in_slot(&self, actor: ActorId, slot: usize) -> Option<Arc<AbilityDefinition>> {
        self.actors
            .get(&actor)
            .and_then(|state| state.ability_in_slot(slot))
            .cloned()
    }

    /// Register a resource pool for `actor`.
    pub fn register_resource(
        &mut self,
        actor: ActorId,
        kind: ResourceKind,
        max: f32,
        starting: Option<f32>,
    ) {
        self.systems.resources.register(actor, kind, max, starting);
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Take every event emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[CombatEvent] {
        &self.events
    }

    fn emit(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    // ========================================================================
    // Use requests
    // ========================================================================

    /// Validate and, if accepted, start the ability in `slot`. On rejection
    /// nothing changes.
    pub fn try_use<W: CombatWorld + ?Sized>(
        &mut self,
        actor: ActorId,
        slot: usize,
        target: Option<TargetHandle>,
        world: &mut W,
    ) -> UseResult {
        let accepted = self.validate(actor, slot, target, world)?;
        Ok(self.start(actor, slot, accepted, world))
    }

    /// Like `try_use`, but a request blocked only by the GCD or the current
    /// cast with at most `spell_queue_window` left is buffered and issued by
    /// `tick` as soon as the actor is free. A newer request replaces an
    /// older one.
    pub fn try_use_or_queue<W: CombatWorld + ?Sized>(
        &mut self,
        actor: ActorId,
        slot: usize,
        target: Option<TargetHandle>,
        world: &mut W,
    ) -> Result<QueueOutcome, UseRejection> {
        let rejection = match self.try_use(actor, slot, target, world) {
            Ok(outcome) => return Ok(QueueOutcome::Started(outcome)),
            Err(rejection) => rejection,
        };
        let blocking = match &rejection {
            UseRejection::OnGlobalCooldown { remaining } => *remaining,
            UseRejection::AlreadyBusy { .. } => self
                .actors
                .get(&actor)
                .map_or(f32::INFINITY, |state| state.activity.remaining()),
            _ => return Err(rejection),
        };
        if blocking > self.config.spell_queue_window {
            return Err(rejection);
        }
        let Some(state) = self.actors.get_mut(&actor) else {
            return Err(rejection);
        };
        state.queued = Some(QueuedUse { slot, target });
        debug!("Actor {} queued slot {} ({:.2}s left)", actor, slot, blocking);
        self.emit(CombatEvent::AbilityQueued { actor, slot });
        Ok(QueueOutcome::Queued)
    }

    pub fn queued(&self, actor: ActorId) -> Option<QueuedUse> {
        self.actors.get(&actor).and_then(|state| state.queued)
    }

    pub fn clear_queue(&mut self, actor: ActorId) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.queued = None;
        }
    }

    // ========================================================================
    // Interruption & lock overlay
    // ========================================================================

    /// Stop the current cast or channel without executing its final effect.
    /// Spent resources and completed channel ticks stand. Returns false when
    /// the actor was not casting or channeling.
    pub fn interrupt(&mut self, actor: ActorId, reason: InterruptReason) -> bool {
        let Some(state) = self.actors.get_mut(&actor) else {
            return false;
        };
        let event = match std::mem::take(&mut state.activity) {
            Activity::Idle => return false,
            Activity::Casting(cast) => CombatEvent::CastInterrupted {
                actor,
                ability: cast.ability,
                reason,
            },
            Activity::Channeling(channel) => CombatEvent::ChannelInterrupted {
                actor,
                ability: channel.ability,
                reason,
                ticks_completed: channel.ticks_completed,
            },
        };
        debug!("Actor {} interrupted ({})", actor, reason.name());
        self.emit(event);
        true
    }

    /// Lock the actor (stun/silence) for `duration` seconds. An active lock
    /// is extended, never shortened. Any cast or channel is interrupted and
    /// a queued request is dropped.
    pub fn lock(&mut self, actor: ActorId, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        let Some(state) = self.actors.get_mut(&actor) else {
            return;
        };
        state.queued = None;
        if duration > state.lock_remaining {
            state.lock_remaining = duration;
            self.emit(CombatEvent::Locked { actor, duration });
        }
        self.interrupt(actor, InterruptReason::Locked);
    }

    pub fn unlock(&mut self, actor: ActorId) {
        if let Some(state) = self.actors.get_mut(&actor) {
            if state.lock_remaining > 0.0 {
                state.lock_remaining = 0.0;
                self.emit(CombatEvent::Unlocked { actor });
            }
        }
    }

    pub fn lock_remaining(&self, actor: ActorId) -> f32 {
        self.actors.get(&actor).map_or(0.0, |state| state.lock_remaining)
    }

    // ========================================================================
    // Stealth & combat state
    // ========================================================================

    /// Enter stealth. Fails while already stealthed or during the
    /// re-entry cooldown.
    pub fn enter_stealth(&mut self, actor: ActorId) -> bool {
        let entered = self.systems.stealth.enter(actor);
        if entered {
            self.emit(CombatEvent::StealthEntered { actor });
        }
        entered
    }

    /// Break stealth; idempotent when the actor is not stealthed.
    pub fn break_stealth(&mut self, actor: ActorId, reason: StealthBreakReason) -> bool {
        let broken = self.systems.stealth.break_stealth(actor, reason);
        if broken {
            self.emit(CombatEvent::StealthBroken { actor, reason });
        }
        broken
    }

    /// Damage taken from any source breaks stealth.
    pub fn notify_damage_taken(&mut self, actor: ActorId) {
        self.break_stealth(actor, StealthBreakReason::TookDamage);
    }

    /// Switch regeneration between in-combat and out-of-combat rates.
    pub fn set_in_combat(&mut self, actor: ActorId, in_combat: bool) {
        self.systems.resources.set_regen_mode(actor, in_combat);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn machine_state(&self, actor: ActorId) -> MachineState {
        let Some(state) = self.actors.get(&actor) else {
            return MachineState::Idle;
        };
        if state.is_locked() {
            return MachineState::Locked;
        }
        match state.activity {
            Activity::Casting(_) => MachineState::Casting,
            Activity::Channeling(_) => MachineState::Channeling,
            Activity::Idle if self.cooldowns.is_on_gcd(actor) => MachineState::GlobalCooldown,
            Activity::Idle => MachineState::Idle,
        }
    }

    pub fn is_on_gcd(&self, actor: ActorId) -> bool {
        self.cooldowns.is_on_gcd(actor)
    }

    pub fn gcd_remaining(&self, actor: ActorId) -> f32 {
        self.cooldowns.gcd_remaining(actor)
    }

    pub fn is_casting(&self, actor: ActorId) -> bool {
        self.actors
            .get(&actor)
            .is_some_and(|state| matches!(state.activity, Activity::Casting(_)))
    }

    pub fn is_channeling(&self, actor: ActorId) -> bool {
        self.actors
            .get(&actor)
            .is_some_and(|state| matches!(state.activity, Activity::Channeling(_)))
    }

    /// 0.0 at cast start rising to 1.0 at completion; 0.0 when not casting.
    pub fn cast_progress(&self, actor: ActorId) -> f32 {
        match self.actors.get(&actor).map(|state| &state.activity) {
            Some(Activity::Casting(cast)) if cast.ability.cast_time > 0.0 => {
                (1.0 - cast.remaining / cast.ability.cast_time).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Remaining fraction of the channel: 1.0 at start falling to 0.0;
    /// 0.0 when not channeling.
    pub fn channel_progress(&self, actor: ActorId) -> f32 {
        match self.actors.get(&actor).map(|state| &state.activity) {
            Some(Activity::Channeling(channel)) if channel.duration > 0.0 => {
                (channel.remaining / channel.duration).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Channel ticks fired so far in the current channel.
    pub fn ticks_completed(&self, actor: ActorId) -> u32 {
        match self.actors.get(&actor).map(|state| &state.activity) {
            Some(Activity::Channeling(channel)) => channel.ticks_completed,
            _ => 0,
        }
    }

    /// The ability being cast or channeled.
    pub fn current_ability(&self, actor: ActorId) -> Option<Arc<AbilityDefinition>> {
        self.actors
            .get(&actor)
            .and_then(|state| state.activity.ability().cloned())
    }

    pub fn cooldown_remaining(&self, actor: ActorId, slot: usize) -> f32 {
        self.cooldowns.remaining(actor, slot)
    }

    /// 1.0 = cooldown just started, 0.0 = ready.
    pub fn cooldown_progress(&self, actor: ActorId, slot: usize) -> f32 {
        self.cooldowns.cooldown_progress(actor, slot)
    }

    pub fn reset_cooldowns(&mut self, actor: ActorId) {
        self.cooldowns.reset(actor);
    }

    pub fn combo_points(&self, actor: ActorId) -> u8 {
        self.systems.combo.points(actor)
    }

    pub fn resource(&self, actor: ActorId, kind: ResourceKind) -> f32 {
        self.systems.resources.current(actor, kind)
    }

    pub fn is_in_stealth(&self, actor: ActorId) -> bool {
        self.systems.stealth.is_in_stealth(actor)
    }
}

impl Default for AbilityEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::ability::ChannelConfig;
    use crate::combat::world::{ActorSnapshot, WorldSnapshot};
    use bevy::math::Vec3;

    fn setup(ability: AbilityDefinition) -> (AbilityEngine, WorldSnapshot) {
        let mut engine = AbilityEngine::default();
        let mut world = WorldSnapshot::new();
        for (id, team, z) in [(1, 1, 0.0), (2, 2, 10.0)] {
            engine.register_actor(ActorId(id));
            engine.register_resource(ActorId(id), ResourceKind::Mana, 100.0, None);
            world.upsert(ActorId(id), ActorSnapshot::new(team, Vec3::new(0.0, 0.0, z), 500.0));
        }
        world.set_target(ActorId(1), Some(ActorId(2)));
        engine.set_slot(ActorId(1), 0, Some(Arc::new(ability)));
        (engine, world)
    }

    #[test]
    fn test_unknown_actor_queries_are_neutral() {
        let engine = AbilityEngine::default();
        let ghost = ActorId(77);
        assert_eq!(engine.machine_state(ghost), MachineState::Idle);
        assert_eq!(engine.cooldown_remaining(ghost, 3), 0.0);
        assert_eq!(engine.gcd_remaining(ghost), 0.0);
        assert!(engine.current_ability(ghost).is_none());
    }

    #[test]
    fn test_set_slot_bounds() {
        let (mut engine, _) = setup(AbilityDefinition::new("jab", "Jab"));
        let slots = engine.config().slot_count;
        assert!(!engine.set_slot(ActorId(1), slots, None));
        assert!(!engine.set_slot(ActorId(9), 0, None));
        assert!(engine.set_slot(ActorId(1), 0, None));
        assert!(engine.ability_in_slot(ActorId(1), 0).is_none());
    }

    #[test]
    fn test_channel_progress_falls_from_one() {
        let (mut engine, mut world) = setup(AbilityDefinition {
            channel: Some(ChannelConfig {
                duration: 4.0,
                tick_interval: 1.0,
            }),
            ..AbilityDefinition::new("siphon", "Siphon")
        });
        engine
            .try_use(ActorId(1), 0, None, &mut world)
            .expect("channel starts");
        assert_eq!(engine.channel_progress(ActorId(1)), 1.0);
        engine.tick(1.0, &mut world);
        assert!((engine.channel_progress(ActorId(1)) - 0.75).abs() < 1e-4);
        assert_eq!(engine.ticks_completed(ActorId(1)), 2);
        assert_eq!(engine.machine_state(ActorId(1)), MachineState::Channeling);
    }

    #[test]
    fn test_large_step_fires_every_due_tick() {
        let (mut engine, mut world) = setup(AbilityDefinition {
            channel: Some(ChannelConfig {
                duration: 5.0,
                tick_interval: 1.0,
            }),
            damage_min: 10.0,
            damage_max: 10.0,
            ..AbilityDefinition::new("siphon", "Siphon")
        });
        engine
            .try_use(ActorId(1), 0, None, &mut world)
            .expect("channel starts");
        engine.tick(3.5, &mut world);
        assert_eq!(engine.ticks_completed(ActorId(1)), 4);
        let ticks: Vec<u32> = engine
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                CombatEvent::ChannelTick { tick, .. } => Some(tick),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![1, 2, 3, 4]);
        assert_eq!(world.health(ActorId(2)), 460.0);
    }

    #[test]
    fn test_rejection_emits_nothing() {
        let (mut engine, mut world) = setup(AbilityDefinition {
            resource_cost: 500.0,
            ..AbilityDefinition::new("nuke", "Nuke")
        });
        let rejection = engine
            .try_use(ActorId(1), 0, None, &mut world)
            .expect_err("too expensive");
        assert_eq!(rejection.shortfall(), 400.0);
        assert!(engine.pending_events().is_empty());
        assert_eq!(engine.resource(ActorId(1), ResourceKind::Mana), 100.0);
    }
}
