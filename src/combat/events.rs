//! Combat events
//!
//! Everything the engine decides is reported through `CombatEvent`s pushed
//! to an outgoing queue, in the order the decisions were made:
//! GCD before cooldown before cast start, channel ticks in ascending index
//! order, execution before its effects.

use bevy::math::Vec3;
use bevy::prelude::Event;
use std::sync::Arc;

use super::ability::{AbilityDefinition, ActorId, CrowdControlCategory, DamageType};
use super::error::UseRejection;
use super::state::InterruptReason;
use super::stealth::StealthBreakReason;

#[derive(Event, Clone, Debug, PartialEq)]
pub enum CombatEvent {
    GcdStarted {
        actor: ActorId,
        duration: f32,
    },
    GcdEnded {
        actor: ActorId,
    },
    CooldownStarted {
        actor: ActorId,
        slot: usize,
        duration: f32,
    },
    CooldownReady {
        actor: ActorId,
        slot: usize,
    },
    CastStarted {
        actor: ActorId,
        ability: Arc<AbilityDefinition>,
        target: Option<ActorId>,
        cast_time: f32,
    },
    CastCompleted {
        actor: ActorId,
        ability: Arc<AbilityDefinition>,
    },
    CastInterrupted {
        actor: ActorId,
        ability: Arc<AbilityDefinition>,
        reason: InterruptReason,
    },
    ChannelStarted {
        actor: ActorId,
        ability: Arc<AbilityDefinition>,
        target: Option<ActorId>,
        duration: f32,
        total_ticks: u32,
    },
    /// `tick` is 1-based; the first tick fires on channel start.
    ChannelTick {
        actor: ActorId,
        ability: Arc<AbilityDefinition>,
        tick: u32,
        total_ticks: u32,
        multiplier: f32,
    },
    ChannelCompleted {
        actor: ActorId,
        ability: Arc<AbilityDefinition>,
        ticks_completed: u32,
    },
    ChannelInterrupted {
        actor: ActorId,
        ability: Arc<AbilityDefinition>,
        reason: InterruptReason,
        ticks_completed: u32,
    },
    /// An instant or a completed cast took effect. Finishers report the
    /// points consumed and the resolved damage multiplier.
    AbilityExecuted {
        actor: ActorId,
        ability: Arc<AbilityDefinition>,
        target: Option<ActorId>,
        combo_points_consumed: u8,
        multiplier: f32,
    },
    Damage {
        source: ActorId,
        target: ActorId,
        ability: Arc<AbilityDefinition>,
        amount: f32,
        damage_type: DamageType,
    },
    Heal {
        source: ActorId,
        target: ActorId,
        ability: Arc<AbilityDefinition>,
        amount: f32,
    },
    /// Self-heal from damage dealt (`damage * heal_on_damage_percent`).
    DrainHeal {
        actor: ActorId,
        ability: Arc<AbilityDefinition>,
        amount: f32,
    },
    /// Move `target` to `destination` (the caster's position).
    Pull {
        source: ActorId,
        target: ActorId,
        destination: Vec3,
    },
    /// Displace the caster along `direction` (unit vector) by `distance`.
    KnockbackSelf {
        actor: ActorId,
        direction: Vec3,
        distance: f32,
    },
    CrowdControlApplied {
        source: ActorId,
        target: ActorId,
        category: CrowdControlCategory,
        duration: f32,
        /// Applications in the DR window including this one.
        dr_level: usize,
    },
    CrowdControlImmune {
        source: ActorId,
        target: ActorId,
        category: CrowdControlCategory,
    },
    ComboPointsChanged {
        actor: ActorId,
        points: u8,
    },
    StealthEntered {
        actor: ActorId,
    },
    StealthBroken {
        actor: ActorId,
        reason: StealthBreakReason,
    },
    Locked {
        actor: ActorId,
        duration: f32,
    },
    Unlocked {
        actor: ActorId,
    },
    AbilityQueued {
        actor: ActorId,
        slot: usize,
    },
    QueuedAbilityRejected {
        actor: ActorId,
        slot: usize,
        rejection: UseRejection,
    },
}

impl CombatEvent {
    /// The actor whose state the event describes.
    pub fn actor(&self) -> ActorId {
        match self {
            CombatEvent::GcdStarted { actor, .. }
            | CombatEvent::GcdEnded { actor }
            | CombatEvent::CooldownStarted { actor, .. }
            | CombatEvent::CooldownReady { actor, .. }
            | CombatEvent::CastStarted { actor, .. }
            | CombatEvent::CastCompleted { actor, .. }
            | CombatEvent::CastInterrupted { actor, .. }
            | CombatEvent::ChannelStarted { actor, .. }
            | CombatEvent::ChannelTick { actor, .. }
            | CombatEvent::ChannelCompleted { actor, .. }
            | CombatEvent::ChannelInterrupted { actor, .. }
            | CombatEvent::AbilityExecuted { actor, .. }
            | CombatEvent::DrainHeal { actor, .. }
            | CombatEvent::KnockbackSelf { actor, .. }
            | CombatEvent::ComboPointsChanged { actor, .. }
            | CombatEvent::StealthEntered { actor }
            | CombatEvent::StealthBroken { actor, .. }
            | CombatEvent::Locked { actor, .. }
            | CombatEvent::Unlocked { actor }
            | CombatEvent::AbilityQueued { actor, .. }
            | CombatEvent::QueuedAbilityRejected { actor, .. } => *actor,
            CombatEvent::Damage { source, .. }
            | CombatEvent::Heal { source, .. }
            | CombatEvent::Pull { source, .. }
            | CombatEvent::CrowdControlApplied { source, .. }
            | CombatEvent::CrowdControlImmune { source, .. } => *source,
        }
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            CombatEvent::CastInterrupted { .. } | CombatEvent::ChannelInterrupted { .. }
        )
    }
}
