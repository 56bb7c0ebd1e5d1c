//! Per-actor combat state owned by the engine.

use bevy::math::Vec3;
use std::sync::Arc;

use super::ability::{AbilityDefinition, ActorId};

/// Externally visible machine state, highest priority first:
/// Locked > Casting/Channeling > GlobalCooldown > Idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MachineState {
    Idle,
    GlobalCooldown,
    Casting,
    Channeling,
    Locked,
}

impl MachineState {
    pub fn name(&self) -> &'static str {
        match self {
            MachineState::Idle => "Idle",
            MachineState::GlobalCooldown => "GlobalCooldown",
            MachineState::Casting => "Casting",
            MachineState::Channeling => "Channeling",
            MachineState::Locked => "Locked",
        }
    }
}

/// Why a cast or channel ended early.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterruptReason {
    /// Moved further than the interrupt threshold from the start position.
    Movement,
    /// Stunned, feared or silenced.
    Locked,
    /// Any other external request (kick, counterspell, host cancel).
    External,
}

impl InterruptReason {
    pub fn name(&self) -> &'static str {
        match self {
            InterruptReason::Movement => "movement",
            InterruptReason::Locked => "locked",
            InterruptReason::External => "interrupted",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CastState {
    pub slot: usize,
    pub ability: Arc<AbilityDefinition>,
    pub target: Option<ActorId>,
    pub remaining: f32,
    /// None when the host had no position for the caster at cast start;
    /// movement interruption is skipped in that case.
    pub start_position: Option<Vec3>,
    pub combo_points_consumed: u8,
    pub multiplier: f32,
}

#[derive(Clone, Debug)]
pub struct ChannelState {
    pub slot: usize,
    pub ability: Arc<AbilityDefinition>,
    pub target: Option<ActorId>,
    pub duration: f32,
    pub tick_interval: f32,
    pub remaining: f32,
    pub elapsed: f32,
    pub ticks_completed: u32,
    pub total_ticks: u32,
    pub start_position: Option<Vec3>,
    pub combo_points_consumed: u8,
    pub multiplier: f32,
}

impl ChannelState {
    /// Scheduled time of the next tick, measured from channel start.
    pub fn next_tick_time(&self) -> f32 {
        self.ticks_completed as f32 * self.tick_interval
    }
}

#[derive(Clone, Debug, Default)]
pub enum Activity {
    #[default]
    Idle,
    Casting(CastState),
    Channeling(ChannelState),
}

impl Activity {
    pub fn is_busy(&self) -> bool {
        !matches!(self, Activity::Idle)
    }

    /// Time left on the current cast or channel.
    pub fn remaining(&self) -> f32 {
        match self {
            Activity::Idle => 0.0,
            Activity::Casting(cast) => cast.remaining,
            Activity::Channeling(channel) => channel.remaining,
        }
    }

    pub fn ability(&self) -> Option<&Arc<AbilityDefinition>> {
        match self {
            Activity::Idle => None,
            Activity::Casting(cast) => Some(&cast.ability),
            Activity::Channeling(channel) => Some(&channel.ability),
        }
    }
}

/// A buffered request waiting for the GCD or current cast to finish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuedUse {
    pub slot: usize,
    pub target: Option<ActorId>,
}

#[derive(Clone, Debug, Default)]
pub struct ActorCombatState {
    pub loadout: Vec<Option<Arc<AbilityDefinition>>>,
    pub activity: Activity,
    pub lock_remaining: f32,
    pub queued: Option<QueuedUse>,
}

impl ActorCombatState {
    pub fn new(slot_count: usize) -> Self {
        Self {
            loadout: vec![None; slot_count],
            ..Default::default()
        }
    }

    pub fn ability_in_slot(&self, slot: usize) -> Option<&Arc<AbilityDefinition>> {
        self.loadout.get(slot).and_then(Option::as_ref)
    }

    pub fn is_locked(&self) -> bool {
        self.lock_remaining > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_and_out_of_range_slots_are_empty() {
        let mut state = ActorCombatState::new(4);
        state.loadout[1] = Some(Arc::new(AbilityDefinition::new("kick", "Kick")));
        assert!(state.ability_in_slot(0).is_none());
        assert!(state.ability_in_slot(1).is_some());
        assert!(state.ability_in_slot(99).is_none());
    }

    #[test]
    fn test_next_tick_time_follows_interval() {
        let channel = ChannelState {
            slot: 0,
            ability: Arc::new(AbilityDefinition::new("drain", "Drain")),
            target: None,
            duration: 5.0,
            tick_interval: 1.0,
            remaining: 5.0,
            elapsed: 0.0,
            ticks_completed: 3,
            total_ticks: 5,
            start_position: None,
            combo_points_consumed: 0,
            multiplier: 1.0,
        };
        assert_eq!(channel.next_tick_time(), 3.0);
    }
}
