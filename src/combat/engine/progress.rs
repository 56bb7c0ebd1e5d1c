//! Per-tick progression: lock overlay, cooldowns, casts, channels,
//! regeneration and the spell queue.

use bevy::prelude::*;
use std::sync::Arc;

use super::AbilityEngine;
use crate::combat::ability::ActorId;
use crate::combat::constants::TIMER_EPSILON;
use crate::combat::events::CombatEvent;
use crate::combat::state::{Activity, InterruptReason};
use crate::combat::world::CombatWorld;

impl AbilityEngine {
    /// Advance every registered actor by `dt` seconds, in actor id order.
    pub fn tick<W: CombatWorld + ?Sized>(&mut self, dt: f32, world: &mut W) {
        if dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        self.systems.diminishing.tick(dt);

        let ids: Vec<ActorId> = self.actors.keys().copied().collect();
        for actor in ids {
            self.tick_lock(actor, dt);
            self.tick_cooldowns(actor, dt);
            self.tick_activity(actor, dt, world);
            self.systems.resources.tick(actor, dt);
            self.systems.stealth.tick(actor, dt);
            self.issue_queued(actor, world);
        }
    }

    fn tick_lock(&mut self, actor: ActorId, dt: f32) {
        let Some(state) = self.actors.get_mut(&actor) else {
            return;
        };
        if state.lock_remaining <= 0.0 {
            return;
        }
        state.lock_remaining -= dt;
        if state.lock_remaining <= TIMER_EPSILON {
            state.lock_remaining = 0.0;
            self.emit(CombatEvent::Unlocked { actor });
        }
    }

    fn tick_cooldowns(&mut self, actor: ActorId, dt: f32) {
        let finished = self.cooldowns.tick(actor, dt);
        if finished.gcd_ended {
            self.emit(CombatEvent::GcdEnded { actor });
        }
        for slot in finished.slots_ready {
            self.emit(CombatEvent::CooldownReady { actor, slot });
        }
    }

    fn tick_activity<W: CombatWorld + ?Sized>(&mut self, actor: ActorId, dt: f32, world: &mut W) {
        let threshold = self.config.movement_interrupt_threshold;
        let Some(state) = self.actors.get_mut(&actor) else {
            return;
        };

        let start_position = match &state.activity {
            Activity::Idle => return,
            Activity::Casting(cast) => cast.start_position,
            Activity::Channeling(channel) => channel.start_position,
        };
        let moved = match (start_position, world.position(actor)) {
            (Some(start), Some(now)) => start.distance(now) > threshold,
            _ => false,
        };
        if moved {
            self.interrupt(actor, InterruptReason::Movement);
            return;
        }

        match &mut state.activity {
            Activity::Idle => {}
            Activity::Casting(cast) => {
                cast.remaining -= dt;
                if cast.remaining <= TIMER_EPSILON {
                    self.complete_cast(actor, world);
                }
            }
            Activity::Channeling(channel) => {
                channel.elapsed += dt;
                channel.remaining -= dt;
                self.fire_due_channel_ticks(actor, world);
                self.finish_channel_if_done(actor);
            }
        }
    }

    fn complete_cast<W: CombatWorld + ?Sized>(&mut self, actor: ActorId, world: &mut W) {
        let Some(state) = self.actors.get_mut(&actor) else {
            return;
        };
        let Activity::Casting(cast) = std::mem::take(&mut state.activity) else {
            return;
        };
        debug!("Actor {} completed cast of {}", actor, cast.ability.id);
        self.emit(CombatEvent::CastCompleted {
            actor,
            ability: Arc::clone(&cast.ability),
        });
        self.emit(CombatEvent::AbilityExecuted {
            actor,
            ability: Arc::clone(&cast.ability),
            target: cast.target,
            combo_points_consumed: cast.combo_points_consumed,
            multiplier: cast.multiplier,
        });
        self.apply_effects(actor, &cast.ability, cast.target, cast.multiplier, true, world);
    }

    /// Fire every tick whose scheduled time has been reached. Tick `k`
    /// (0-based) is due at `k * tick_interval` after channel start, so a
    /// large `dt` fires several ticks in one call.
    pub(super) fn fire_due_channel_ticks<W: CombatWorld + ?Sized>(
        &mut self,
        actor: ActorId,
        world: &mut W,
    ) {
        loop {
            let Some(state) = self.actors.get_mut(&actor) else {
                return;
            };
            let Activity::Channeling(channel) = &mut state.activity else {
                // A tick's effects may have interrupted the channel
                return;
            };
            if channel.ticks_completed >= channel.total_ticks
                || channel.elapsed + TIMER_EPSILON < channel.next_tick_time()
            {
                return;
            }
            channel.ticks_completed += 1;
            let tick = channel.ticks_completed;
            let total_ticks = channel.total_ticks;
            let ability = Arc::clone(&channel.ability);
            let target = channel.target;
            let multiplier = channel.multiplier;

            self.emit(CombatEvent::ChannelTick {
                actor,
                ability: Arc::clone(&ability),
                tick,
                total_ticks,
                multiplier,
            });
            self.apply_effects(actor, &ability, target, multiplier, tick == 1, world);
        }
    }

    fn finish_channel_if_done(&mut self, actor: ActorId) {
        let Some(state) = self.actors.get_mut(&actor) else {
            return;
        };
        let done = match &state.activity {
            Activity::Channeling(channel) => {
                channel.ticks_completed >= channel.total_ticks
                    || channel.remaining <= TIMER_EPSILON
            }
            _ => false,
        };
        if !done {
            return;
        }
        if let Activity::Channeling(channel) = std::mem::take(&mut state.activity) {
            debug!(
                "Actor {} finished channeling {} ({} ticks)",
                actor, channel.ability.id, channel.ticks_completed
            );
            self.emit(CombatEvent::ChannelCompleted {
                actor,
                ability: channel.ability,
                ticks_completed: channel.ticks_completed,
            });
        }
    }

    /// Re-issue a buffered request once its blocker has cleared.
    fn issue_queued<W: CombatWorld + ?Sized>(&mut self, actor: ActorId, world: &mut W) {
        let Some(state) = self.actors.get(&actor) else {
            return;
        };
        let Some(queued) = state.queued else {
            return;
        };
        if state.activity.is_busy() {
            return;
        }
        let waits_for_gcd = state
            .ability_in_slot(queued.slot)
            .is_some_and(|ability| ability.affected_by_gcd);
        if waits_for_gcd && self.cooldowns.is_on_gcd(actor) {
            return;
        }

        if let Some(state) = self.actors.get_mut(&actor) {
            state.queued = None;
        }
        if let Err(rejection) = self.try_use(actor, queued.slot, queued.target, world) {
            debug!("Queued slot {} for actor {} rejected: {}", queued.slot, actor, rejection);
            self.emit(CombatEvent::QueuedAbilityRejected {
                actor,
                slot: queued.slot,
                rejection,
            });
        }
    }
}
