//! Acceptance and effect application.
//!
//! `start` commits an accepted request (resource, GCD, cooldown, combo
//! points) and branches into instant / cast / channel. `apply_effects` is
//! the effect step shared by instants, cast completion and every channel
//! tick.

use bevy::math::Vec3;
use bevy::prelude::*;
use smallvec::SmallVec;
use std::sync::Arc;

use super::validation::Accepted;
use super::{AbilityEngine, UseOutcome};
use crate::combat::ability::{AbilityDefinition, ActorId, TargetHandle};
use crate::combat::area::{AreaShape, EffectIntent};
use crate::combat::events::CombatEvent;
use crate::combat::state::{Activity, CastState, ChannelState};
use crate::combat::stealth::StealthBreakReason;
use crate::combat::world::CombatWorld;

impl AbilityEngine {
    pub(super) fn start<W: CombatWorld + ?Sized>(
        &mut self,
        actor: ActorId,
        slot: usize,
        accepted: Accepted,
        world: &mut W,
    ) -> UseOutcome {
        let Accepted { ability, target } = accepted;

        // Cost is committed here at acceptance for every timing model, casts
        // included, not at cast completion: a cast interrupted by movement
        // must leave its resources and combo points spent. Interrupted casts
        // and channels are never refunded.
        let spent = self
            .systems
            .resources
            .try_spend(actor, ability.resource_kind, ability.resource_cost);
        debug_assert!(spent, "validated spend must succeed");

        if ability.affected_by_gcd && self.config.global_cooldown > 0.0 {
            let duration = self.config.global_cooldown;
            self.cooldowns.start_gcd(actor, duration);
            self.emit(CombatEvent::GcdStarted { actor, duration });
        }

        if ability.cooldown > 0.0 {
            self.cooldowns.start_cooldown(actor, slot, ability.cooldown);
            self.emit(CombatEvent::CooldownStarted {
                actor,
                slot,
                duration: ability.cooldown,
            });
        }

        let (combo_points_consumed, multiplier) = if ability.consumes_combo_points {
            let points = self.systems.combo.consume_all(actor);
            self.emit(CombatEvent::ComboPointsChanged { actor, points: 0 });
            (points, ability.combo_multiplier(points))
        } else {
            (0, 1.0)
        };

        let start_position = world.position(actor);

        if let Some(channel) = ability.channel.clone() {
            let total_ticks = channel.total_ticks();
            if let Some(state) = self.actors.get_mut(&actor) {
                state.activity = Activity::Channeling(ChannelState {
                    slot,
                    ability: Arc::clone(&ability),
                    target,
                    duration: channel.duration,
                    tick_interval: channel.tick_interval,
                    remaining: channel.duration,
                    elapsed: 0.0,
                    ticks_completed: 0,
                    total_ticks,
                    start_position,
                    combo_points_consumed,
                    multiplier,
                });
            }
            debug!(
                "Actor {} channeling {} ({} ticks over {:.1}s)",
                actor, ability.id, total_ticks, channel.duration
            );
            self.emit(CombatEvent::ChannelStarted {
                actor,
                ability,
                target,
                duration: channel.duration,
                total_ticks,
            });
            // First tick fires on channel start
            self.fire_due_channel_ticks(actor, world);
            UseOutcome::ChannelStarted
        } else if ability.cast_time > 0.0 {
            if let Some(state) = self.actors.get_mut(&actor) {
                state.activity = Activity::Casting(CastState {
                    slot,
                    ability: Arc::clone(&ability),
                    target,
                    remaining: ability.cast_time,
                    start_position,
                    combo_points_consumed,
                    multiplier,
                });
            }
            debug!("Actor {} casting {} ({:.1}s)", actor, ability.id, ability.cast_time);
            self.emit(CombatEvent::CastStarted {
                actor,
                cast_time: ability.cast_time,
                ability,
                target,
            });
            UseOutcome::CastStarted
        } else {
            debug!("Actor {} used {}", actor, ability.id);
            self.emit(CombatEvent::AbilityExecuted {
                actor,
                ability: Arc::clone(&ability),
                target,
                combo_points_consumed,
                multiplier,
            });
            self.apply_effects(actor, &ability, target, multiplier, true, world);
            UseOutcome::Executed
        }
    }

    /// Apply an ability's instantaneous effect once. `first_execution` is
    /// false for channel ticks after the first, so per-use effects (combo
    /// generation, stealth entry) happen once per use.
    pub(super) fn apply_effects<W: CombatWorld + ?Sized>(
        &mut self,
        actor: ActorId,
        ability: &Arc<AbilityDefinition>,
        target: Option<TargetHandle>,
        multiplier: f32,
        first_execution: bool,
        world: &mut W,
    ) {
        if ability.breaks_stealth {
            self.break_stealth(actor, StealthBreakReason::AbilityUsed);
        }
        if first_execution && ability.enters_stealth {
            self.enter_stealth(actor);
        }

        if first_execution && ability.generates_combo_point() {
            let points = self
                .systems
                .combo
                .add(actor, ability.generates_combo_points);
            self.emit(CombatEvent::ComboPointsChanged { actor, points });
        }

        let victims = self.resolve_victims(actor, ability, target, world);

        // === Damage & drain ===
        if ability.is_damage() {
            let mut dealt_total = 0.0;
            for &victim in &victims {
                let amount = self.rng.random_range(ability.damage_min, ability.damage_max) * multiplier;
                let dealt = world.apply_damage(victim, amount, ability.damage_type, actor);
                if dealt > 0.0 {
                    self.emit(CombatEvent::Damage {
                        source: actor,
                        target: victim,
                        ability: Arc::clone(ability),
                        amount: dealt,
                        damage_type: ability.damage_type,
                    });
                    self.notify_damage_taken(victim);
                }
                dealt_total += dealt;
            }
            if ability.heals_on_damage() && dealt_total > 0.0 {
                let healed = world.apply_heal(actor, dealt_total * ability.heal_on_damage_percent);
                if healed > 0.0 {
                    self.emit(CombatEvent::DrainHeal {
                        actor,
                        ability: Arc::clone(ability),
                        amount: healed,
                    });
                }
            }
        }

        // === Healing ===
        if ability.is_heal() {
            let recipients: SmallVec<[ActorId; 8]> = if ability.area.is_some() {
                victims.clone()
            } else {
                let recipient = target
                    .filter(|t| *t == actor || world.is_ally(actor, *t))
                    .unwrap_or(actor);
                SmallVec::from_elem(recipient, 1)
            };
            for recipient in recipients {
                let healed = world.apply_heal(recipient, ability.healing);
                if healed > 0.0 {
                    self.emit(CombatEvent::Heal {
                        source: actor,
                        target: recipient,
                        ability: Arc::clone(ability),
                        amount: healed,
                    });
                }
            }
        }

        // === Displacement ===
        let caster_position = world.position(actor);
        if ability.is_pull_effect {
            if let (Some(victim), Some(destination)) = (target, caster_position) {
                self.emit(CombatEvent::Pull {
                    source: actor,
                    target: victim,
                    destination,
                });
            }
        }
        if ability.is_knockback_self {
            let away_from_target = match (caster_position, target.and_then(|t| world.position(t))) {
                (Some(from), Some(to)) => (from - to).try_normalize(),
                _ => None,
            };
            let direction = away_from_target
                .unwrap_or_else(|| -world.facing(actor).unwrap_or(Vec3::Z));
            self.emit(CombatEvent::KnockbackSelf {
                actor,
                direction,
                distance: ability.knockback_distance,
            });
        }

        // === Crowd control ===
        if let Some(category) = ability.crowd_control {
            let base = ability
                .cc_duration
                .unwrap_or_else(|| self.config.crowd_control.base_duration(category));
            for &victim in &victims {
                let duration = self.systems.diminishing.apply(victim, category, base);
                if duration > 0.0 {
                    let dr_level = self.systems.diminishing.dr_level(victim, category);
                    self.emit(CombatEvent::CrowdControlApplied {
                        source: actor,
                        target: victim,
                        category,
                        duration,
                        dr_level,
                    });
                    if category.locks_abilities() {
                        self.lock(victim, duration);
                    }
                } else {
                    debug!("{} is immune to {} from {}", victim, category.name(), actor);
                    self.emit(CombatEvent::CrowdControlImmune {
                        source: actor,
                        target: victim,
                        category,
                    });
                }
            }
        }
    }

    /// Actors hit by damage and crowd control: the area result for area
    /// abilities, otherwise the single target (if any).
    fn resolve_victims<W: CombatWorld + ?Sized>(
        &self,
        actor: ActorId,
        ability: &AbilityDefinition,
        target: Option<TargetHandle>,
        world: &W,
    ) -> SmallVec<[ActorId; 8]> {
        let Some(area) = &ability.area else {
            return target.into_iter().collect();
        };
        let Some(caster_position) = world.position(actor) else {
            return SmallVec::new();
        };
        let anchor = if ability.requires_target {
            target.and_then(|t| world.position(t))
        } else {
            None
        };
        let facing = world.facing(actor).unwrap_or(Vec3::Z);
        let shape = AreaShape::place(&area.shape, caster_position, anchor, facing);
        let intent = if ability.is_damage() || ability.crowd_control.is_some() {
            EffectIntent::Harmful
        } else {
            EffectIntent::Beneficial
        };
        self.area
            .targets_in_area(
                &shape,
                actor,
                area.include_allies,
                area.include_enemies,
                intent,
                world,
            )
            .into_iter()
            .collect()
    }
}
