//! `try_use` checks, evaluated in order; the first failure wins and
//! nothing is mutated before every check has passed.

use std::sync::Arc;

use super::AbilityEngine;
use crate::combat::ability::{AbilityDefinition, ActorId, TargetHandle};
use crate::combat::error::UseRejection;
use crate::combat::state::MachineState;
use crate::combat::world::CombatWorld;

/// A request that passed every check.
pub(super) struct Accepted {
    pub ability: Arc<AbilityDefinition>,
    pub target: Option<TargetHandle>,
}

impl AbilityEngine {
    pub(super) fn validate<W: CombatWorld + ?Sized>(
        &self,
        actor: ActorId,
        slot: usize,
        target: Option<TargetHandle>,
        world: &W,
    ) -> Result<Accepted, UseRejection> {
        // 1. Slot must hold an ability (unknown actors have no slots)
        let state = self
            .actors
            .get(&actor)
            .ok_or(UseRejection::NoAbilityInSlot { slot })?;
        let ability = state
            .ability_in_slot(slot)
            .cloned()
            .ok_or(UseRejection::NoAbilityInSlot { slot })?;

        // 2. Lock overlay
        if state.is_locked() {
            return Err(UseRejection::Locked {
                remaining: state.lock_remaining,
            });
        }

        // 3. Global cooldown
        let gcd = self.cooldowns.gcd_remaining(actor);
        if ability.affected_by_gcd && gcd > 0.0 {
            return Err(UseRejection::OnGlobalCooldown { remaining: gcd });
        }

        // 4. Ability cooldown
        let cooldown = self.cooldowns.remaining(actor, slot);
        if cooldown > 0.0 {
            return Err(UseRejection::OnCooldown {
                slot,
                remaining: cooldown,
            });
        }

        // 5. Busy
        if state.activity.is_busy() {
            let busy = if self.is_channeling(actor) {
                MachineState::Channeling
            } else {
                MachineState::Casting
            };
            return Err(UseRejection::AlreadyBusy { state: busy });
        }

        // 6-7. Target and range
        let target = target.or_else(|| world.current_target(actor));
        if ability.requires_target {
            let handle = target.ok_or(UseRejection::NoTarget)?;
            let distance = world
                .target_distance(actor, handle)
                .ok_or(UseRejection::NoTarget)?;
            if distance > ability.range {
                return Err(UseRejection::OutOfRange {
                    distance,
                    max_range: ability.range,
                });
            }
            if ability.min_range > 0.0 && distance < ability.min_range {
                return Err(UseRejection::TooClose {
                    distance,
                    min_range: ability.min_range,
                });
            }
        }

        // 8. Resource (dry run)
        let resources = &self.systems.resources;
        if !resources.can_spend(actor, ability.resource_kind, ability.resource_cost) {
            return Err(UseRejection::InsufficientResource {
                kind: ability.resource_kind,
                required: ability.resource_cost,
                available: resources.current(actor, ability.resource_kind),
            });
        }

        // 9. Stealth
        if ability.requires_stealth && !self.systems.stealth.is_in_stealth(actor) {
            return Err(UseRejection::RequiresStealth);
        }

        // 10. Stealth entry must be possible
        if ability.enters_stealth {
            let stealth = &self.systems.stealth;
            if stealth.is_in_stealth(actor) {
                return Err(UseRejection::AlreadyInStealth);
            }
            let remaining = stealth.reentry_cooldown(actor);
            if remaining > 0.0 {
                return Err(UseRejection::StealthOnCooldown { remaining });
            }
        }

        // 11. Combo points
        if ability.consumes_combo_points && self.systems.combo.points(actor) == 0 {
            return Err(UseRejection::RequiresComboPoints);
        }

        Ok(Accepted { ability, target })
    }
}
