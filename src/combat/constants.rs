//! Combat Constants
//!
//! Default tuning values for the ability engine. Every value here can be
//! overridden through `assets/config/engine.ron`; these are the fallbacks
//! used when a field is omitted.

// ============================================================================
// Global Cooldown
// ============================================================================

/// Standard global cooldown duration in seconds (WoW-style 1.5s GCD)
pub const GCD: f32 = 1.5;

// ============================================================================
// Slots & Casting
// ============================================================================

/// Number of ability slots on an action bar.
pub const DEFAULT_SLOT_COUNT: usize = 10;

/// Distance an actor may drift from its cast/channel start position before
/// the cast is interrupted. Movement exactly at the threshold does not interrupt.
pub const MOVEMENT_INTERRUPT_THRESHOLD: f32 = 0.1;

/// Requests made this close to the end of a GCD or cast are buffered
/// instead of rejected.
pub const SPELL_QUEUE_WINDOW: f32 = 0.4;

/// Tolerance used when comparing accumulated float timers against tick times.
pub const TIMER_EPSILON: f32 = 1e-4;

// ============================================================================
// Combo Points
// ============================================================================

/// Maximum combo points an actor can hold.
pub const MAX_COMBO_POINTS: u8 = 5;

/// Default damage bonus per consumed combo point (20%).
pub const DEFAULT_COMBO_POINT_MULTIPLIER: f32 = 0.2;

// ============================================================================
// Diminishing Returns
// ============================================================================

/// Length of the diminishing returns window, measured from the first
/// application inside the window.
pub const DR_WINDOW: f32 = 15.0;

/// Duration multipliers by application index within one window:
/// 100% -> 50% -> 25% -> immune.
pub const DR_LADDER: [f32; 4] = [1.0, 0.5, 0.25, 0.0];

// ============================================================================
// Crowd Control
// ============================================================================

/// Base stun duration in seconds (Cheap Shot).
pub const STUN_DURATION: f32 = 4.0;

/// Base fear duration in seconds.
pub const FEAR_DURATION: f32 = 8.0;

/// Base root duration in seconds.
pub const ROOT_DURATION: f32 = 6.0;

/// Base slow duration in seconds.
pub const SLOW_DURATION: f32 = 8.0;

// ============================================================================
// Stealth
// ============================================================================

/// Cooldown before stealth can be re-entered after it breaks.
pub const STEALTH_REENTRY_COOLDOWN: f32 = 2.0;

// ============================================================================
// Resources
// ============================================================================

/// Mana regeneration while in combat, as a fraction of max per second (0.5%).
pub const MANA_REGEN_IN_COMBAT: f32 = 0.005;

/// Mana regeneration while out of combat, as a fraction of max per second (2%).
pub const MANA_REGEN_OUT_OF_COMBAT: f32 = 0.02;

/// Energy regenerates at a flat rate regardless of combat.
pub const ENERGY_REGEN_PER_SECOND: f32 = 10.0;

/// Focus regenerates at a flat rate regardless of combat.
pub const FOCUS_REGEN_PER_SECOND: f32 = 5.0;

// ============================================================================
// Movement Directives
// ============================================================================

/// Default self-knockback distance (Disengage).
pub const DEFAULT_KNOCKBACK_DISTANCE: f32 = 15.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcd_is_standard_wow_value() {
        assert_eq!(GCD, 1.5);
    }

    #[test]
    fn test_dr_ladder_is_non_increasing_and_ends_immune() {
        for pair in DR_LADDER.windows(2) {
            assert!(pair[1] <= pair[0], "DR ladder must never increase: {:?}", DR_LADDER);
        }
        assert_eq!(DR_LADDER[DR_LADDER.len() - 1], 0.0);
    }

    #[test]
    fn test_regen_rates_are_valid() {
        assert!(MANA_REGEN_IN_COMBAT < MANA_REGEN_OUT_OF_COMBAT);
        assert!(MANA_REGEN_IN_COMBAT > 0.0 && MANA_REGEN_OUT_OF_COMBAT <= 1.0);
        assert!(ENERGY_REGEN_PER_SECOND > FOCUS_REGEN_PER_SECOND);
    }
}
