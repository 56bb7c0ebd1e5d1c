//! Rejections and configuration errors.
//!
//! A rejection means "the ability never started". Interruptions are not
//! rejections; they are reported through `CombatEvent`s.

use std::path::PathBuf;

use super::ability::ResourceKind;
use super::state::MachineState;

/// Why `try_use` refused a request. Variants carry enough context for a UI
/// to render a specific message.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum UseRejection {
    /// Slot index is unbound, out of range, or the actor is unknown.
    #[error("No ability in slot {slot}")]
    NoAbilityInSlot { slot: usize },

    /// Actor is stunned or silenced.
    #[error("Locked for {remaining:.1}s")]
    Locked { remaining: f32 },

    #[error("On global cooldown ({remaining:.1}s)")]
    OnGlobalCooldown { remaining: f32 },

    #[error("Ability in slot {slot} on cooldown ({remaining:.1}s)")]
    OnCooldown { slot: usize, remaining: f32 },

    /// Already casting or channeling.
    #[error("Already busy ({state:?})")]
    AlreadyBusy { state: MachineState },

    #[error("No target")]
    NoTarget,

    #[error("Out of range ({distance:.1} > {max_range:.1})")]
    OutOfRange { distance: f32, max_range: f32 },

    #[error("Too close ({distance:.1} < {min_range:.1})")]
    TooClose { distance: f32, min_range: f32 },

    #[error("Not enough {} ({available:.0}/{required:.0})", .kind.name())]
    InsufficientResource {
        kind: ResourceKind,
        required: f32,
        available: f32,
    },

    #[error("Requires stealth")]
    RequiresStealth,

    /// The ability enters stealth but the actor is already stealthed.
    #[error("Already in stealth")]
    AlreadyInStealth,

    /// The ability enters stealth but the re-entry cooldown is running.
    #[error("Cannot stealth yet ({remaining:.1}s)")]
    StealthOnCooldown { remaining: f32 },

    #[error("Requires combo points")]
    RequiresComboPoints,
}

impl UseRejection {
    /// Missing resource amount for `InsufficientResource`, zero otherwise.
    pub fn shortfall(&self) -> f32 {
        match self {
            UseRejection::InsufficientResource {
                required,
                available,
                ..
            } => (required - available).max(0.0),
            _ => 0.0,
        }
    }

    /// Rejections the spell queue may buffer: the blocker is a timer that
    /// will run out on its own.
    pub fn is_queueable(&self) -> bool {
        matches!(
            self,
            UseRejection::OnGlobalCooldown { .. } | UseRejection::AlreadyBusy { .. }
        )
    }
}

/// Errors raised while loading engine tuning, ability data or scenarios.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid ability '{id}': {reason}")]
    InvalidAbility { id: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortfall_for_insufficient_resource() {
        let rejection = UseRejection::InsufficientResource {
            kind: ResourceKind::Energy,
            required: 40.0,
            available: 25.0,
        };
        assert_eq!(rejection.shortfall(), 15.0);
        assert_eq!(rejection.to_string(), "Not enough Energy (25/40)");
    }

    #[test]
    fn test_shortfall_is_zero_for_other_rejections() {
        assert_eq!(UseRejection::NoTarget.shortfall(), 0.0);
    }

    #[test]
    fn test_only_timer_blockers_are_queueable() {
        assert!(UseRejection::OnGlobalCooldown { remaining: 0.2 }.is_queueable());
        assert!(UseRejection::AlreadyBusy {
            state: MachineState::Casting
        }
        .is_queueable());
        assert!(!UseRejection::OnCooldown { slot: 0, remaining: 0.2 }.is_queueable());
        assert!(!UseRejection::RequiresStealth.is_queueable());
    }
}
