//! Data-Driven Ability Configuration
//!
//! Ability definitions are loaded from `assets/config/abilities.ron` instead
//! of being hardcoded, so balance changes don't require recompilation.
//!
//! ## Usage
//! ```ignore
//! let library = load_ability_library("assets/config/abilities.ron")?;
//! let fireball = library.get("fireball").expect("fireball is defined");
//! println!("Fireball cast time: {}", fireball.cast_time);
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::ability::AbilityDefinition;
use super::error::ConfigError;

/// Default location of the ability data file.
pub const DEFAULT_ABILITIES_PATH: &str = "assets/config/abilities.ron";

/// Root structure for the abilities.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct AbilitiesConfig {
    pub abilities: BTreeMap<String, AbilityDefinition>,
}

/// Every authored ability, keyed by id.
///
/// Definitions are shared as `Arc`s so loadouts can hold them without
/// copying the whole definition per actor.
#[derive(Resource, Debug, Clone, Default)]
pub struct AbilityLibrary {
    definitions: BTreeMap<String, Arc<AbilityDefinition>>,
}

impl AbilityLibrary {
    /// Build a library from a parsed config, validating every entry.
    ///
    /// The map key is authoritative: an entry's `id` field is overwritten
    /// with its key.
    pub fn from_config(config: AbilitiesConfig) -> Result<Self, ConfigError> {
        let mut definitions = BTreeMap::new();
        for (id, mut definition) in config.abilities {
            definition.id = id.clone();
            definition
                .validate()
                .map_err(|reason| ConfigError::InvalidAbility {
                    id: id.clone(),
                    reason,
                })?;
            definitions.insert(id, Arc::new(definition));
        }
        Ok(Self { definitions })
    }

    /// Parse and validate a RON document. `origin` only labels errors.
    pub fn from_ron_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: AbilitiesConfig = ron::from_str(contents).map_err(|source| ConfigError::Ron {
            path: origin.to_path_buf(),
            source,
        })?;
        Self::from_config(config)
    }

    /// Add or replace a single definition after validating it.
    pub fn insert(&mut self, definition: AbilityDefinition) -> Result<(), ConfigError> {
        definition
            .validate()
            .map_err(|reason| ConfigError::InvalidAbility {
                id: definition.id.clone(),
                reason,
            })?;
        self.definitions
            .insert(definition.id.clone(), Arc::new(definition));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<AbilityDefinition>> {
        self.definitions.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    /// Ability ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Load ability definitions from a RON file
pub fn load_ability_library(path: impl AsRef<Path>) -> Result<AbilityLibrary, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let library = AbilityLibrary::from_ron_str(&contents, path)?;

    info!(
        "Loaded {} ability definitions from {}",
        library.len(),
        path.display()
    );

    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"(
        abilities: {
            "shadow_bolt": (
                name: "Shadow Bolt",
                cast_time: 2.5,
                resource_cost: 20.0,
                damage_min: 30.0,
                damage_max: 40.0,
                damage_type: Shadow,
            ),
            "drain_life": (
                name: "Drain Life",
                channel: Some((duration: 5.0, tick_interval: 1.0)),
                heal_on_damage_percent: 0.5,
            ),
        },
    )"#;

    #[test]
    fn test_key_overrides_id() {
        let library = AbilityLibrary::from_ron_str(SAMPLE, Path::new("sample.ron"))
            .expect("sample parses");
        let bolt = library.get("shadow_bolt").expect("shadow_bolt present");
        assert_eq!(bolt.id, "shadow_bolt");
        assert_eq!(bolt.cast_time, 2.5);
        assert!(bolt.affected_by_gcd, "omitted GCD flag defaults to true");
    }

    #[test]
    fn test_channel_parses_with_ticks() {
        let library = AbilityLibrary::from_ron_str(SAMPLE, Path::new("sample.ron"))
            .expect("sample parses");
        let drain = library.get("drain_life").expect("drain_life present");
        assert_eq!(drain.total_ticks(), 5);
        assert!(drain.heals_on_damage());
    }

    #[test]
    fn test_invalid_definition_is_rejected_with_its_id() {
        let bad = r#"(abilities: { "broken": (name: "Broken", channel: Some((duration: 3.0, tick_interval: 0.0))) })"#;
        let err = AbilityLibrary::from_ron_str(bad, Path::new("bad.ron"))
            .expect_err("zero tick interval must fail");
        assert!(
            matches!(err, ConfigError::InvalidAbility { ref id, .. } if id == "broken"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = AbilityLibrary::from_ron_str("(abilities: {", Path::new("truncated.ron"))
            .expect_err("truncated document must fail");
        assert!(err.to_string().contains("truncated.ron"));
    }
}
