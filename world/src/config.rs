//! Tunable simulation parameters loaded from TOML.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tileworld_core::EntityKind;
use tileworld_system_behavior::{BehaviorProfile, ProfileOverrides};
use tileworld_system_pathfinding::Adjacency;

const DEFAULT_SEED: u64 = 0x5eed_7117_ea51_2024;
const DEFAULT_CORNER_MARGIN: f32 = 1.0;
const DEFAULT_STALL_LIMIT: u32 = 8;

/// Reasons a simulation configuration may be rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be decoded.
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The mesh corner margin was negative or not finite.
    #[error("corner margin {0} must be finite and non-negative")]
    InvalidCornerMargin(f32),
    /// The stall limit was zero.
    #[error("stall limit must be at least one tick")]
    InvalidStallLimit,
    /// A behaviour profile carried an unusable parameter.
    #[error("{field} of the {kind:?} profile must be finite and non-negative")]
    InvalidProfile {
        /// Kind whose profile was rejected.
        kind: EntityKind,
        /// Name of the offending parameter.
        field: &'static str,
    },
}

/// Parameters shared by every level loaded into a world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed of the random generator used to pick wander goals.
    pub seed: u64,
    /// Tile adjacency used by the path planner.
    pub adjacency: Adjacency,
    /// Distance mesh corners are pushed away from their walls.
    pub corner_margin: f32,
    /// Consecutive blocked ticks after which an agent abandons its path.
    pub stall_limit: u32,
    /// Behaviour of the player.
    #[serde(deserialize_with = "player_profile")]
    pub player: BehaviorProfile,
    /// Behaviour of pedestrians.
    #[serde(deserialize_with = "pedestrian_profile")]
    pub pedestrian: BehaviorProfile,
    /// Behaviour of props.
    #[serde(deserialize_with = "prop_profile")]
    pub prop: BehaviorProfile,
}

fn player_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BehaviorProfile, D::Error> {
    ProfileOverrides::deserialize(deserializer)
        .map(|overrides| overrides.apply(BehaviorProfile::player()))
}

fn pedestrian_profile<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BehaviorProfile, D::Error> {
    ProfileOverrides::deserialize(deserializer)
        .map(|overrides| overrides.apply(BehaviorProfile::pedestrian()))
}

fn prop_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BehaviorProfile, D::Error> {
    ProfileOverrides::deserialize(deserializer)
        .map(|overrides| overrides.apply(BehaviorProfile::prop()))
}

impl SimulationConfig {
    /// Decodes and validates a configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every parameter lies in its usable range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.corner_margin.is_finite() || self.corner_margin < 0.0 {
            return Err(ConfigError::InvalidCornerMargin(self.corner_margin));
        }
        if self.stall_limit == 0 {
            return Err(ConfigError::InvalidStallLimit);
        }
        for kind in [EntityKind::Player, EntityKind::Pedestrian, EntityKind::Prop] {
            if let Some(field) = self.profile(kind).invalid_field() {
                return Err(ConfigError::InvalidProfile { kind, field });
            }
        }
        Ok(())
    }

    /// Behaviour profile that applies to the provided kind.
    #[must_use]
    pub const fn profile(&self, kind: EntityKind) -> &BehaviorProfile {
        match kind {
            EntityKind::Player => &self.player,
            EntityKind::Pedestrian => &self.pedestrian,
            EntityKind::Prop => &self.prop,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            adjacency: Adjacency::default(),
            corner_margin: DEFAULT_CORNER_MARGIN,
            stall_limit: DEFAULT_STALL_LIMIT,
            player: BehaviorProfile::player(),
            pedestrian: BehaviorProfile::pedestrian(),
            prop: BehaviorProfile::prop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SimulationConfig::from_toml_str("").expect("defaults are valid");

        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn nested_profiles_override_selected_fields() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7
            adjacency = "eight"

            [pedestrian]
            speed = 1.5
            "#,
        )
        .expect("valid config");

        assert_eq!(config.seed, 7);
        assert_eq!(config.adjacency, Adjacency::Eight);
        assert_eq!(config.pedestrian.speed, 1.5);
        assert_eq!(
            config.pedestrian.personal_space,
            BehaviorProfile::pedestrian().personal_space
        );
        assert_eq!(config.player, BehaviorProfile::player());
        assert_eq!(config.prop, BehaviorProfile::prop());
    }

    #[test]
    fn partial_player_and_prop_tables_keep_their_own_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [player]
            speed = 6.0

            [prop]
            speed = 0.0
            "#,
        )
        .expect("valid config");

        assert_eq!(
            config.player,
            BehaviorProfile {
                speed: 6.0,
                ..BehaviorProfile::player()
            }
        );
        assert!(!config.player.autonomous);
        assert!(!config.player.wanders);
        assert_eq!(config.prop, BehaviorProfile::prop());
        assert!(!config.prop.autonomous);
    }

    #[test]
    fn serialized_config_round_trips_through_toml() {
        let config = SimulationConfig {
            seed: 3,
            player: BehaviorProfile {
                speed: 5.0,
                ..BehaviorProfile::player()
            },
            ..SimulationConfig::default()
        };

        let source = toml::to_string(&config).expect("serializes");

        assert_eq!(SimulationConfig::from_toml_str(&source).expect("decodes"), config);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = SimulationConfig::from_toml_str("tick_rate = 60").unwrap_err();

        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            SimulationConfig::from_toml_str("corner_margin = -2.0"),
            Err(ConfigError::InvalidCornerMargin(_))
        ));
        assert!(matches!(
            SimulationConfig::from_toml_str("stall_limit = 0"),
            Err(ConfigError::InvalidStallLimit)
        ));
        assert!(matches!(
            SimulationConfig::from_toml_str("[prop]\narrival_threshold = -1.0"),
            Err(ConfigError::InvalidProfile {
                kind: EntityKind::Prop,
                field: "arrival_threshold"
            })
        ));
    }
}
