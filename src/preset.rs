use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Steering parameters for one species. Immutable once a school is spawned;
/// the steering system only ever reads these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringWeights {
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub target_weight: f32,
    /// Obstacles closer than this repel the agent.
    pub obstacle_aversion_distance: f32,
    /// Neighbor perception radius; also sizes the spatial cells.
    pub cell_radius: f32,
    /// Cruising speed cap (world units per second).
    pub speed: f32,
    /// Max pitch angle in radians — fish don't swim straight up.
    pub max_vertical_angle: f32,
    /// Clamp world Y to the seabed height under the agent.
    pub seabed_bound: bool,
    pub predator: bool,
    pub prey: bool,
    /// How fast speed/target-weight ease toward a new mode's values (1/s).
    pub state_transition_speed: f32,
    pub state_change_timer_min: f32,
    pub state_change_timer_max: f32,
}

impl Default for SteeringWeights {
    fn default() -> Self {
        Self {
            separation_weight: 1.0,
            alignment_weight: 1.0,
            target_weight: 0.5,
            obstacle_aversion_distance: 4.0,
            cell_radius: 3.0,
            speed: 2.0,
            max_vertical_angle: 0.5,
            seabed_bound: false,
            predator: false,
            prey: false,
            state_transition_speed: 2.0,
            state_change_timer_min: 3.0,
            state_change_timer_max: 8.0,
        }
    }
}

/// Whether a preset spawns moving schools or a static placement
/// (flora, anemones — position set once, only visibility toggles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetKind {
    Dynamic,
    Static,
}

/// Animation/shader overrides passed through to the renderer untouched.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderParams {
    pub swim_cycle_speed: f32,
    pub swim_amplitude: f32,
    pub tint: [f32; 3],
}

/// One species entry from the preset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPreset {
    pub kind: PresetKind,
    /// Population at fraction 1.0. Requested counts are fractions of this.
    pub max_population: u32,
    /// Distance-culling radius around the camera.
    pub max_distance: f32,
    /// Habitats this species spawns into when none are overridden.
    pub habitats: Vec<String>,
    #[serde(default)]
    pub weights: SteeringWeights,
    #[serde(default)]
    pub shader: ShaderParams,
}

/// All presets, keyed by name. Loaded once at startup and passed in by
/// reference — no global preset manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetTable {
    pub presets: HashMap<String, EntityPreset>,
}

impl PresetTable {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Result<&EntityPreset, ConfigError> {
        self.presets
            .get(name)
            .ok_or_else(|| ConfigError::PresetNotFound(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_json_round_trip() {
        let mut table = PresetTable::default();
        table.presets.insert(
            "SeaBass".into(),
            EntityPreset {
                kind: PresetKind::Dynamic,
                max_population: 200,
                max_distance: 120.0,
                habitats: vec!["Reef".into()],
                weights: SteeringWeights {
                    predator: false,
                    prey: true,
                    ..SteeringWeights::default()
                },
                shader: ShaderParams {
                    swim_cycle_speed: 1.2,
                    swim_amplitude: 0.4,
                    tint: [0.6, 0.7, 0.9],
                },
            },
        );

        let json = serde_json::to_string(&table).unwrap();
        let back: PresetTable = serde_json::from_str(&json).unwrap();
        let preset = back.get("SeaBass").unwrap();
        assert_eq!(preset.max_population, 200);
        assert!(preset.weights.prey);
    }

    #[test]
    fn missing_preset_is_an_error() {
        let table = PresetTable::default();
        assert!(matches!(
            table.get("Kraken"),
            Err(ConfigError::PresetNotFound(_))
        ));
    }

    #[test]
    fn partial_weights_fill_defaults() {
        let json = r#"{
            "Anthias": {
                "kind": "dynamic",
                "max_population": 500,
                "max_distance": 80.0,
                "habitats": ["Reef"],
                "weights": { "speed": 3.5 }
            }
        }"#;
        let table: PresetTable = serde_json::from_str(json).unwrap();
        let preset = table.get("Anthias").unwrap();
        assert_eq!(preset.weights.speed, 3.5);
        assert_eq!(preset.weights.separation_weight, 1.0);
    }
}
