use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::ControlHandle;
use crate::error::{ConfigError, ControlError};
use crate::sim::Simulation;
use crate::view::MAX_VIEWS;

/// One group entry in a scene-setup file. Population and visibility are
/// fractions, not counts, so a saved scene stays valid if a preset's max
/// population changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSetup {
    pub preset: String,
    pub group: String,
    pub population_fraction: f32,
    #[serde(default)]
    pub override_habitats: Option<Vec<String>>,
    pub view_visibility: Vec<f32>,
}

/// Flat scene-setup document: everything needed to reproduce a running
/// exhibit. Round-trip (capture then apply) yields an equivalent state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSetup {
    pub location: Option<String>,
    pub views_count: usize,
    pub turbidity: Vec<f32>,
    pub groups: Vec<GroupSetup>,
}

impl SceneSetup {
    /// Snapshot the control-relevant state of a running simulation.
    pub fn capture(sim: &Simulation) -> Self {
        let views_count = sim.views.views_count();
        let groups = sim
            .groups
            .iter()
            .map(|(name, group)| GroupSetup {
                preset: group.preset.clone(),
                group: name.clone(),
                population_fraction: group.population_fraction,
                override_habitats: group.override_habitats.clone(),
                view_visibility: group.view_visibility[..views_count].to_vec(),
            })
            .collect();

        Self {
            location: sim.location_name.clone(),
            views_count,
            turbidity: sim.views.turbidity[..views_count].to_vec(),
            groups,
        }
    }

    /// Replay this setup through the control surface. Commands land at the
    /// next tick's phase 1 like any other external mutation.
    pub fn apply(&self, handle: &ControlHandle) -> Result<(), ControlError> {
        if let Some(location) = &self.location {
            handle.set_location(location)?;
        }
        handle.set_view_count(self.views_count.clamp(1, MAX_VIEWS))?;
        for (view, &value) in self.turbidity.iter().enumerate().take(MAX_VIEWS) {
            handle.set_turbidity_for_view(view, value.clamp(-1.0, 1.0))?;
        }
        for entry in &self.groups {
            match &entry.override_habitats {
                Some(habitats) => {
                    handle.spawn_entity_group_in_habitats(&entry.preset, &entry.group, habitats)?
                }
                None => handle.spawn_entity_group(&entry.preset, &entry.group)?,
            }
            handle.set_entity_group_population(
                &entry.group,
                entry.population_fraction.clamp(0.0, 1.0),
            )?;
            for (view, &fraction) in entry.view_visibility.iter().enumerate().take(MAX_VIEWS) {
                handle.set_entity_group_view_visibility(
                    &entry.group,
                    view,
                    fraction.clamp(0.0, 1.0),
                )?;
            }
        }
        Ok(())
    }

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

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_json_round_trip() {
        let scene = SceneSetup {
            location: Some("Reef".into()),
            views_count: 2,
            turbidity: vec![0.1, -0.4],
            groups: vec![GroupSetup {
                preset: "SeaBass".into(),
                group: "bass-east".into(),
                population_fraction: 0.5,
                override_habitats: Some(vec!["Kelp".into()]),
                view_visibility: vec![1.0, 0.5],
            }],
        };

        let json = serde_json::to_string(&scene).unwrap();
        let back: SceneSetup = serde_json::from_str(&json).unwrap();
        assert_eq!(back.location.as_deref(), Some("Reef"));
        assert_eq!(back.views_count, 2);
        assert_eq!(back.groups.len(), 1);
        assert_eq!(back.groups[0].view_visibility, vec![1.0, 0.5]);
    }
}
