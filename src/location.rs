use std::collections::HashMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::seabed::SeabedGrid;

/// Axis-aligned region a school is confined to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundsVolume {
    pub center: Vec3,
    /// Half-sizes along each axis.
    pub extents: Vec3,
}

impl BoundsVolume {
    pub fn contains(&self, p: Vec3) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.extents.x && d.y <= self.extents.y && d.z <= self.extents.z
    }
}

/// Static avoidance point. Destroyed with the location that owns it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Vec3,
    pub radius: f32,
}

/// One dive site: named habitats with their bounds volumes, the location's
/// obstacle geometry, and its seabed heightmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Habitat name -> bounds volumes valid for that habitat.
    pub habitats: HashMap<String, Vec<BoundsVolume>>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    pub seabed: SeabedGrid,
}

impl Location {
    /// Collect the bounds volumes for a habitat list, in list order.
    /// Unknown habitat names contribute nothing (the group-level emptiness
    /// check catches a fully-bogus list).
    pub fn bounds_for_habitats(&self, habitats: &[String]) -> Vec<BoundsVolume> {
        let mut out = Vec::new();
        for name in habitats {
            if let Some(volumes) = self.habitats.get(name) {
                out.extend_from_slice(volumes);
            }
        }
        out
    }
}

/// All locations keyed by name, loaded from one JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationTable {
    pub locations: HashMap<String, Location>,
}

impl LocationTable {
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

    pub fn get(&self, name: &str) -> Result<&Location, ConfigError> {
        self.locations
            .get(name)
            .ok_or_else(|| ConfigError::LocationNotFound(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reef_location() -> Location {
        let mut habitats = HashMap::new();
        habitats.insert(
            "Reef".to_owned(),
            vec![BoundsVolume {
                center: Vec3::new(0.0, -10.0, 0.0),
                extents: Vec3::splat(25.0),
            }],
        );
        habitats.insert(
            "Kelp".to_owned(),
            vec![
                BoundsVolume {
                    center: Vec3::new(60.0, -15.0, 0.0),
                    extents: Vec3::new(10.0, 20.0, 10.0),
                },
                BoundsVolume {
                    center: Vec3::new(-60.0, -15.0, 0.0),
                    extents: Vec3::new(10.0, 20.0, 10.0),
                },
            ],
        );
        Location {
            habitats,
            obstacles: vec![],
            seabed: SeabedGrid::flat(-30.0),
        }
    }

    #[test]
    fn location_json_round_trip() {
        let loc = reef_location();
        let json = serde_json::to_string(&loc).unwrap();
        let back: Location = serde_json::from_str(&json).unwrap();
        let bounds = back.bounds_for_habitats(&["Reef".into()]);
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0].center, Vec3::new(0.0, -10.0, 0.0));
        assert_eq!(bounds[0].extents, Vec3::splat(25.0));
    }

    #[test]
    fn bounds_lookup_preserves_habitat_order() {
        let loc = reef_location();
        let bounds = loc.bounds_for_habitats(&["Kelp".into(), "Reef".into()]);
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0].center.x, 60.0);
        assert_eq!(bounds[2].center.x, 0.0);
    }

    #[test]
    fn unknown_habitats_contribute_nothing() {
        let loc = reef_location();
        assert!(loc.bounds_for_habitats(&["Abyss".into()]).is_empty());
    }

    #[test]
    fn contains_is_inclusive_of_faces() {
        let b = BoundsVolume {
            center: Vec3::ZERO,
            extents: Vec3::splat(5.0),
        };
        assert!(b.contains(Vec3::new(5.0, 0.0, 0.0)));
        assert!(!b.contains(Vec3::new(5.01, 0.0, 0.0)));
    }
}
