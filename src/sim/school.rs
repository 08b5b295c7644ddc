use glam::Vec3;

use crate::location::BoundsVolume;
use crate::preset::{ShaderParams, SteeringWeights};

/// Stable school identifier — monotonic, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchoolId(pub u32);

/// How long a shared wandering target lives before being re-rolled, seconds.
const TARGET_LIFETIME_MIN: f32 = 4.0;
const TARGET_LIFETIME_MAX: f32 = 12.0;

/// One spawned instance of a dynamic preset, bound to one bounds volume.
/// Agents of a school flock only with each other and share its wandering
/// target; the weights are read-only after spawn.
#[derive(Debug, Clone)]
pub struct School {
    pub id: SchoolId,
    /// Owning entity group, by name (the control surface's key).
    pub group: String,
    pub bounds: BoundsVolume,
    pub weights: SteeringWeights,
    pub shader: ShaderParams,
    pub max_distance: f32,
    /// Target population; lifecycle converges `agents.len()` toward it.
    pub requested_population: u32,
    /// Slot indices of live member agents, spawn order. This order is the
    /// "stable agent index" the view culler partitions on.
    pub agents: Vec<u32>,
    pub shared_target: Vec3,
    pub shared_target_timer: f32,
    /// Marked on location change; reaped (with all members) next tick.
    pub retiring: bool,
}

impl School {
    pub fn new(
        id: SchoolId,
        group: &str,
        bounds: BoundsVolume,
        weights: SteeringWeights,
        shader: ShaderParams,
        max_distance: f32,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let shared_target = random_point_in(&bounds, rng);
        Self {
            id,
            group: group.to_owned(),
            bounds,
            weights,
            shader,
            max_distance,
            requested_population: 0,
            agents: Vec::new(),
            shared_target,
            shared_target_timer: TARGET_LIFETIME_MIN
                + rng.f32() * (TARGET_LIFETIME_MAX - TARGET_LIFETIME_MIN),
            retiring: false,
        }
    }

    /// Count down the wander timer; at zero pick a fresh target inside the
    /// bounds and reseed.
    pub fn update_shared_target(&mut self, dt: f32, rng: &mut fastrand::Rng) {
        self.shared_target_timer -= dt;
        if self.shared_target_timer <= 0.0 {
            self.shared_target = random_point_in(&self.bounds, rng);
            self.shared_target_timer = TARGET_LIFETIME_MIN
                + rng.f32() * (TARGET_LIFETIME_MAX - TARGET_LIFETIME_MIN);
        }
    }
}

/// Uniform random point inside a bounds volume.
pub fn random_point_in(bounds: &BoundsVolume, rng: &mut fastrand::Rng) -> Vec3 {
    let r = Vec3::new(
        rng.f32() * 2.0 - 1.0,
        rng.f32() * 2.0 - 1.0,
        rng.f32() * 2.0 - 1.0,
    );
    bounds.center + r * bounds.extents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::SteeringWeights;

    fn unit_school(rng: &mut fastrand::Rng) -> School {
        School::new(
            SchoolId(1),
            "reef-fish",
            BoundsVolume {
                center: Vec3::new(10.0, -5.0, 3.0),
                extents: Vec3::splat(8.0),
            },
            SteeringWeights::default(),
            Default::default(),
            100.0,
            rng,
        )
    }

    #[test]
    fn wander_target_stays_inside_bounds() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut school = unit_school(&mut rng);
        for _ in 0..200 {
            // Force frequent re-rolls.
            school.update_shared_target(100.0, &mut rng);
            assert!(school.bounds.contains(school.shared_target));
        }
    }

    #[test]
    fn target_holds_until_timer_expires() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut school = unit_school(&mut rng);
        let before = school.shared_target;
        school.update_shared_target(0.01, &mut rng);
        assert_eq!(before, school.shared_target);
    }
}
