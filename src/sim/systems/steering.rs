use glam::Vec3;

use crate::sim::agent::AgentId;
use crate::sim::Simulation;

/// Floor for distance divisions — keeps coincident agents from producing
/// infinite separation forces.
const EPS: f32 = 1e-4;
/// Acceleration cap, in multiples of the agent's current speed per second.
const MAX_ACCEL_SCALE: f32 = 4.0;
/// Fraction of the extents inside which no containment force applies.
const CONTAINMENT_MARGIN: f32 = 0.9;
/// Containment spring stiffness (force per world unit of overshoot).
const CONTAINMENT_STIFFNESS: f32 = 2.0;

/// Same-school neighbor gathered for one agent's force pass.
#[derive(Debug, Clone, Copy)]
pub struct NeighborRef {
    pub id: AgentId,
    pub pos: Vec3,
    pub vel: Vec3,
}

/// Compute weighted steering forces for every agent and integrate
/// velocity/position. Reads the snapshot cache built in the spatial phase;
/// all writes are agent-local.
pub fn update(sim: &mut Simulation, dt: f32) {
    for si in 0..sim.schools.len() {
        if sim.schools[si].retiring {
            continue;
        }
        let weights = sim.schools[si].weights;
        let bounds = sim.schools[si].bounds;
        let shared_target = sim.schools[si].shared_target;
        let school_id = sim.schools[si].id;
        let member_count = sim.schools[si].agents.len();
        let radius_sq = weights.cell_radius * weights.cell_radius;

        for mi in 0..member_count {
            let slot = sim.schools[si].agents[mi];
            let Some(agent) = sim.agents.get(slot) else {
                continue;
            };
            if agent.doomed {
                continue;
            }
            let pos = agent.position;
            let vel = agent.velocity;
            let id = agent.id;
            let speed_cap = agent.current_speed.max(EPS);
            let target_weight = agent.current_target_weight;
            let target = agent.mode_target.unwrap_or(shared_target);

            // Gather same-school neighbors, exact distance filter, then sort
            // by id: float summation isn't associative, and a stable order
            // is what makes trajectories reproducible.
            let neighbors = &mut sim.steer_scratch;
            neighbors.clear();
            {
                let snapshots = &sim.snapshots;
                sim.grid.query_neighbors(pos, weights.cell_radius, |idx| {
                    let snap = &snapshots[idx as usize];
                    if snap.school != school_id || snap.id == id {
                        return;
                    }
                    if snap.pos.distance_squared(pos) <= radius_sq {
                        neighbors.push(NeighborRef {
                            id: snap.id,
                            pos: snap.pos,
                            vel: snap.vel,
                        });
                    }
                });
            }
            neighbors.sort_unstable_by_key(|n| n.id);

            let mut accel = Vec3::ZERO;

            // Separation: push away from each neighbor, nearer ones harder.
            if !neighbors.is_empty() {
                let mut separation = Vec3::ZERO;
                let mut vel_sum = Vec3::ZERO;
                for n in neighbors.iter() {
                    let away = pos - n.pos;
                    let d = away.length().max(EPS);
                    separation += away / d;
                    vel_sum += n.vel;
                }
                accel += separation * weights.separation_weight;

                // Alignment: match the local average heading.
                let avg_vel = vel_sum / neighbors.len() as f32;
                accel += (avg_vel - vel) * weights.alignment_weight;
            }

            // Target-seeking: toward the school's wander point, or the
            // chase/flee point while in Predator/Prey mode.
            let to_target = target - pos;
            if to_target.length_squared() > EPS * EPS {
                accel += to_target.normalize() * target_weight;
            }

            // Obstacle aversion: 1/d repulsion inside the aversion range.
            for obstacle in &sim.obstacles {
                let away = pos - obstacle.position;
                let d = (away.length() - obstacle.radius).max(EPS);
                if d < weights.obstacle_aversion_distance {
                    accel += (away / away.length().max(EPS)) / d;
                }
            }

            // Soft containment: spring back once the agent crosses the
            // inner margin of its bounds. Without this the weighted sum can
            // point outward indefinitely and the school disperses.
            let inner = bounds.extents * CONTAINMENT_MARGIN;
            let offset = pos - bounds.center;
            let over = Vec3::new(
                (offset.x.abs() - inner.x).max(0.0) * offset.x.signum(),
                (offset.y.abs() - inner.y).max(0.0) * offset.y.signum(),
                (offset.z.abs() - inner.z).max(0.0) * offset.z.signum(),
            );
            accel -= over * CONTAINMENT_STIFFNESS;

            // Clamp acceleration, integrate velocity.
            accel = accel.clamp_length_max(speed_cap * MAX_ACCEL_SCALE);
            let mut new_vel = vel + accel * dt;

            // Agents with nothing pulling on them cruise along their
            // current heading instead of stalling.
            if new_vel.length_squared() < EPS * EPS {
                new_vel = if vel.length_squared() > EPS * EPS {
                    vel
                } else {
                    Vec3::X * speed_cap
                };
            }

            new_vel = new_vel.clamp_length_max(speed_cap);

            // Pitch limit: fish don't swim vertically. Clamp the vertical
            // component against the horizontal magnitude. Angles at or past
            // 90° would flip tan()'s sign and invert the clamp, so they mean
            // unrestricted pitch instead.
            let pitch_limit = weights
                .max_vertical_angle
                .clamp(0.0, std::f32::consts::FRAC_PI_2);
            if pitch_limit < std::f32::consts::FRAC_PI_2 {
                let horizontal = Vec3::new(new_vel.x, 0.0, new_vel.z).length();
                let max_y = horizontal.max(EPS) * pitch_limit.tan();
                new_vel.y = new_vel.y.clamp(-max_y, max_y);
            }

            let mut new_pos = pos + new_vel * dt;

            // Seabed clamp for bottom-dwelling species.
            if weights.seabed_bound {
                let floor = sim.seabed.sample(new_pos.x, new_pos.z);
                if new_pos.y < floor {
                    new_pos.y = floor;
                    new_vel.y = new_vel.y.max(0.0);
                }
            }

            let Some(agent) = sim.agents.get_mut(slot) else {
                continue;
            };
            if !new_pos.is_finite() || !new_vel.is_finite() {
                // Recoverable in release: hold position for one tick.
                debug_assert!(false, "non-finite agent state for {:?}", agent.id);
                log::warn!("agent {:?} produced non-finite state; skipping tick", agent.id);
                agent.prev_position = agent.position;
                agent.velocity = Vec3::ZERO;
                continue;
            }
            agent.prev_position = pos;
            agent.position = new_pos;
            agent.velocity = new_vel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::BoundsVolume;

    #[test]
    fn containment_force_points_back_inside() {
        // Mirror of the force computation for a point beyond the margin.
        let bounds = BoundsVolume {
            center: Vec3::ZERO,
            extents: Vec3::splat(10.0),
        };
        let pos = Vec3::new(12.0, 0.0, 0.0);
        let inner = bounds.extents * CONTAINMENT_MARGIN;
        let offset = pos - bounds.center;
        let over = Vec3::new(
            (offset.x.abs() - inner.x).max(0.0) * offset.x.signum(),
            (offset.y.abs() - inner.y).max(0.0) * offset.y.signum(),
            (offset.z.abs() - inner.z).max(0.0) * offset.z.signum(),
        );
        let force = -over * CONTAINMENT_STIFFNESS;
        assert!(force.x < 0.0);
        assert_eq!(force.y, 0.0);
    }
}
