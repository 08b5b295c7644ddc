use glam::Vec3;

use crate::preset::SteeringWeights;
use crate::sim::agent::{AgentId, AgentMode};
use crate::sim::school::SchoolId;
use crate::sim::Simulation;

/// Detection range for predator/prey triggers, in perception radii.
/// The preset schema carries no explicit field for this.
const DETECTION_SCALE: f32 = 4.0;
/// Chance an expiring timer sends a cruising agent into an idle drift.
const IDLE_CHANCE: f32 = 0.15;
/// How far a fleeing agent projects its escape point, in perception radii.
const FLEE_SCALE: f32 = 6.0;

/// Speed cap for a mode, before easing.
fn mode_speed(mode: AgentMode, w: &SteeringWeights) -> f32 {
    match mode {
        AgentMode::Cruising => w.speed,
        AgentMode::Predator => w.speed * 1.6,
        AgentMode::Prey => w.speed * 1.8,
        AgentMode::Idle => w.speed * 0.25,
    }
}

/// Target weight for a mode, before easing. Chasing and fleeing lean much
/// harder on the target than ordinary wandering does.
fn mode_target_weight(mode: AgentMode, w: &SteeringWeights) -> f32 {
    match mode {
        AgentMode::Cruising => w.target_weight,
        AgentMode::Predator | AgentMode::Prey => w.target_weight * 2.5,
        AgentMode::Idle => w.target_weight * 0.2,
    }
}

/// Update shared wandering targets and every agent's mode state machine.
/// Mode is written here and nowhere else.
pub fn update(sim: &mut Simulation, dt: f32) {
    for school in &mut sim.schools {
        if !school.retiring {
            school.update_shared_target(dt, &mut sim.rng);
        }
    }

    for si in 0..sim.schools.len() {
        if sim.schools[si].retiring {
            continue;
        }
        let weights = sim.schools[si].weights;
        let member_count = sim.schools[si].agents.len();

        for mi in 0..member_count {
            let slot = sim.schools[si].agents[mi];
            let Some(agent) = sim.agents.get(slot) else {
                continue;
            };
            if agent.doomed {
                continue;
            }
            let pos = agent.position;
            let id = agent.id;
            let school_id = agent.school;
            let mode = agent.mode;

            let mut new_mode = None;
            let mut new_target = None;

            let timer_expired = agent.mode_timer - dt <= 0.0;
            if timer_expired {
                let detection = weights.cell_radius * DETECTION_SCALE;
                if weights.predator {
                    if let Some(prey_pos) = closest_flagged(sim, pos, id, school_id, detection, false)
                    {
                        new_mode = Some(AgentMode::Predator);
                        new_target = Some(prey_pos);
                    }
                }
                if new_mode.is_none() && weights.prey {
                    if let Some(threat) = closest_flagged(sim, pos, id, school_id, detection, true) {
                        let away = pos - threat;
                        let dir = if away.length_squared() > f32::EPSILON {
                            away.normalize()
                        } else {
                            Vec3::X
                        };
                        new_mode = Some(AgentMode::Prey);
                        new_target = Some(pos + dir * weights.cell_radius * FLEE_SCALE);
                    }
                }
                if new_mode.is_none() {
                    let idle = mode == AgentMode::Cruising && sim.rng.f32() < IDLE_CHANCE;
                    new_mode = Some(if idle {
                        AgentMode::Idle
                    } else {
                        AgentMode::Cruising
                    });
                }
            }

            let reseed = timer_expired.then(|| {
                weights.state_change_timer_min
                    + sim.rng.f32()
                        * (weights.state_change_timer_max - weights.state_change_timer_min).max(0.0)
            });

            let Some(agent) = sim.agents.get_mut(slot) else {
                continue;
            };
            if let Some(next) = new_mode {
                agent.mode = next;
                agent.mode_target = new_target;
            }
            agent.mode_timer = match reseed {
                Some(t) => t,
                None => agent.mode_timer - dt,
            };

            // Ease effective speed / target weight toward the mode's values
            // so transitions never pop.
            let blend = 1.0 - (-weights.state_transition_speed * dt).exp();
            let goal_speed = mode_speed(agent.mode, &weights);
            let goal_tw = mode_target_weight(agent.mode, &weights);
            agent.current_speed += (goal_speed - agent.current_speed) * blend;
            agent.current_target_weight += (goal_tw - agent.current_target_weight) * blend;
        }
    }
}

/// Closest agent from another school carrying the requested flag, within
/// `radius` of `pos`. Ties break toward the lower agent id so repeated runs
/// pick the same quarry.
fn closest_flagged(
    sim: &mut Simulation,
    pos: Vec3,
    self_id: AgentId,
    self_school: SchoolId,
    radius: f32,
    want_predator: bool,
) -> Option<Vec3> {
    let snapshots = &sim.snapshots;
    let radius_sq = radius * radius;
    let mut best: Option<(f32, AgentId, Vec3)> = None;

    sim.grid.query_neighbors(pos, radius, |idx| {
        let snap = &snapshots[idx as usize];
        let flagged = if want_predator {
            snap.predator
        } else {
            snap.prey
        };
        if !flagged || snap.id == self_id || snap.school == self_school {
            return;
        }
        let d_sq = snap.pos.distance_squared(pos);
        if d_sq > radius_sq {
            return;
        }
        let candidate = (d_sq, snap.id, snap.pos);
        best = match best {
            None => Some(candidate),
            Some(current) => {
                if (d_sq, snap.id) < (current.0, current.1) {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    });

    best.map(|(_, _, p)| p)
}
