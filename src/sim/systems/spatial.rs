use glam::Vec3;

use crate::sim::agent::AgentId;
use crate::sim::school::SchoolId;
use crate::sim::Simulation;

/// Flat copy of the per-agent state the read phases need.
/// Rebuilt alongside the grid so steering never touches the arena for
/// neighbor data.
#[derive(Debug, Clone, Copy)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub school: SchoolId,
    pub pos: Vec3,
    pub vel: Vec3,
    /// School-level flags, denormalized so detection scans stay flat.
    pub predator: bool,
    pub prey: bool,
}

/// Rebuild the spatial hash and snapshot cache from current positions.
/// Grid entries are snapshot indices. Doomed agents are excluded — they
/// stop influencing neighbors the tick they are marked.
pub fn rebuild(sim: &mut Simulation) {
    // Cell size follows the widest perception radius among live schools.
    let mut cell = 0.0f32;
    for school in &sim.schools {
        if !school.retiring {
            cell = cell.max(school.weights.cell_radius);
        }
    }
    if cell > 0.0 && (cell - sim.grid.cell_size()).abs() > f32::EPSILON {
        sim.grid.set_cell_size(cell);
    }

    sim.grid.clear();
    sim.snapshots.clear();

    for school in &sim.schools {
        if school.retiring {
            continue;
        }
        let predator = school.weights.predator;
        let prey = school.weights.prey;
        for &slot in &school.agents {
            let Some(agent) = sim.agents.get(slot) else {
                continue;
            };
            if agent.doomed {
                continue;
            }
            let idx = sim.snapshots.len() as u32;
            sim.snapshots.push(AgentSnapshot {
                id: agent.id,
                school: school.id,
                pos: agent.position,
                vel: agent.velocity,
                predator,
                prey,
            });
            sim.grid.insert(agent.position, idx);
        }
    }
}
