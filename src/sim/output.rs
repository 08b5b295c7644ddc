use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::preset::ShaderParams;
use crate::sim::agent::Agent;
use crate::sim::school::SchoolId;
use crate::sim::Simulation;
use crate::view::{ViewSlice, MAX_VIEWS};

/// Per-agent data handed to the renderer collaborator each frame.
/// Stride = 36 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct AgentInstance {
    /// Interpolated world position.
    pub position: [f32; 3],
    /// Heading yaw in radians (around +Y).
    pub yaw: f32,
    /// Heading pitch in radians.
    pub pitch: f32,
    /// 0 = distance-culled; the renderer skips the instance entirely.
    pub enabled: u32,
    /// Bit i set = visible in view i's screen slice.
    pub view_mask: u32,
    /// Index into the school shader-parameter table for this frame.
    pub school_param_index: u32,
    pub _pad: u32,
}

impl AgentInstance {
    /// Build from an agent, interpolating between the last two ticks.
    pub fn from_agent(agent: &Agent, alpha: f32, school_param_index: u32) -> Self {
        let interp = agent.prev_position.lerp(agent.position, alpha);

        // Rotation derives from the velocity heading; an idle fish keeps
        // pointing wherever it last swam.
        let v = agent.velocity;
        let horizontal = Vec3::new(v.x, 0.0, v.z).length();
        let (yaw, pitch) = if v.length_squared() > 1e-8 {
            (v.x.atan2(v.z), v.y.atan2(horizontal))
        } else {
            (0.0, 0.0)
        };

        let mut view_mask = 0u32;
        for (i, &shown) in agent.view_mask.iter().enumerate().take(MAX_VIEWS) {
            if shown {
                view_mask |= 1 << i;
            }
        }

        Self {
            position: interp.into(),
            yaw,
            pitch,
            enabled: u32::from(agent.enabled),
            view_mask,
            school_param_index,
            _pad: 0,
        }
    }
}

/// Screen region and water clarity for one active view.
#[derive(Debug, Clone, Copy)]
pub struct ViewParams {
    pub slice: ViewSlice,
    pub turbidity: f32,
}

/// Shader parameters for every live school this frame, pass-through from
/// the presets, plus the active view layout. Instances index into `params`;
/// the renderer maps view-mask bit i onto `views[i]`'s screen slice.
#[derive(Debug, Default)]
pub struct RenderFrame {
    pub instances: Vec<AgentInstance>,
    pub params: Vec<(SchoolId, ShaderParams)>,
    pub views: Vec<ViewParams>,
}

/// Build the instance buffer, shader-param table, and view layout from the
/// live world. Buffers are reused across frames; call after a tick with the
/// accumulator's interpolation alpha.
pub fn build_frame(sim: &Simulation, alpha: f32, frame: &mut RenderFrame) {
    frame.instances.clear();
    frame.params.clear();
    frame.views.clear();
    for v in 0..sim.views.views_count() {
        frame.views.push(ViewParams {
            slice: sim.views.slice(v),
            turbidity: sim.views.turbidity[v],
        });
    }

    for school in &sim.schools {
        if school.retiring {
            continue;
        }
        let param_index = frame.params.len() as u32;
        frame.params.push((school.id, school.shader));

        for &slot in &school.agents {
            let Some(agent) = sim.agents.get(slot) else {
                continue;
            };
            if agent.doomed {
                continue;
            }
            frame
                .instances
                .push(AgentInstance::from_agent(agent, alpha, param_index));
        }
    }
}
