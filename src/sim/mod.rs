pub mod agent;
pub mod lifecycle;
pub mod output;
pub mod school;
pub mod systems;

use std::collections::{BTreeMap, HashSet};

use crossbeam_channel::Receiver;
use glam::Vec3;

use crate::command::{self, ControlCommand, ControlHandle};
use crate::debug::timer::SystemTimers;
use crate::location::{LocationTable, Obstacle};
use crate::preset::PresetTable;
use crate::seabed::SeabedGrid;
use crate::sim::agent::AgentArena;
use crate::sim::lifecycle::{EntityGroup, PendingSpawn};
use crate::sim::school::School;
use crate::sim::systems::spatial::AgentSnapshot;
use crate::sim::systems::steering::NeighborRef;
use crate::spatial::SpatialHash;
use crate::view::ViewConfig;

/// Initial spatial hash cell size, replaced by the widest school
/// perception radius once schools exist.
const DEFAULT_CELL_SIZE: f32 = 4.0;
/// Spatial hash table size (prime-ish for good distribution).
const SPATIAL_TABLE_SIZE: usize = 4096;
/// Arena capacity hint — a busy exhibit runs a few thousand fish.
const INITIAL_AGENT_CAPACITY: usize = 4096;

/// Collaborator-supplied per-frame inputs.
#[derive(Debug, Clone, Copy)]
pub struct TickInputs {
    /// Fixed timestep in seconds.
    pub dt: f32,
    /// Active camera, world space — drives distance culling.
    pub camera_position: Vec3,
}

/// The whole simulated world: agents, schools, groups, derived indices,
/// and the queue external surfaces mutate it through. One instance per
/// running exhibit; ticked by a single thread.
pub struct Simulation {
    // Static configuration, injected — no global managers.
    pub presets: PresetTable,
    pub locations: LocationTable,

    // Current location state.
    pub location_name: Option<String>,
    pub obstacles: Vec<Obstacle>,
    pub seabed: SeabedGrid,

    // Views and camera.
    pub views: ViewConfig,
    pub camera_position: Vec3,

    // Entities. Groups are in a BTreeMap so every iteration order in the
    // tick is reproducible.
    pub agents: AgentArena,
    pub schools: Vec<School>,
    pub groups: BTreeMap<String, EntityGroup>,
    pub(crate) next_school_id: u32,

    // Asset gate.
    pub(crate) ready_presets: HashSet<String>,
    pub(crate) pending_spawns: Vec<PendingSpawn>,

    // Derived per-tick state, pre-allocated and reused.
    pub(crate) grid: SpatialHash,
    pub(crate) snapshots: Vec<AgentSnapshot>,
    pub(crate) steer_scratch: Vec<NeighborRef>,

    // Determinism: one seeded RNG drives every random draw in the tick.
    pub(crate) rng: fastrand::Rng,

    receiver: Receiver<ControlCommand>,
    pub timers: SystemTimers,
    pub tick_count: u64,
}

impl Simulation {
    /// Build a simulation plus the handle control surfaces enqueue
    /// through. The seed fixes every random draw — identical seeds and
    /// command sequences give bit-identical trajectories.
    pub fn new(presets: PresetTable, locations: LocationTable, seed: u64) -> (Self, ControlHandle) {
        let (sender, receiver) = command::command_queue();
        let sim = Self {
            presets,
            locations,
            location_name: None,
            obstacles: Vec::new(),
            seabed: SeabedGrid::flat(f32::MIN),
            views: ViewConfig::default(),
            camera_position: Vec3::ZERO,
            agents: AgentArena::with_capacity(INITIAL_AGENT_CAPACITY),
            schools: Vec::new(),
            groups: BTreeMap::new(),
            next_school_id: 0,
            ready_presets: HashSet::new(),
            pending_spawns: Vec::new(),
            grid: SpatialHash::new(DEFAULT_CELL_SIZE, SPATIAL_TABLE_SIZE),
            snapshots: Vec::with_capacity(INITIAL_AGENT_CAPACITY),
            steer_scratch: Vec::with_capacity(64),
            rng: fastrand::Rng::with_seed(seed),
            receiver,
            timers: SystemTimers::new(),
            tick_count: 0,
        };
        (sim, ControlHandle::new(sender))
    }

    /// Advance one fixed tick: drain commands, rebuild indices, run
    /// behavior/steering/culling, reap.
    pub fn tick(&mut self, inputs: &TickInputs) {
        systems::tick(self, inputs);
    }

    /// Phase 1: apply everything queued since the last tick.
    pub(crate) fn drain_commands(&mut self) {
        let receiver = self.receiver.clone();
        command::drain(&receiver, |cmd| self.apply_command(cmd));
    }

    fn apply_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::SetLocation(name) => {
                if let Err(err) = lifecycle::set_location(self, &name) {
                    log::error!("SetLocation('{name}') failed: {err}");
                }
            }
            ControlCommand::SetViewCount(n) => {
                self.views.set_views_count(n);
            }
            ControlCommand::SetTurbidityForView { view, value } => {
                self.views.turbidity[view] = value;
            }
            ControlCommand::SpawnEntityGroup { preset, group } => {
                if let Err(err) = lifecycle::spawn_group(self, &preset, &group, None) {
                    log::error!("SpawnEntityGroup('{group}') failed: {err}");
                }
            }
            ControlCommand::SpawnEntityGroupInHabitats {
                preset,
                group,
                habitats,
            } => {
                if let Err(err) = lifecycle::spawn_group(self, &preset, &group, Some(habitats)) {
                    log::error!("SpawnEntityGroupInHabitats('{group}') failed: {err}");
                }
            }
            ControlCommand::SetEntityGroupPopulation { group, fraction } => {
                lifecycle::set_population(self, &group, fraction);
            }
            ControlCommand::SetEntityGroupViewVisibility {
                group,
                view,
                fraction,
            } => {
                lifecycle::set_view_visibility(self, &group, view, fraction);
            }
            ControlCommand::RemoveEntityGroup(group) => {
                lifecycle::delete_group(self, &group);
            }
            ControlCommand::NotifyAssetsReady(preset) => {
                lifecycle::notify_assets_ready(self, &preset);
            }
        }
    }

    /// Live agents across all schools.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Current population of a group, summed over its schools.
    pub fn group_population(&self, group_name: &str) -> usize {
        let Some(group) = self.groups.get(group_name) else {
            return 0;
        };
        group
            .schools
            .iter()
            .filter_map(|id| self.schools.iter().find(|s| s.id == *id))
            .map(|s| s.agents.len())
            .sum()
    }
}
