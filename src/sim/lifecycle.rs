use glam::Vec3;

use crate::error::ConfigError;
use crate::location::BoundsVolume;
use crate::preset::{EntityPreset, PresetKind};
use crate::sim::agent::{Agent, AgentMode};
use crate::sim::school::{random_point_in, School, SchoolId};
use crate::sim::Simulation;
use crate::view::MAX_VIEWS;

/// Max spawns or destroys per school per tick — population changes ramp
/// instead of spiking a frame.
pub const POPULATION_BATCH: usize = 32;

/// Whether a group owns moving schools or one static placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Dynamic,
    Static,
}

impl From<PresetKind> for GroupKind {
    fn from(kind: PresetKind) -> Self {
        match kind {
            PresetKind::Dynamic => GroupKind::Dynamic,
            PresetKind::Static => GroupKind::Static,
        }
    }
}

/// A named collection of schools (dynamic) or one static placement, as the
/// control API sees it. Owns its schools; deleting the group dooms them.
#[derive(Debug, Clone)]
pub struct EntityGroup {
    pub preset: String,
    pub kind: GroupKind,
    /// Requested population as a fraction of the preset's max. Fractional
    /// so scene files stay valid across preset cap changes.
    pub population_fraction: f32,
    pub view_visibility: [f32; MAX_VIEWS],
    /// Habitats chosen at spawn time, when they override the preset's.
    pub override_habitats: Option<Vec<String>>,
    pub schools: Vec<SchoolId>,
    /// Derived per-view booleans for static groups.
    pub static_view_mask: [bool; MAX_VIEWS],
}

/// A spawn held back until the owning preset's assets load.
#[derive(Debug, Clone)]
pub struct PendingSpawn {
    pub preset: String,
    pub group: String,
    pub habitats: Option<Vec<String>>,
}

/// Spawn an entity group. Fully validates first — on error nothing was
/// created. Spawns for presets whose assets are not yet ready are deferred,
/// not rejected.
pub fn spawn_group(
    sim: &mut Simulation,
    preset_name: &str,
    group_name: &str,
    habitats: Option<Vec<String>>,
) -> Result<(), ConfigError> {
    // Preset existence is checkable immediately.
    sim.presets.get(preset_name)?;

    if sim.groups.contains_key(group_name)
        || sim.pending_spawns.iter().any(|p| p.group == group_name)
    {
        return Err(ConfigError::DuplicateGroup(group_name.to_owned()));
    }

    if !sim.ready_presets.contains(preset_name) {
        log::info!("assets for '{preset_name}' not ready; deferring spawn of '{group_name}'");
        sim.pending_spawns.push(PendingSpawn {
            preset: preset_name.to_owned(),
            group: group_name.to_owned(),
            habitats,
        });
        return Ok(());
    }

    spawn_group_now(sim, preset_name, group_name, habitats)
}

fn spawn_group_now(
    sim: &mut Simulation,
    preset_name: &str,
    group_name: &str,
    habitats: Option<Vec<String>>,
) -> Result<(), ConfigError> {
    let preset = sim.presets.get(preset_name)?.clone();
    let kind = GroupKind::from(preset.kind);

    let mut group = EntityGroup {
        preset: preset_name.to_owned(),
        kind,
        population_fraction: 0.0,
        view_visibility: [1.0; MAX_VIEWS],
        override_habitats: habitats,
        schools: Vec::new(),
        static_view_mask: [false; MAX_VIEWS],
    };

    if kind == GroupKind::Dynamic {
        let bounds = resolve_bounds(sim, &preset, group_name, group.override_habitats.as_deref())?;
        group.schools = create_schools(sim, group_name, &preset, &bounds);
    }

    log::info!(
        "spawned group '{group_name}' (preset '{preset_name}', {} schools)",
        group.schools.len()
    );
    sim.groups.insert(group_name.to_owned(), group);
    Ok(())
}

/// Bounds volumes for a group in the current location. Errors if the
/// habitat list is empty or resolves to nothing — a school with zero
/// bounds volumes is an invariant violation waiting to happen.
fn resolve_bounds(
    sim: &Simulation,
    preset: &EntityPreset,
    group_name: &str,
    override_habitats: Option<&[String]>,
) -> Result<Vec<BoundsVolume>, ConfigError> {
    let habitats: Vec<String> = match override_habitats {
        Some(list) => list.to_vec(),
        None => preset.habitats.clone(),
    };
    if habitats.is_empty() {
        return Err(ConfigError::EmptyHabitatList {
            group: group_name.to_owned(),
        });
    }

    let location_name = sim
        .location_name
        .as_deref()
        .ok_or_else(|| ConfigError::LocationNotFound("<no location loaded>".to_owned()))?;
    let location = sim.locations.get(location_name)?;

    let bounds = location.bounds_for_habitats(&habitats);
    if bounds.is_empty() {
        return Err(ConfigError::EmptyBoundsList {
            group: group_name.to_owned(),
            habitats,
        });
    }
    Ok(bounds)
}

/// One school per bounds volume, each with its own wandering target.
fn create_schools(
    sim: &mut Simulation,
    group_name: &str,
    preset: &EntityPreset,
    bounds: &[BoundsVolume],
) -> Vec<SchoolId> {
    let mut ids = Vec::with_capacity(bounds.len());
    for &volume in bounds {
        let id = SchoolId(sim.next_school_id);
        sim.next_school_id += 1;
        sim.schools.push(School::new(
            id,
            group_name,
            volume,
            preset.weights,
            preset.shader,
            preset.max_distance,
            &mut sim.rng,
        ));
        ids.push(id);
    }
    ids
}

/// Set a group's population fraction. Unknown groups are a tolerated
/// no-op — the group may have been deleted with a command in flight.
pub fn set_population(sim: &mut Simulation, group_name: &str, fraction: f32) {
    let Some(group) = sim.groups.get_mut(group_name) else {
        log::warn!("population change for unknown group '{group_name}' ignored");
        return;
    };
    group.population_fraction = fraction;

    let Ok(preset) = sim.presets.get(&group.preset) else {
        return;
    };
    let total = (fraction * preset.max_population as f32).round() as u32;
    let shares = distribute(total, group.schools.len());

    for (i, &school_id) in group.schools.iter().enumerate() {
        if let Some(school) = sim.schools.iter_mut().find(|s| s.id == school_id) {
            school.requested_population = shares[i];
        }
    }
}

/// Set one view's visibility fraction for a group. Unknown groups no-op.
pub fn set_view_visibility(sim: &mut Simulation, group_name: &str, view: usize, fraction: f32) {
    let Some(group) = sim.groups.get_mut(group_name) else {
        log::warn!("visibility change for unknown group '{group_name}' ignored");
        return;
    };
    if view < MAX_VIEWS {
        group.view_visibility[view] = fraction;
    }
}

/// Delete a group: doom every member agent and retire its schools.
/// Idempotent — deleting twice, or deleting while a spawn is pending,
/// is a no-op.
pub fn delete_group(sim: &mut Simulation, group_name: &str) {
    sim.pending_spawns.retain(|p| p.group != group_name);

    let Some(group) = sim.groups.remove(group_name) else {
        log::debug!("delete of unknown group '{group_name}' ignored");
        return;
    };
    for school_id in &group.schools {
        retire_school(sim, *school_id);
    }
    log::info!("deleted group '{group_name}'");
}

fn retire_school(sim: &mut Simulation, school_id: SchoolId) {
    let Some(school) = sim.schools.iter_mut().find(|s| s.id == school_id) else {
        return;
    };
    school.retiring = true;
    for &slot in &school.agents {
        if let Some(agent) = sim.agents.get_mut(slot) {
            agent.doomed = true;
        }
    }
}

/// Load a new location: retire every school (reaped next tick), install
/// the new obstacle set and seabed, and recreate each dynamic group's
/// schools against the new bounds, preserving population fractions.
pub fn set_location(sim: &mut Simulation, name: &str) -> Result<(), ConfigError> {
    let location = sim.locations.get(name)?.clone();

    let old_ids: Vec<SchoolId> = sim.schools.iter().map(|s| s.id).collect();
    for id in old_ids {
        retire_school(sim, id);
    }

    sim.location_name = Some(name.to_owned());
    sim.obstacles = location.obstacles.clone();
    sim.seabed = location.seabed.clone();

    // Rebuild group schools in deterministic (BTreeMap) order.
    let group_names: Vec<String> = sim.groups.keys().cloned().collect();
    for group_name in group_names {
        let (preset_name, kind, fraction, override_habitats) = {
            let group = &sim.groups[&group_name];
            (
                group.preset.clone(),
                group.kind,
                group.population_fraction,
                group.override_habitats.clone(),
            )
        };
        if kind != GroupKind::Dynamic {
            continue;
        }
        let preset = match sim.presets.get(&preset_name) {
            Ok(p) => p.clone(),
            Err(_) => continue,
        };
        let ids = match resolve_bounds(sim, &preset, &group_name, override_habitats.as_deref()) {
            Ok(bounds) => create_schools(sim, &group_name, &preset, &bounds),
            Err(err) => {
                log::warn!("group '{group_name}' has no home in '{name}': {err}");
                Vec::new()
            }
        };
        if let Some(group) = sim.groups.get_mut(&group_name) {
            group.schools = ids;
        }
        set_population(sim, &group_name, fraction);
    }

    log::info!("location set to '{name}'");
    Ok(())
}

/// Assets for a preset finished loading: release any spawns waiting on it.
/// Deferred spawns whose group was deleted in the meantime were already
/// dropped by `delete_group`.
pub fn notify_assets_ready(sim: &mut Simulation, preset_name: &str) {
    sim.ready_presets.insert(preset_name.to_owned());

    let releasable: Vec<PendingSpawn> = {
        let (ready, still_waiting): (Vec<_>, Vec<_>) = sim
            .pending_spawns
            .drain(..)
            .partition(|p| p.preset == preset_name);
        sim.pending_spawns = still_waiting;
        ready
    };
    for pending in releasable {
        if let Err(err) = spawn_group_now(sim, &pending.preset, &pending.group, pending.habitats) {
            log::warn!("deferred spawn of '{}' failed: {err}", pending.group);
        }
    }
}

/// Walk schools toward their requested populations, a bounded batch per
/// school per tick. Destroys trim from the tail of the member list so
/// surviving agents keep their stable indices.
pub fn converge_populations(sim: &mut Simulation) {
    for si in 0..sim.schools.len() {
        if sim.schools[si].retiring {
            continue;
        }
        let current = sim.schools[si].agents.len();
        let requested = sim.schools[si].requested_population as usize;

        if current < requested {
            let spawn_now = (requested - current).min(POPULATION_BATCH);
            for _ in 0..spawn_now {
                spawn_agent(sim, si);
            }
        } else if current > requested {
            let destroy_now = (current - requested).min(POPULATION_BATCH);
            for &slot in sim.schools[si].agents[current - destroy_now..].iter() {
                if let Some(agent) = sim.agents.get_mut(slot) {
                    agent.doomed = true;
                }
            }
        }
    }
}

fn spawn_agent(sim: &mut Simulation, school_index: usize) {
    let (school_id, bounds, weights) = {
        let school = &sim.schools[school_index];
        (school.id, school.bounds, school.weights)
    };
    let id = sim.agents.next_id();
    let position = random_point_in(&bounds, &mut sim.rng);
    let heading = Vec3::new(
        sim.rng.f32() * 2.0 - 1.0,
        0.0,
        sim.rng.f32() * 2.0 - 1.0,
    );
    let velocity = if heading.length_squared() > f32::EPSILON {
        heading.normalize() * weights.speed * 0.5
    } else {
        Vec3::X * weights.speed * 0.5
    };

    let agent = Agent {
        id,
        school: school_id,
        position,
        prev_position: position,
        velocity,
        mode: AgentMode::Cruising,
        // Stagger initial timers so a school doesn't re-roll in lockstep.
        mode_timer: sim.rng.f32() * weights.state_change_timer_max.max(0.1),
        mode_target: None,
        current_speed: weights.speed,
        current_target_weight: weights.target_weight,
        view_mask: [false; MAX_VIEWS],
        enabled: true,
        doomed: false,
    };
    let slot = sim.agents.insert(agent);
    sim.schools[school_index].agents.push(slot);
}

/// Phase 6: drop doomed agents from their schools and the arena, then
/// drop retired schools. Runs after culling so a doomed agent never
/// renders a stale frame.
pub fn reap(sim: &mut Simulation) {
    // Purge member lists first — slot indices may be reused by next
    // tick's spawns.
    for school in &mut sim.schools {
        school
            .agents
            .retain(|&slot| sim.agents.get(slot).is_some_and(|a| !a.doomed));
    }

    let doomed: Vec<u32> = sim
        .agents
        .iter()
        .filter(|(_, a)| a.doomed)
        .map(|(slot, _)| slot)
        .collect();
    for slot in doomed {
        sim.agents.remove(slot);
    }

    sim.schools.retain(|s| !s.retiring);

    let live: std::collections::HashSet<SchoolId> =
        sim.schools.iter().map(|s| s.id).collect();
    for group in sim.groups.values_mut() {
        group.schools.retain(|id| live.contains(id));
    }
}

/// Split `total` across `buckets` as evenly as possible, remainder to the
/// front.
fn distribute(total: u32, buckets: usize) -> Vec<u32> {
    if buckets == 0 {
        return Vec::new();
    }
    let base = total / buckets as u32;
    let extra = (total % buckets as u32) as usize;
    (0..buckets)
        .map(|i| base + u32::from(i < extra))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribute_spreads_remainder() {
        assert_eq!(distribute(10, 3), vec![4, 3, 3]);
        assert_eq!(distribute(9, 3), vec![3, 3, 3]);
        assert_eq!(distribute(0, 3), vec![0, 0, 0]);
        assert!(distribute(5, 0).is_empty());
    }
}
