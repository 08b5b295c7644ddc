use crate::sim::lifecycle::GroupKind;
use crate::sim::Simulation;
use crate::view::MAX_VIEWS;

/// Derive per-agent visibility for the combined multi-view framebuffer.
///
/// Dynamic groups get a fractional per-view visibility: the first
/// `round(fraction * population)` agents by stable per-school index are
/// shown in that view's screen slice. Static groups reduce to a per-view
/// boolean. Distance culling overrides everything.
pub fn update(sim: &mut Simulation) {
    let views_count = sim.views.views_count();
    let camera = sim.camera_position;

    for group in sim.groups.values_mut() {
        match group.kind {
            GroupKind::Static => {
                for v in 0..MAX_VIEWS {
                    group.static_view_mask[v] = v < views_count && group.view_visibility[v] > 0.0;
                }
            }
            GroupKind::Dynamic => {
                for &school_id in &group.schools {
                    let Some(school) = sim.schools.iter().find(|s| s.id == school_id) else {
                        continue;
                    };
                    if school.retiring {
                        continue;
                    }
                    let population = school.agents.len();
                    let max_dist_sq = school.max_distance * school.max_distance;

                    // Per-view cutoffs by stable index — index, not id, so
                    // the partition can't flicker as ids churn.
                    let mut cutoff = [0usize; MAX_VIEWS];
                    for (v, c) in cutoff.iter_mut().enumerate().take(views_count) {
                        *c = (group.view_visibility[v] * population as f32).round() as usize;
                    }

                    for (index, &slot) in school.agents.iter().enumerate() {
                        let Some(agent) = sim.agents.get_mut(slot) else {
                            continue;
                        };
                        for v in 0..MAX_VIEWS {
                            agent.view_mask[v] = v < views_count && index < cutoff[v];
                        }
                        agent.enabled =
                            agent.position.distance_squared(camera) <= max_dist_sq;
                    }
                }
            }
        }
    }
}
